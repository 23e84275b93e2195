//! # seatline-service
//!
//! Business logic for seat holds, bookings, cancellation, trip status, and
//! location tracking. Services orchestrate the ledger stores, the hold
//! store, and the latest-location cache.
//!
//! Services follow constructor injection: every dependency is provided at
//! construction time as an `Arc`. [`Services::build`] wires the full set.

pub mod availability;
pub mod booking;
pub mod cancellation;
pub mod collaborator;
pub mod hold;
pub mod seat_map;
pub mod tracking;
pub mod trip;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use seatline_cache::CacheManager;
use seatline_core::config::AppConfig;
use seatline_database::store::{BookingStore, LocationStore, TripStore};

pub use availability::{Availability, AvailabilityService};
pub use booking::{BookingService, FlatFare, PricingStrategy, ReferenceGenerator};
pub use cancellation::CancellationService;
pub use collaborator::{
    Collaborators, EventPublisher, Notification, NotificationKind, NotificationSink,
    PaymentGateway,
};
pub use hold::{HoldReceipt, HoldService};
pub use seat_map::SeatMapResolver;
pub use tracking::{LocationUpdate, TrackingService};
pub use trip::TripService;

/// The ledger stores a deployment runs on.
#[derive(Debug, Clone)]
pub struct Stores {
    /// Trip reads and status writes.
    pub trips: Arc<dyn TripStore>,
    /// Booking ledger.
    pub bookings: Arc<dyn BookingStore>,
    /// Location history.
    pub locations: Arc<dyn LocationStore>,
}

impl Stores {
    /// Use one value for every store.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: TripStore + BookingStore + LocationStore,
    {
        Self {
            trips: store.clone(),
            bookings: store.clone(),
            locations: store,
        }
    }
}

/// Every service, wired together.
#[derive(Debug, Clone)]
pub struct Services {
    /// Availability engine.
    pub availability: Arc<AvailabilityService>,
    /// Temporary holds.
    pub holds: Arc<HoldService>,
    /// Booking transactions and payment results.
    pub bookings: Arc<BookingService>,
    /// Cancellation policy.
    pub cancellation: Arc<CancellationService>,
    /// Trip lifecycle.
    pub trips: Arc<TripService>,
    /// Location ingest.
    pub tracking: Arc<TrackingService>,
}

impl Services {
    /// Build the service graph.
    pub fn build(
        stores: Stores,
        cache: CacheManager,
        collaborators: Collaborators,
        config: &AppConfig,
    ) -> Self {
        let availability = Arc::new(AvailabilityService::new(
            stores.trips.clone(),
            stores.bookings.clone(),
            cache.holds(),
        ));
        let holds = Arc::new(HoldService::new(
            cache.holds(),
            availability.clone(),
            config.booking.clone(),
        ));
        let bookings = Arc::new(BookingService::new(
            stores.bookings.clone(),
            availability.clone(),
            holds.clone(),
            Arc::new(FlatFare),
            collaborators.clone(),
            config.booking.clone(),
        ));
        let cancellation = Arc::new(CancellationService::new(
            stores.trips.clone(),
            stores.bookings.clone(),
            collaborators.clone(),
            config.booking.clone(),
        ));
        let trips = Arc::new(TripService::new(
            stores.trips.clone(),
            stores.bookings.clone(),
            collaborators.clone(),
        ));
        let tracking = Arc::new(TrackingService::new(
            stores.trips,
            stores.locations,
            cache,
            trips.clone(),
            collaborators,
            config.tracking.clone(),
        ));

        Self {
            availability,
            holds,
            bookings,
            cancellation,
            trips,
            tracking,
        }
    }
}
