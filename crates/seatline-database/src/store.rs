//! Storage traits for trips, bookings, and location history.
//!
//! Every write that touches seat occupancy is atomic within one store call:
//! either the booking row, its seat claims, and the trip's seat counter all
//! change, or none of them do.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use seatline_core::result::AppResult;
use seatline_core::types::{BookingId, SeatNumber, TripId, UserId};
use seatline_entity::booking::{Booking, BookingStatus, NewBooking, PaymentStatus};
use seatline_entity::location::{NewTripLocation, TripLocation};
use seatline_entity::trip::{Trip, TripStatus};

/// Read access to trips plus the status column.
#[async_trait]
pub trait TripStore: Send + Sync + std::fmt::Debug + 'static {
    /// Load a trip with its route, vehicle, and destination data.
    async fn find_trip(&self, trip_id: TripId) -> AppResult<Option<Trip>>;

    /// Set `next` only if the current status is `expected`.
    ///
    /// Returns `false` when another writer changed the status first.
    async fn compare_and_set_status(
        &self,
        trip_id: TripId,
        expected: TripStatus,
        next: TripStatus,
    ) -> AppResult<bool>;
}

/// A conditional booking status change.
#[derive(Debug, Clone)]
pub struct BookingTransition {
    /// The booking to change.
    pub booking_id: BookingId,
    /// The change applies only while the booking is in one of these states.
    pub from: Vec<BookingStatus>,
    /// New ledger status.
    pub to: BookingStatus,
    /// New payment status, if it changes.
    pub payment_status: Option<PaymentStatus>,
    /// Reason recorded when `to` is CANCELLED.
    pub reason: Option<String>,
    /// Timestamp of the change.
    pub at: DateTime<Utc>,
}

impl BookingTransition {
    /// Cancel a booking that still occupies its seats.
    pub fn cancel(booking_id: BookingId, reason: Option<String>, at: DateTime<Utc>) -> Self {
        Self {
            booking_id,
            from: vec![BookingStatus::Pending, BookingStatus::Confirmed],
            to: BookingStatus::Cancelled,
            payment_status: None,
            reason,
            at,
        }
    }

    /// Whether applying the transition frees the booking's seats.
    pub fn releases_seats(&self) -> bool {
        self.from.iter().any(|s| s.occupies_seats()) && self.to == BookingStatus::Cancelled
    }
}

/// The booking ledger.
#[async_trait]
pub trait BookingStore: Send + Sync + std::fmt::Debug + 'static {
    /// Seats held by PENDING or CONFIRMED bookings on the trip, ascending.
    async fn occupied_seats(&self, trip_id: TripId) -> AppResult<Vec<SeatNumber>>;

    /// Whether any booking already uses `reference`.
    async fn reference_exists(&self, reference: &str) -> AppResult<bool>;

    /// Persist a PENDING booking and claim its seats atomically.
    ///
    /// Occupancy is re-checked inside the write. Fails with `NotFound` or
    /// `NotBookable` for the trip, `SeatNotAvailable` when a seat is already
    /// occupied, and `Conflict` when the reference is taken.
    async fn commit_booking(&self, booking: NewBooking) -> AppResult<Booking>;

    /// Load a booking.
    async fn find_booking(&self, booking_id: BookingId) -> AppResult<Option<Booking>>;

    /// A user's bookings, newest first.
    async fn find_by_user(&self, user_id: UserId) -> AppResult<Vec<Booking>>;

    /// Apply a conditional status change, releasing seats when it cancels.
    ///
    /// Returns `None` when the booking is missing or not in an allowed
    /// source state.
    async fn transition(&self, transition: BookingTransition) -> AppResult<Option<Booking>>;

    /// Update only the payment status.
    async fn set_payment_status(
        &self,
        booking_id: BookingId,
        payment_status: PaymentStatus,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Booking>>;

    /// PENDING bookings with PENDING payment created before `cutoff`.
    async fn find_stale_pending(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Booking>>;

    /// Mark the trip's CONFIRMED bookings COMPLETED. Returns the count.
    async fn complete_for_trip(&self, trip_id: TripId, at: DateTime<Utc>) -> AppResult<u64>;
}

/// Append-only location history.
#[async_trait]
pub trait LocationStore: Send + Sync + std::fmt::Debug + 'static {
    /// Append a fix and return the stored row.
    async fn append_location(&self, fix: NewTripLocation) -> AppResult<TripLocation>;

    /// The newest fix for the trip.
    async fn latest_location(&self, trip_id: TripId) -> AppResult<Option<TripLocation>>;

    /// Up to `limit` fixes, most recent first.
    async fn location_history(&self, trip_id: TripId, limit: u32) -> AppResult<Vec<TripLocation>>;

    /// Delete fixes recorded before `cutoff`. Returns the count.
    async fn prune_locations_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}
