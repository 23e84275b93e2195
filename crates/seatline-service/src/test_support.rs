//! Shared fixtures for service tests: in-process stores and recording
//! collaborators.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use seatline_cache::CacheManager;
use seatline_cache::memory::{MemoryCacheProvider, MemoryHoldStore};
use seatline_core::config::{AppConfig, MemoryCacheConfig};
use seatline_core::result::AppResult;
use seatline_core::types::{BookingId, SeatNumber, TripId, UserId};
use seatline_database::MemoryLedger;
use seatline_database::store::BookingStore;
use seatline_entity::booking::{Booking, NewBooking};
use seatline_entity::event::DomainEvent;
use seatline_entity::hold::TemporaryHold;
use seatline_entity::trip::{Trip, TripStatus};

use crate::booking::ReferenceGenerator;
use crate::collaborator::{Collaborators, EventPublisher, LoggingNotificationSink, PaymentGateway};
use crate::{
    AvailabilityService, BookingService, CancellationService, HoldService, Services, Stores,
    TrackingService, TripService,
};

/// A SCHEDULED trip departing in five hours.
pub fn trip(capacity: i32) -> Trip {
    let departure = Utc::now() + chrono::Duration::hours(5);
    Trip {
        id: TripId::new(),
        route_name: "North Terminal - Pier 4".to_string(),
        vehicle_capacity: capacity,
        departure_time: departure,
        arrival_time: departure + chrono::Duration::minutes(90),
        status: TripStatus::Scheduled,
        fare_cents: 2500,
        destination_latitude: 14.5995,
        destination_longitude: 120.9842,
        driver_id: None,
        booked_seats: 0,
    }
}

#[derive(Debug, Default)]
pub struct RecordingPayments {
    intents: Mutex<Vec<BookingId>>,
    refunds: Mutex<Vec<BookingId>>,
}

impl RecordingPayments {
    pub fn intents(&self) -> Vec<BookingId> {
        self.intents.lock().unwrap().clone()
    }

    pub fn refunds(&self) -> Vec<BookingId> {
        self.refunds.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for RecordingPayments {
    async fn create_payment_intent(&self, booking: &Booking) -> AppResult<()> {
        self.intents.lock().unwrap().push(booking.id);
        Ok(())
    }

    async fn request_refund(&self, booking: &Booking, _reason: Option<&str>) -> AppResult<()> {
        self.refunds.lock().unwrap().push(booking.id);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingPublisher {
    pub fn take(&self) -> Vec<DomainEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: DomainEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub struct Harness {
    pub ledger: Arc<MemoryLedger>,
    pub hold_store: Arc<MemoryHoldStore>,
    pub cache: CacheManager,
    pub payments: Arc<RecordingPayments>,
    pub events: Arc<RecordingPublisher>,
    pub availability: Arc<AvailabilityService>,
    pub holds: Arc<HoldService>,
    pub bookings: Arc<BookingService>,
    pub cancellation: Arc<CancellationService>,
    pub trips: Arc<TripService>,
    pub tracking: Arc<TrackingService>,
}

impl Harness {
    pub fn new() -> Self {
        let ledger = Arc::new(MemoryLedger::new());
        let hold_store = Arc::new(MemoryHoldStore::new());
        let cache = CacheManager::from_parts(
            Arc::new(MemoryCacheProvider::new(&MemoryCacheConfig { max_capacity: 1000 })),
            hold_store.clone(),
        );
        let payments = Arc::new(RecordingPayments::default());
        let events = Arc::new(RecordingPublisher::default());
        let collaborators = Collaborators {
            payments: payments.clone(),
            notifications: Arc::new(LoggingNotificationSink),
            events: events.clone(),
        };

        let services = Services::build(
            Stores::shared(ledger.clone()),
            cache.clone(),
            collaborators,
            &AppConfig::default(),
        );

        Self {
            ledger,
            hold_store,
            cache,
            payments,
            events,
            availability: services.availability,
            holds: services.holds,
            bookings: services.bookings,
            cancellation: services.cancellation,
            trips: services.trips,
            tracking: services.tracking,
        }
    }

    pub fn add_trip(&self, capacity: i32) -> Trip {
        let trip = trip(capacity);
        self.ledger.upsert_trip(trip.clone());
        trip
    }

    pub fn seed_hold(&self, hold: TemporaryHold) {
        self.hold_store.insert_unchecked(hold);
    }

    pub async fn seed_booking(&self, trip_id: TripId, seats: &[SeatNumber]) -> Booking {
        self.ledger
            .commit_booking(NewBooking {
                id: BookingId::new(),
                trip_id,
                user_id: UserId::new(),
                seat_numbers: seats.to_vec(),
                total_amount_cents: 0,
                reference: ReferenceGenerator::new().generate(),
            })
            .await
            .unwrap()
    }

    /// Let fire-and-forget collaborator calls run.
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
