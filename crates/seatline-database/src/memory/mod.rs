//! In-process ledger.
//!
//! Implements every store trait on top of `DashMap`s. Writes that touch seat
//! occupancy take a per-trip `tokio::sync::Mutex`, which gives the same
//! serialization the PostgreSQL repositories get from `SELECT ... FOR UPDATE`.
//! Nothing survives a restart.

mod booking;
mod location;

use std::sync::Arc;
use std::sync::atomic::AtomicI64;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;

use seatline_core::result::AppResult;
use seatline_core::types::{BookingId, TripId};
use seatline_entity::booking::Booking;
use seatline_entity::location::TripLocation;
use seatline_entity::trip::{Trip, TripStatus};

use crate::store::TripStore;

/// Single-process implementation of the trip, booking, and location stores.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    trips: DashMap<TripId, Trip>,
    bookings: DashMap<BookingId, Booking>,
    references: DashMap<String, BookingId>,
    trip_locks: DashMap<TripId, Arc<Mutex<()>>>,
    locations: DashMap<TripId, Vec<TripLocation>>,
    next_location_id: AtomicI64,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a trip (reference data is owned elsewhere).
    pub fn upsert_trip(&self, trip: Trip) {
        self.trips.insert(trip.id, trip);
    }

    /// Number of bookings stored, in any status.
    pub fn booking_count(&self) -> usize {
        self.bookings.len()
    }

    /// The mutex serializing occupancy writes for one trip.
    fn trip_lock(&self, trip_id: TripId) -> Arc<Mutex<()>> {
        self.trip_locks.entry(trip_id).or_default().clone()
    }

    /// Drop a finished trip's mutex once no writer holds or awaits it.
    fn release_trip_lock(&self, trip_id: TripId) {
        let finished = self
            .trips
            .get(&trip_id)
            .is_some_and(|t| matches!(t.status, TripStatus::Completed | TripStatus::Cancelled));
        if finished {
            self.trip_locks
                .remove_if(&trip_id, |_, lock| Arc::strong_count(lock) == 1);
        }
    }

    /// Number of per-trip mutexes currently allocated.
    pub fn trip_lock_count(&self) -> usize {
        self.trip_locks.len()
    }
}

#[async_trait]
impl TripStore for MemoryLedger {
    async fn find_trip(&self, trip_id: TripId) -> AppResult<Option<Trip>> {
        Ok(self.trips.get(&trip_id).map(|t| t.clone()))
    }

    async fn compare_and_set_status(
        &self,
        trip_id: TripId,
        expected: TripStatus,
        next: TripStatus,
    ) -> AppResult<bool> {
        let Some(mut trip) = self.trips.get_mut(&trip_id) else {
            return Ok(false);
        };
        if trip.status != expected {
            return Ok(false);
        }
        trip.status = next;
        drop(trip);
        self.release_trip_lock(trip_id);
        Ok(true)
    }
}


#[cfg(test)]
mod tests {
    use chrono::Utc;

    use seatline_core::types::UserId;
    use seatline_entity::booking::NewBooking;

    use super::*;
    use crate::store::{BookingStore, BookingTransition};

    #[tokio::test]
    async fn test_status_compare_and_set() {
        let ledger = MemoryLedger::new();
        let trip = fixtures::trip(10);
        let id = trip.id;
        ledger.upsert_trip(trip);

        assert!(
            ledger
                .compare_and_set_status(id, TripStatus::Scheduled, TripStatus::Boarding)
                .await
                .unwrap()
        );
        assert!(
            !ledger
                .compare_and_set_status(id, TripStatus::Scheduled, TripStatus::Boarding)
                .await
                .unwrap()
        );
        let stored = ledger.find_trip(id).await.unwrap().unwrap();
        assert_eq!(stored.status, TripStatus::Boarding);
    }

    #[tokio::test]
    async fn test_trip_lock_released_when_trip_finishes() {
        let ledger = MemoryLedger::new();
        let trip = fixtures::trip(10);
        let id = trip.id;
        ledger.upsert_trip(trip);

        let booking = ledger
            .commit_booking(NewBooking {
                id: BookingId::new(),
                trip_id: id,
                user_id: UserId::new(),
                seat_numbers: vec![1],
                total_amount_cents: 1500,
                reference: "KKKKKKKK".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(ledger.trip_lock_count(), 1);

        assert!(
            ledger
                .compare_and_set_status(id, TripStatus::Scheduled, TripStatus::Cancelled)
                .await
                .unwrap()
        );
        assert_eq!(ledger.trip_lock_count(), 0);

        ledger
            .transition(BookingTransition::cancel(booking.id, None, Utc::now()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ledger.trip_lock_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_trip_is_none() {
        let ledger = MemoryLedger::new();
        assert!(ledger.find_trip(TripId::new()).await.unwrap().is_none());
    }
}
