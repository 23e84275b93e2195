//! Seat availability computed from the booking ledger and live holds.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use seatline_cache::HoldStore;
use seatline_core::error::AppError;
use seatline_core::result::AppResult;
use seatline_core::types::{SeatNumber, SeatSet, TripId, UserId};
use seatline_database::store::{BookingStore, TripStore};
use seatline_entity::hold::TemporaryHold;
use seatline_entity::trip::Trip;

use crate::seat_map::SeatMapResolver;

/// Seat partition of a trip at one instant.
///
/// `available`, `occupied`, and `held` are disjoint and together cover
/// `1..=total`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    /// The trip.
    pub trip_id: TripId,
    /// Vehicle capacity.
    pub total: u32,
    /// Seats free to hold or book.
    pub available: Vec<SeatNumber>,
    /// Seats claimed by PENDING or CONFIRMED bookings.
    pub occupied: Vec<SeatNumber>,
    /// Seats in live holds that are not also occupied.
    pub held: Vec<SeatNumber>,
}

/// Raw inputs to the partition, kept together so callers can ask follow-up
/// questions without re-reading the stores.
#[derive(Debug, Clone)]
pub(crate) struct SeatSnapshot {
    pub range: SeatSet,
    pub occupied: SeatSet,
    pub holds: Vec<TemporaryHold>,
}

impl SeatSnapshot {
    /// Seats in live holds, minus occupied seats.
    pub fn held(&self) -> SeatSet {
        self.held_where(|_| true)
    }

    /// Seats in live holds not owned by `user_id`, minus occupied seats.
    pub fn held_by_others(&self, user_id: UserId) -> SeatSet {
        self.held_where(|h| h.user_id != user_id)
    }

    fn held_where(&self, keep: impl Fn(&TemporaryHold) -> bool) -> SeatSet {
        let mut held = SeatSet::empty(self.range.capacity());
        for hold in self.holds.iter().filter(|h| keep(h)) {
            held.union_with(&SeatSet::from_trusted(
                self.range.capacity(),
                hold.seats.iter().copied(),
            ));
        }
        held.difference(&self.occupied)
    }

    fn into_availability(self, trip_id: TripId) -> Availability {
        let held = self.held();
        let available = self.range.difference(&self.occupied).difference(&held);
        Availability {
            trip_id,
            total: self.range.capacity(),
            available: available.to_vec(),
            occupied: self.occupied.to_vec(),
            held: held.to_vec(),
        }
    }
}

/// Computes availability fresh on every call; nothing is materialized.
#[derive(Debug, Clone)]
pub struct AvailabilityService {
    /// Trip reads.
    trips: Arc<dyn TripStore>,
    /// Booking ledger.
    bookings: Arc<dyn BookingStore>,
    /// Temporary holds.
    holds: Arc<dyn HoldStore>,
    /// Seat range resolution.
    seat_map: SeatMapResolver,
}

impl AvailabilityService {
    /// Creates a new availability service.
    pub fn new(
        trips: Arc<dyn TripStore>,
        bookings: Arc<dyn BookingStore>,
        holds: Arc<dyn HoldStore>,
    ) -> Self {
        Self {
            trips,
            bookings,
            holds,
            seat_map: SeatMapResolver,
        }
    }

    /// Partition the trip's seats into available, occupied, and held.
    pub async fn get_availability(&self, trip_id: TripId) -> AppResult<Availability> {
        let trip = self.load_trip(trip_id).await?;
        let snapshot = self.snapshot(&trip, Utc::now()).await?;
        Ok(snapshot.into_availability(trip_id))
    }

    /// Seats held by users other than `user_id`, ascending.
    pub async fn held_by_others(
        &self,
        trip_id: TripId,
        user_id: UserId,
    ) -> AppResult<Vec<SeatNumber>> {
        let trip = self.load_trip(trip_id).await?;
        let snapshot = self.snapshot(&trip, Utc::now()).await?;
        Ok(snapshot.held_by_others(user_id).to_vec())
    }

    pub(crate) async fn load_trip(&self, trip_id: TripId) -> AppResult<Trip> {
        self.trips
            .find_trip(trip_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Trip {trip_id} not found")))
    }

    pub(crate) async fn snapshot(
        &self,
        trip: &Trip,
        now: DateTime<Utc>,
    ) -> AppResult<SeatSnapshot> {
        let range = self.seat_map.resolve(trip);
        let occupied = SeatSet::from_trusted(
            range.capacity(),
            self.bookings.occupied_seats(trip.id).await?,
        );
        let holds = self.holds.active_holds(trip.id, now).await?;
        Ok(SeatSnapshot {
            range,
            occupied,
            holds,
        })
    }
}
