//! Trip entity model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use seatline_core::types::{DriverId, SeatSet, TripId};

use super::status::TripStatus;

/// A scheduled trip, as seen by the reservation subsystem.
///
/// Joined from the trip, route, vehicle, and destination terminal tables.
/// Only `status` and `booked_seats` are written here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trip {
    /// Unique trip identifier.
    pub id: TripId,
    /// Display name of the route.
    pub route_name: String,
    /// Seats on the assigned vehicle.
    pub vehicle_capacity: i32,
    /// Scheduled departure.
    pub departure_time: DateTime<Utc>,
    /// Scheduled arrival.
    pub arrival_time: DateTime<Utc>,
    /// Current lifecycle status.
    pub status: TripStatus,
    /// Per-seat fare in minor currency units.
    pub fare_cents: i64,
    /// Destination terminal latitude.
    pub destination_latitude: f64,
    /// Destination terminal longitude.
    pub destination_longitude: f64,
    /// Driver assigned to the trip, if any.
    pub driver_id: Option<DriverId>,
    /// Seats held by PENDING or CONFIRMED bookings.
    pub booked_seats: i32,
}

impl Trip {
    /// Vehicle capacity as a seat-range bound.
    pub fn capacity(&self) -> u32 {
        self.vehicle_capacity.max(0) as u32
    }

    /// The full seat range of the vehicle.
    pub fn seat_range(&self) -> SeatSet {
        SeatSet::full(self.capacity())
    }

    /// The instant after which cancellation is no longer permitted.
    pub fn cancellation_deadline(&self, window: Duration) -> DateTime<Utc> {
        self.departure_time - window
    }
}
