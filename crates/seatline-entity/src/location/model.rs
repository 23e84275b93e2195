//! Trip location entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use seatline_core::types::TripId;

/// A stored GPS fix. The newest row per trip is the current location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TripLocation {
    /// Row identifier (monotonic per store).
    pub id: i64,
    /// The tracked trip.
    pub trip_id: TripId,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Ground speed in km/h.
    pub speed: Option<f64>,
    /// Heading in degrees from north.
    pub heading: Option<f64>,
    /// When the fix was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// A validated fix waiting to be appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTripLocation {
    /// The tracked trip.
    pub trip_id: TripId,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Ground speed in km/h.
    pub speed: Option<f64>,
    /// Heading in degrees from north.
    pub heading: Option<f64>,
    /// When the fix was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl NewTripLocation {
    /// Attach the row id assigned by the store.
    pub fn with_id(self, id: i64) -> TripLocation {
        TripLocation {
            id,
            trip_id: self.trip_id,
            latitude: self.latitude,
            longitude: self.longitude,
            speed: self.speed,
            heading: self.heading,
            recorded_at: self.recorded_at,
        }
    }
}
