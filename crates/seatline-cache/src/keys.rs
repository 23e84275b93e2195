//! Cache key builders.
//!
//! Keys are returned without the configured prefix; the Redis client adds it.

use seatline_core::types::TripId;

/// Hash of live holds for a trip, keyed by hold id.
pub fn trip_holds(trip_id: TripId) -> String {
    format!("holds:{trip_id}")
}

/// Set of trip ids that currently have hold hashes.
pub fn hold_trip_index() -> String {
    "holds:trips".to_string()
}

/// Latest accepted location fix for a trip.
pub fn trip_location(trip_id: TripId) -> String {
    format!("location:{trip_id}")
}
