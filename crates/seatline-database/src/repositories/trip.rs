//! Trip repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use seatline_core::error::{AppError, ErrorKind};
use seatline_core::result::AppResult;
use seatline_core::types::TripId;
use seatline_entity::trip::{Trip, TripStatus};

use crate::store::TripStore;

/// Columns of [`Trip`], joined from the fleet reference tables.
const TRIP_SELECT: &str = "SELECT t.id, r.name AS route_name, v.capacity AS vehicle_capacity, \
     t.departure_time, t.arrival_time, t.status, r.fare_cents, \
     d.latitude AS destination_latitude, d.longitude AS destination_longitude, \
     t.driver_id, t.booked_seats \
     FROM trips t \
     JOIN routes r ON r.id = t.route_id \
     JOIN vehicles v ON v.id = t.vehicle_id \
     JOIN terminals d ON d.id = r.destination_terminal_id";

/// Repository for trip reads and status updates.
#[derive(Debug, Clone)]
pub struct TripRepository {
    pool: PgPool,
}

impl TripRepository {
    /// Create a new trip repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TripStore for TripRepository {
    async fn find_trip(&self, trip_id: TripId) -> AppResult<Option<Trip>> {
        sqlx::query_as::<_, Trip>(&format!("{TRIP_SELECT} WHERE t.id = $1"))
            .bind(trip_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find trip", e))
    }

    async fn compare_and_set_status(
        &self,
        trip_id: TripId,
        expected: TripStatus,
        next: TripStatus,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE trips SET status = $3, updated_at = NOW() WHERE id = $1 AND status = $2",
        )
        .bind(trip_id)
        .bind(expected)
        .bind(next)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update trip status", e)
        })?;
        Ok(result.rows_affected() == 1)
    }
}
