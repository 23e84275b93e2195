//! Location history repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use seatline_core::error::{AppError, ErrorKind};
use seatline_core::result::AppResult;
use seatline_core::types::TripId;
use seatline_entity::location::{NewTripLocation, TripLocation};

use crate::store::LocationStore;

/// Repository for the append-only `trip_locations` table.
#[derive(Debug, Clone)]
pub struct LocationRepository {
    pool: PgPool,
}

impl LocationRepository {
    /// Create a new location repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LocationStore for LocationRepository {
    async fn append_location(&self, fix: NewTripLocation) -> AppResult<TripLocation> {
        sqlx::query_as::<_, TripLocation>(
            "INSERT INTO trip_locations (trip_id, latitude, longitude, speed, heading, recorded_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(fix.trip_id)
        .bind(fix.latitude)
        .bind(fix.longitude)
        .bind(fix.speed)
        .bind(fix.heading)
        .bind(fix.recorded_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to append location", e))
    }

    async fn latest_location(&self, trip_id: TripId) -> AppResult<Option<TripLocation>> {
        sqlx::query_as::<_, TripLocation>(
            "SELECT * FROM trip_locations WHERE trip_id = $1 \
             ORDER BY recorded_at DESC, id DESC LIMIT 1",
        )
        .bind(trip_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load location", e))
    }

    async fn location_history(&self, trip_id: TripId, limit: u32) -> AppResult<Vec<TripLocation>> {
        sqlx::query_as::<_, TripLocation>(
            "SELECT * FROM trip_locations WHERE trip_id = $1 \
             ORDER BY recorded_at DESC, id DESC LIMIT $2",
        )
        .bind(trip_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load location history", e)
        })
    }

    async fn prune_locations_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM trip_locations WHERE recorded_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to prune locations", e)
            })?;
        Ok(result.rows_affected())
    }
}
