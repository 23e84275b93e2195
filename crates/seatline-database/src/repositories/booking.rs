//! Booking ledger repository implementation.
//!
//! Commits lock the trip row (`SELECT ... FOR UPDATE`) so concurrent commits
//! for the same trip serialize, then re-check seat occupancy inside the same
//! transaction. The partial unique index on `booking_seats` rejects anything
//! that slips past the check.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use seatline_core::error::{AppError, ErrorKind};
use seatline_core::result::AppResult;
use seatline_core::types::{BookingId, SeatNumber, TripId, UserId};
use seatline_entity::booking::{Booking, BookingStatus, NewBooking, PaymentStatus};
use seatline_entity::trip::TripStatus;

use crate::store::{BookingStore, BookingTransition};

/// Upper bound on rows returned by the stale-pending scan.
const STALE_SCAN_LIMIT: i64 = 500;

/// Repository for `bookings` and `booking_seats`.
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    /// Create a new booking repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Unique constraint on `bookings.reference`.
const REFERENCE_CONSTRAINT: &str = "bookings_reference_key";
/// Partial unique index over live seat claims.
const ACTIVE_SEAT_CONSTRAINT: &str = "booking_seats_active_uniq";

/// Map constraint violations raised while writing a booking.
fn map_write_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            if let Some(mapped) = unique_violation(db_err.constraint()) {
                return mapped;
            }
            return AppError::with_source(
                ErrorKind::Internal,
                "Unexpected unique violation while writing booking",
                err,
            );
        }
    }
    AppError::with_source(ErrorKind::Database, "Failed to write booking", err)
}

/// The domain error for a unique violation on `constraint`, if it has one.
fn unique_violation(constraint: Option<&str>) -> Option<AppError> {
    match constraint {
        Some(REFERENCE_CONSTRAINT) => {
            Some(AppError::conflict("Booking reference is already in use"))
        }
        Some(ACTIVE_SEAT_CONSTRAINT) => Some(AppError::seat_not_available(
            "A requested seat was booked concurrently",
        )),
        _ => None,
    }
}

#[async_trait]
impl BookingStore for BookingRepository {
    async fn occupied_seats(&self, trip_id: TripId) -> AppResult<Vec<SeatNumber>> {
        sqlx::query_scalar::<_, SeatNumber>(
            "SELECT bs.seat_number FROM booking_seats bs \
             JOIN bookings b ON b.id = bs.booking_id \
             WHERE bs.trip_id = $1 AND bs.active \
               AND b.status IN ('PENDING', 'CONFIRMED') \
             ORDER BY bs.seat_number",
        )
        .bind(trip_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load occupied seats", e))
    }

    async fn reference_exists(&self, reference: &str) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM bookings WHERE reference = $1)")
            .bind(reference)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to check booking reference", e)
            })
    }

    async fn commit_booking(&self, booking: NewBooking) -> AppResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let status = sqlx::query_scalar::<_, TripStatus>(
            "SELECT status FROM trips WHERE id = $1 FOR UPDATE",
        )
        .bind(booking.trip_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock trip", e))?
        .ok_or_else(|| AppError::not_found(format!("Trip {} not found", booking.trip_id)))?;

        if !status.is_bookable() {
            return Err(AppError::not_bookable(format!(
                "Trip {} is {status}",
                booking.trip_id
            )));
        }

        let taken = sqlx::query_scalar::<_, SeatNumber>(
            "SELECT seat_number FROM booking_seats \
             WHERE trip_id = $1 AND active AND seat_number = ANY($2) \
             ORDER BY seat_number",
        )
        .bind(booking.trip_id)
        .bind(&booking.seat_numbers)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to re-check seats", e))?;

        if !taken.is_empty() {
            debug!(trip_id = %booking.trip_id, ?taken, "Seats taken at commit");
            return Err(AppError::seat_not_available(format!(
                "Seats {taken:?} are no longer available"
            )));
        }

        let seat_count = booking.seat_numbers.len() as i32;

        let stored = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, trip_id, user_id, seat_numbers, total_amount_cents, reference) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(booking.id)
        .bind(booking.trip_id)
        .bind(booking.user_id)
        .bind(&booking.seat_numbers)
        .bind(booking.total_amount_cents)
        .bind(&booking.reference)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        sqlx::query(
            "INSERT INTO booking_seats (booking_id, trip_id, seat_number) \
             SELECT $1, $2, UNNEST($3::int4[])",
        )
        .bind(booking.id)
        .bind(booking.trip_id)
        .bind(&booking.seat_numbers)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        sqlx::query(
            "UPDATE trips SET booked_seats = booked_seats + $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(booking.trip_id)
        .bind(seat_count)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update seat count", e)
        })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit booking", e)
        })?;

        Ok(stored)
    }

    async fn find_booking(&self, booking_id: BookingId) -> AppResult<Option<Booking>> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find booking", e))
    }

    async fn find_by_user(&self, user_id: UserId) -> AppResult<Vec<Booking>> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list bookings", e))
    }

    async fn transition(&self, transition: BookingTransition) -> AppResult<Option<Booking>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let cancelled_at = (transition.to == BookingStatus::Cancelled).then_some(transition.at);

        let updated = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = $2, \
                 payment_status = COALESCE($3, payment_status), \
                 cancellation_reason = COALESCE($4, cancellation_reason), \
                 cancelled_at = COALESCE($5, cancelled_at), \
                 updated_at = $6 \
             WHERE id = $1 AND status = ANY($7) RETURNING *",
        )
        .bind(transition.booking_id)
        .bind(transition.to)
        .bind(transition.payment_status)
        .bind(&transition.reason)
        .bind(cancelled_at)
        .bind(transition.at)
        .bind(&transition.from)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update booking", e))?;

        let Some(booking) = updated else {
            return Ok(None);
        };

        if transition.releases_seats() {
            let released = sqlx::query(
                "UPDATE booking_seats SET active = FALSE WHERE booking_id = $1 AND active",
            )
            .bind(booking.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to release seats", e))?
            .rows_affected();

            sqlx::query(
                "UPDATE trips SET booked_seats = GREATEST(booked_seats - $2, 0), updated_at = NOW() \
                 WHERE id = $1",
            )
            .bind(booking.trip_id)
            .bind(released as i32)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update seat count", e)
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit booking update", e)
        })?;

        Ok(Some(booking))
    }

    async fn set_payment_status(
        &self,
        booking_id: BookingId,
        payment_status: PaymentStatus,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Booking>> {
        sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET payment_status = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(booking_id)
        .bind(payment_status)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update payment status", e)
        })
    }

    async fn find_stale_pending(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Booking>> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings \
             WHERE status = 'PENDING' AND payment_status = 'PENDING' AND created_at < $1 \
             ORDER BY created_at LIMIT $2",
        )
        .bind(cutoff)
        .bind(STALE_SCAN_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to scan pending bookings", e)
        })
    }

    async fn complete_for_trip(&self, trip_id: TripId, at: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE bookings SET status = 'COMPLETED', updated_at = $2 \
             WHERE trip_id = $1 AND status = 'CONFIRMED'",
        )
        .bind(trip_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to complete bookings", e))?;
        Ok(result.rows_affected())
    }
}
