//! Booking entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use seatline_core::types::{BookingId, SeatNumber, TripId, UserId};

use super::status::{BookingStatus, PaymentStatus};

/// A booking in the ledger.
///
/// The seat set is sorted, deduplicated, and never changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    /// Unique booking identifier.
    pub id: BookingId,
    /// The booked trip.
    pub trip_id: TripId,
    /// The booking owner.
    pub user_id: UserId,
    /// Booked seat numbers, ascending.
    pub seat_numbers: Vec<SeatNumber>,
    /// Total price in minor currency units.
    pub total_amount_cents: i64,
    /// Ledger status.
    pub status: BookingStatus,
    /// Payment status.
    pub payment_status: PaymentStatus,
    /// Human-facing reference code (8 characters).
    pub reference: String,
    /// Reason supplied on cancellation.
    pub cancellation_reason: Option<String>,
    /// When the booking was created.
    pub created_at: DateTime<Utc>,
    /// When the booking was last updated.
    pub updated_at: DateTime<Utc>,
    /// When the booking was cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Whether the booking belongs to `user_id`.
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.user_id == *user_id
    }

    /// Number of seats booked.
    pub fn seat_count(&self) -> usize {
        self.seat_numbers.len()
    }
}

/// Data required to commit a new booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    /// Pre-generated identifier.
    pub id: BookingId,
    /// The trip to book.
    pub trip_id: TripId,
    /// The booking owner.
    pub user_id: UserId,
    /// Seats to claim, ascending and unique.
    pub seat_numbers: Vec<SeatNumber>,
    /// Total price in minor currency units.
    pub total_amount_cents: i64,
    /// Candidate reference code.
    pub reference: String,
}

impl NewBooking {
    /// Materialize the row as it will be stored (PENDING/PENDING).
    pub fn into_booking(self, now: DateTime<Utc>) -> Booking {
        Booking {
            id: self.id,
            trip_id: self.trip_id,
            user_id: self.user_id,
            seat_numbers: self.seat_numbers,
            total_amount_cents: self.total_amount_cents,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            reference: self.reference,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
            cancelled_at: None,
        }
    }
}
