//! Temporary hold record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use seatline_core::types::{HoldId, SeatNumber, TripId, UserId};

/// A short-lived claim on seats, used as a UX courtesy before booking.
///
/// Expiry is evaluated lazily: a hold past `expires_at` is treated as absent
/// even if the store has not removed it yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporaryHold {
    /// Unique hold identifier.
    pub id: HoldId,
    /// The trip the seats belong to.
    pub trip_id: TripId,
    /// The holder.
    pub user_id: UserId,
    /// Held seat numbers, ascending.
    pub seats: Vec<SeatNumber>,
    /// When the hold was placed.
    pub created_at: DateTime<Utc>,
    /// When the hold lapses.
    pub expires_at: DateTime<Utc>,
}

impl TemporaryHold {
    /// Create a hold that lapses `ttl` after `now`.
    pub fn new(
        trip_id: TripId,
        user_id: UserId,
        mut seats: Vec<SeatNumber>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        seats.sort_unstable();
        seats.dedup();
        Self {
            id: HoldId::new(),
            trip_id,
            user_id,
            seats,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// Whether the hold has lapsed at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Time left before expiry, zero once lapsed.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }

    /// Whether the hold claims any of `seats`.
    pub fn overlaps(&self, seats: &[SeatNumber]) -> bool {
        self.seats.iter().any(|s| seats.contains(s))
    }
}
