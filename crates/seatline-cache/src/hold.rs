//! Temporary hold store.
//!
//! Holds are a UX courtesy: they keep other users from grabbing seats while
//! someone is checking out, but the booking ledger re-checks occupancy on
//! commit regardless. The store guarantees that a seat is never in two live
//! holds of the same trip. Expiry is lazy: readers filter by `now`, and the
//! periodic sweep reclaims space.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use seatline_core::result::AppResult;
use seatline_core::types::{HoldId, SeatNumber, TripId, UserId};
use seatline_entity::hold::TemporaryHold;

/// Result of an atomic hold insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoldInsert {
    /// The hold was stored.
    Inserted,
    /// Live holds already claim these seats; nothing was stored.
    Conflict(Vec<SeatNumber>),
}

/// TTL-aware storage for [`TemporaryHold`] records.
#[async_trait]
pub trait HoldStore: Send + Sync + std::fmt::Debug + 'static {
    /// Store `hold` unless a live hold on the same trip overlaps its seats.
    ///
    /// The overlap check and the write are atomic with respect to other
    /// inserts on the same trip. Expired holds encountered are dropped.
    async fn try_insert(&self, hold: &TemporaryHold, now: DateTime<Utc>) -> AppResult<HoldInsert>;

    /// Live holds on the trip at `now`.
    async fn active_holds(&self, trip_id: TripId, now: DateTime<Utc>)
    -> AppResult<Vec<TemporaryHold>>;

    /// Remove a hold owned by `user_id`.
    ///
    /// Returns the removed hold only when it existed, belonged to the user,
    /// and had not expired at `now`. Expired holds are removed either way.
    async fn release(
        &self,
        trip_id: TripId,
        hold_id: HoldId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<Option<TemporaryHold>>;

    /// Physically delete every hold expired at `now`. Returns the count.
    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}

/// Seats in `requested` claimed by any of `holds`, ascending.
pub(crate) fn overlapping_seats(
    holds: &[TemporaryHold],
    requested: &[SeatNumber],
) -> Vec<SeatNumber> {
    let mut seats: Vec<SeatNumber> = holds
        .iter()
        .flat_map(|h| h.seats.iter().copied())
        .filter(|s| requested.contains(s))
        .collect();
    seats.sort_unstable();
    seats.dedup();
    seats
}
