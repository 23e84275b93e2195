//! In-process hold store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use seatline_core::result::AppResult;
use seatline_core::types::{HoldId, TripId, UserId};
use seatline_entity::hold::TemporaryHold;

use crate::hold::{HoldInsert, HoldStore, overlapping_seats};

/// Hold store keyed by trip. Each trip's holds live behind one map shard
/// lock, so the overlap check and the insert happen under the same guard.
#[derive(Debug, Default)]
pub struct MemoryHoldStore {
    trips: DashMap<TripId, Vec<TemporaryHold>>,
}

impl MemoryHoldStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a hold without any checks. Used to seed state.
    pub fn insert_unchecked(&self, hold: TemporaryHold) {
        self.trips.entry(hold.trip_id).or_default().push(hold);
    }

    /// Number of stored holds, expired ones included.
    pub fn stored_count(&self) -> usize {
        self.trips.iter().map(|holds| holds.len()).sum()
    }
}

#[async_trait]
impl HoldStore for MemoryHoldStore {
    async fn try_insert(&self, hold: &TemporaryHold, now: DateTime<Utc>) -> AppResult<HoldInsert> {
        let mut holds = self.trips.entry(hold.trip_id).or_default();
        holds.retain(|h| !h.is_expired(now));

        let conflicts = overlapping_seats(&holds, &hold.seats);
        if !conflicts.is_empty() {
            return Ok(HoldInsert::Conflict(conflicts));
        }
        holds.push(hold.clone());
        Ok(HoldInsert::Inserted)
    }

    async fn active_holds(
        &self,
        trip_id: TripId,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<TemporaryHold>> {
        let Some(mut holds) = self.trips.get_mut(&trip_id) else {
            return Ok(Vec::new());
        };
        holds.retain(|h| !h.is_expired(now));
        Ok(holds.clone())
    }

    async fn release(
        &self,
        trip_id: TripId,
        hold_id: HoldId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<Option<TemporaryHold>> {
        let Some(mut holds) = self.trips.get_mut(&trip_id) else {
            return Ok(None);
        };
        let Some(index) = holds.iter().position(|h| h.id == hold_id) else {
            return Ok(None);
        };
        if holds[index].user_id != user_id {
            return Ok(None);
        }
        let removed = holds.swap_remove(index);
        Ok((!removed.is_expired(now)).then_some(removed))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut purged = 0u64;
        for mut holds in self.trips.iter_mut() {
            let before = holds.len();
            holds.retain(|h| !h.is_expired(now));
            purged += (before - holds.len()) as u64;
        }
        self.trips.retain(|_, holds| !holds.is_empty());
        debug!(purged, "Purged expired holds from memory");
        Ok(purged)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
