use std::sync::atomic::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use seatline_core::result::AppResult;
use seatline_core::types::TripId;
use seatline_entity::location::{NewTripLocation, TripLocation};

use super::MemoryLedger;
use crate::store::LocationStore;

#[async_trait]
impl LocationStore for MemoryLedger {
    async fn append_location(&self, fix: NewTripLocation) -> AppResult<TripLocation> {
        let id = self.next_location_id.fetch_add(1, Ordering::Relaxed) + 1;
        let stored = fix.with_id(id);
        self.locations
            .entry(stored.trip_id)
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn latest_location(&self, trip_id: TripId) -> AppResult<Option<TripLocation>> {
        Ok(self.locations.get(&trip_id).and_then(|fixes| {
            fixes
                .iter()
                .max_by(|a, b| a.recorded_at.cmp(&b.recorded_at).then(a.id.cmp(&b.id)))
                .cloned()
        }))
    }

    async fn location_history(&self, trip_id: TripId, limit: u32) -> AppResult<Vec<TripLocation>> {
        let mut fixes = self
            .locations
            .get(&trip_id)
            .map(|f| f.clone())
            .unwrap_or_default();
        fixes.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at).then(b.id.cmp(&a.id)));
        fixes.truncate(limit as usize);
        Ok(fixes)
    }

    async fn prune_locations_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut removed = 0u64;
        for mut fixes in self.locations.iter_mut() {
            let before = fixes.len();
            fixes.retain(|f| f.recorded_at >= cutoff);
            removed += (before - fixes.len()) as u64;
        }
        self.locations.retain(|_, fixes| !fixes.is_empty());
        Ok(removed)
    }
}
