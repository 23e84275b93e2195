//! Expired hold sweep.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use seatline_service::HoldService;

use crate::executor::{JobExecutionError, ScheduledJob};

/// Physically removes holds past their TTL. Readers already ignore them;
/// this only reclaims space.
#[derive(Debug)]
pub struct HoldSweepJob {
    /// Hold service
    holds: Arc<HoldService>,
}

impl HoldSweepJob {
    /// Create a new hold sweep job
    pub fn new(holds: Arc<HoldService>) -> Self {
        Self { holds }
    }
}

#[async_trait]
impl ScheduledJob for HoldSweepJob {
    fn name(&self) -> &'static str {
        "hold_sweep"
    }

    async fn run(&self) -> Result<Value, JobExecutionError> {
        let removed = self
            .holds
            .purge_expired()
            .await
            .map_err(|e| JobExecutionError::Transient(format!("Hold sweep failed: {e}")))?;

        Ok(serde_json::json!({
            "task": self.name(),
            "expired_holds_removed": removed,
        }))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use seatline_core::config::AppConfig;
    use seatline_core::types::UserId;
    use seatline_entity::hold::TemporaryHold;

    use super::*;
    use crate::jobs::fixtures::{fixture, trip};

    #[tokio::test]
    async fn test_sweep_reports_removed_holds() {
        let f = fixture(&AppConfig::default());
        let trip = trip(20);
        f.ledger.upsert_trip(trip.clone());

        f.services
            .holds
            .create_hold(trip.id, UserId::new(), &[5], None)
            .await
            .unwrap();
        let past = Utc::now() - Duration::minutes(30);
        let stale =
            TemporaryHold::new(trip.id, UserId::new(), vec![1, 2], past, Duration::minutes(10));
        f.cache.holds().try_insert(&stale, past).await.unwrap();

        let job = HoldSweepJob::new(f.services.holds.clone());
        let summary = job.run().await.unwrap();
        assert_eq!(summary["task"], "hold_sweep");
        assert_eq!(summary["expired_holds_removed"], 1);

        let summary = job.run().await.unwrap();
        assert_eq!(summary["expired_holds_removed"], 0);
    }
}
