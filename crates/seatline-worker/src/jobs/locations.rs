//! Location history retention.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use seatline_service::TrackingService;

use crate::executor::{JobExecutionError, ScheduledJob};

/// Deletes location fixes older than `tracking.retention_days`.
#[derive(Debug)]
pub struct LocationRetentionJob {
    /// Tracking service
    tracking: Arc<TrackingService>,
}

impl LocationRetentionJob {
    /// Create a new retention job
    pub fn new(tracking: Arc<TrackingService>) -> Self {
        Self { tracking }
    }
}

#[async_trait]
impl ScheduledJob for LocationRetentionJob {
    fn name(&self) -> &'static str {
        "location_retention"
    }

    async fn run(&self) -> Result<Value, JobExecutionError> {
        let pruned = self
            .tracking
            .prune_history()
            .await
            .map_err(|e| JobExecutionError::Transient(format!("Location pruning failed: {e}")))?;

        Ok(serde_json::json!({
            "task": self.name(),
            "locations_pruned": pruned,
        }))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use seatline_core::config::AppConfig;
    use seatline_database::store::LocationStore;
    use seatline_entity::location::NewTripLocation;

    use super::*;
    use crate::jobs::fixtures::{fixture, trip};

    fn fix(trip_id: seatline_core::types::TripId, age: Duration) -> NewTripLocation {
        NewTripLocation {
            trip_id,
            latitude: 7.1,
            longitude: 125.6,
            speed: None,
            heading: None,
            recorded_at: Utc::now() - age,
        }
    }

    #[tokio::test]
    async fn test_prunes_only_old_fixes() {
        let config = AppConfig::default();
        let f = fixture(&config);
        let trip = trip(10);
        f.ledger.upsert_trip(trip.clone());

        let old = Duration::days(config.tracking.retention_days + 1);
        f.ledger.append_location(fix(trip.id, old)).await.unwrap();
        f.ledger.append_location(fix(trip.id, old)).await.unwrap();
        f.ledger.append_location(fix(trip.id, Duration::minutes(1))).await.unwrap();

        let job = LocationRetentionJob::new(f.services.tracking.clone());
        let summary = job.run().await.unwrap();
        assert_eq!(summary["locations_pruned"], 2);

        let left = f.services.tracking.get_location_history(trip.id, 10).await.unwrap();
        assert_eq!(left.len(), 1);
    }
}
