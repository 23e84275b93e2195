//! Location ingest and geofence configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Location tracking settings.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Distance to the destination terminal that counts as arrival.
    #[serde(default = "default_geofence_radius")]
    #[validate(range(min = 1.0, max = 10000.0))]
    pub geofence_radius_meters: f64,
    /// Lifetime of the cached latest location.
    #[serde(default = "default_location_cache_ttl")]
    #[validate(range(min = 1))]
    pub location_cache_ttl_seconds: u64,
    /// Hard cap on history queries.
    #[serde(default = "default_history_limit_max")]
    #[validate(range(min = 1, max = 1000))]
    pub history_limit_max: u32,
    /// Location rows older than this are pruned by the retention job.
    #[serde(default = "default_retention_days")]
    #[validate(range(min = 1))]
    pub retention_days: i64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            geofence_radius_meters: default_geofence_radius(),
            location_cache_ttl_seconds: default_location_cache_ttl(),
            history_limit_max: default_history_limit_max(),
            retention_days: default_retention_days(),
        }
    }
}

fn default_geofence_radius() -> f64 {
    100.0
}

fn default_location_cache_ttl() -> u64 {
    300
}

fn default_history_limit_max() -> u32 {
    1000
}

fn default_retention_days() -> i64 {
    30
}
