//! Background sweep configuration.

use serde::{Deserialize, Serialize};

/// Cron schedules for the periodic sweeps (six-field, seconds first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the scheduler is started.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Schedule of the expired-hold sweep.
    #[serde(default = "default_hold_sweep_cron")]
    pub hold_sweep_cron: String,
    /// Schedule of the unpaid pending-booking expiry.
    #[serde(default = "default_pending_expiry_cron")]
    pub pending_expiry_cron: String,
    /// Schedule of the location history retention job.
    #[serde(default = "default_location_retention_cron")]
    pub location_retention_cron: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hold_sweep_cron: default_hold_sweep_cron(),
            pending_expiry_cron: default_pending_expiry_cron(),
            location_retention_cron: default_location_retention_cron(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_hold_sweep_cron() -> String {
    "*/30 * * * * *".to_string()
}

fn default_pending_expiry_cron() -> String {
    "0 * * * * *".to_string()
}

fn default_location_retention_cron() -> String {
    "0 15 3 * * *".to_string()
}
