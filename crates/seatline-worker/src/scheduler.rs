//! Cron scheduler for the periodic sweeps.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;

use seatline_core::config::WorkerConfig;
use seatline_core::error::AppError;
use seatline_service::Services;

use crate::executor::{ScheduledJob, run_job};
use crate::jobs::{HoldSweepJob, LocationRetentionJob, PendingExpiryJob};

/// Cron-based scheduler for background sweeps
pub struct CronScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
    /// Names of registered jobs
    registered: Vec<&'static str>,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler")
            .field("registered", &self.registered)
            .finish_non_exhaustive()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new() -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self {
            scheduler,
            registered: Vec::new(),
        })
    }

    /// Register the hold sweep, pending expiry, and location retention jobs
    pub async fn register_default_jobs(
        &mut self,
        config: &WorkerConfig,
        services: &Services,
    ) -> Result<(), AppError> {
        self.register(
            &config.hold_sweep_cron,
            Arc::new(HoldSweepJob::new(services.holds.clone())),
        )
        .await?;
        self.register(
            &config.pending_expiry_cron,
            Arc::new(PendingExpiryJob::new(services.cancellation.clone())),
        )
        .await?;
        self.register(
            &config.location_retention_cron,
            Arc::new(LocationRetentionJob::new(services.tracking.clone())),
        )
        .await?;

        tracing::info!(jobs = ?self.registered, "All scheduled jobs registered");
        Ok(())
    }

    /// Run `job` on a six-field cron schedule (seconds first)
    pub async fn register(
        &mut self,
        schedule: &str,
        job: Arc<dyn ScheduledJob>,
    ) -> Result<(), AppError> {
        let name = job.name();
        let cron_job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let job = Arc::clone(&job);
            Box::pin(async move {
                tracing::debug!(job = job.name(), "Running scheduled job");
                run_job(job.as_ref()).await;
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid schedule '{schedule}' for {name}: {e}"))
        })?;

        self.scheduler
            .add(cron_job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add {name} schedule: {e}")))?;

        self.registered.push(name);
        tracing::info!(job = name, schedule, "Registered scheduled job");
        Ok(())
    }

    /// Names of registered jobs
    pub fn registered(&self) -> &[&'static str] {
        &self.registered
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&self) -> Result<(), AppError> {
        let mut scheduler = self.scheduler.clone();
        scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }
}
