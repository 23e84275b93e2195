//! Job trait and the single-run wrapper used by the scheduler.

use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use tracing;

use seatline_core::error::AppError;

/// A periodic task.
#[async_trait]
pub trait ScheduledJob: Send + Sync + std::fmt::Debug {
    /// Job name used in logs and summaries.
    fn name(&self) -> &'static str;

    /// Run once and report what was done.
    async fn run(&self) -> Result<Value, JobExecutionError>;
}

/// Error from a job run
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// Failure worth retrying on the next tick
    #[error("Transient job failure: {0}")]
    Transient(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

/// Run a job once, logging the summary or the failure. Errors never escape:
/// the next tick simply tries again.
pub async fn run_job(job: &dyn ScheduledJob) -> Option<Value> {
    let started = Instant::now();
    match job.run().await {
        Ok(summary) => {
            tracing::info!(
                job = job.name(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                summary = %summary,
                "Job completed"
            );
            Some(summary)
        }
        Err(e) => {
            tracing::error!(
                job = job.name(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                error = %e,
                "Job failed"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Failing;

    #[async_trait]
    impl ScheduledJob for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn run(&self) -> Result<Value, JobExecutionError> {
            Err(AppError::database("connection reset").into())
        }
    }

    #[tokio::test]
    async fn test_failed_run_is_contained() {
        assert!(run_job(&Failing).await.is_none());
    }
}
