//! Unpaid pending booking expiry.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use seatline_service::CancellationService;

use crate::executor::{JobExecutionError, ScheduledJob};

/// Cancels PENDING bookings whose payment never arrived within the grace
/// window, freeing their seats.
#[derive(Debug)]
pub struct PendingExpiryJob {
    /// Cancellation service
    cancellation: Arc<CancellationService>,
}

impl PendingExpiryJob {
    /// Create a new pending expiry job
    pub fn new(cancellation: Arc<CancellationService>) -> Self {
        Self { cancellation }
    }
}

#[async_trait]
impl ScheduledJob for PendingExpiryJob {
    fn name(&self) -> &'static str {
        "pending_booking_expiry"
    }

    async fn run(&self) -> Result<Value, JobExecutionError> {
        let expired = self.cancellation.expire_unpaid_pending(Utc::now()).await?;

        Ok(serde_json::json!({
            "task": self.name(),
            "bookings_expired": expired,
        }))
    }
}
