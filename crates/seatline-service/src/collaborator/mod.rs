//! Ports to systems outside the reservation core: payments, notifications,
//! and the real-time event fanout.

pub mod notification;
pub mod payment;
pub mod publisher;

use std::future::Future;
use std::sync::Arc;

use tracing::warn;

use seatline_core::result::AppResult;

pub use notification::{LoggingNotificationSink, Notification, NotificationKind, NotificationSink};
pub use payment::{LoggingPaymentGateway, PaymentGateway};
pub use publisher::{EventPublisher, NoopPublisher};

/// The external collaborators injected into the services.
#[derive(Debug, Clone)]
pub struct Collaborators {
    /// Payment provider.
    pub payments: Arc<dyn PaymentGateway>,
    /// User notification delivery.
    pub notifications: Arc<dyn NotificationSink>,
    /// Real-time event fanout.
    pub events: Arc<dyn EventPublisher>,
}

impl Collaborators {
    /// Logging payment and notification collaborators with the given publisher.
    pub fn with_publisher(events: Arc<dyn EventPublisher>) -> Self {
        Self {
            payments: Arc::new(LoggingPaymentGateway),
            notifications: Arc::new(LoggingNotificationSink),
            events,
        }
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Self::with_publisher(Arc::new(NoopPublisher))
    }
}

/// Run a collaborator call in the background. Failures are logged only.
pub(crate) fn fire_and_forget<F>(action: &'static str, call: F)
where
    F: Future<Output = AppResult<()>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = call.await {
            warn!(action, error = %e, "Collaborator call failed");
        }
    });
}

/// Send a notification in the background.
pub(crate) fn notify(sink: &Arc<dyn NotificationSink>, notification: Notification) {
    let sink = Arc::clone(sink);
    let action = notification.kind.as_str();
    fire_and_forget(action, async move { sink.notify(notification).await });
}
