//! Domain event publisher port.

use async_trait::async_trait;
use tracing::trace;

use seatline_entity::event::DomainEvent;

/// Sink for domain events. Implemented by the broadcast hub.
///
/// Publishing never fails the calling operation; implementations handle
/// their own delivery errors. Calls for the same trip are made in the order
/// the operations were accepted.
#[async_trait]
pub trait EventPublisher: Send + Sync + std::fmt::Debug + 'static {
    /// Publish one event.
    async fn publish(&self, event: DomainEvent);
}

/// Publisher that drops every event.
#[derive(Debug, Clone, Default)]
pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    async fn publish(&self, event: DomainEvent) {
        trace!(?event, "Event dropped");
    }
}
