//! In-process transport for single-instance deployments.

use async_trait::async_trait;
use futures::stream::BoxStream;

use seatline_core::result::AppResult;

use super::{BroadcastTransport, Envelope};

/// No peers: local delivery is the whole broadcast.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTransport;

#[async_trait]
impl BroadcastTransport for LocalTransport {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn publish(&self, _envelope: &Envelope) -> AppResult<()> {
        Ok(())
    }

    async fn subscribe(&self) -> AppResult<Option<BoxStream<'static, Envelope>>> {
        Ok(None)
    }
}
