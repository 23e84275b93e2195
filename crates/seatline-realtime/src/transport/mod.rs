//! Broadcast transports. The hub always delivers to its own sockets first;
//! a transport carries the same frame to peer instances.

pub mod local;
pub mod redis;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use seatline_core::config::RealtimeConfig;
use seatline_core::error::AppError;
use seatline_core::result::AppResult;
use seatline_core::types::{DriverId, TripId, UserId};

pub use self::local::LocalTransport;

/// Where a relayed frame goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Target {
    /// Every subscriber of a trip.
    Trip(TripId),
    /// One driver's socket.
    Driver(DriverId),
    /// Every socket of a user.
    User(UserId),
}

/// A serialized frame on its way between instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Instance that accepted the event.
    pub instance_id: Uuid,
    /// Recipients.
    pub target: Target,
    /// The JSON frame, ready to send.
    pub frame: String,
}

/// Carries frames between hub instances.
#[async_trait]
pub trait BroadcastTransport: Send + Sync + std::fmt::Debug + 'static {
    /// Transport name for logging.
    fn name(&self) -> &'static str;

    /// Hand an envelope to peer instances.
    async fn publish(&self, envelope: &Envelope) -> AppResult<()>;

    /// Stream of envelopes from all instances, or `None` when the transport
    /// has no peers.
    async fn subscribe(&self) -> AppResult<Option<BoxStream<'static, Envelope>>>;
}

/// Build the transport selected by `realtime.transport`.
pub async fn from_config(
    config: &RealtimeConfig,
) -> AppResult<std::sync::Arc<dyn BroadcastTransport>> {
    match config.transport.as_str() {
        "local" => Ok(std::sync::Arc::new(LocalTransport)),
        #[cfg(feature = "redis-pubsub")]
        "redis" => Ok(std::sync::Arc::new(
            self::redis::RedisTransport::connect(&config.redis_url, &config.redis_channel).await?,
        )),
        other => Err(AppError::configuration(format!(
            "Unknown realtime transport: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_transport_is_rejected() {
        let config = RealtimeConfig {
            transport: "carrier-pigeon".to_string(),
            ..RealtimeConfig::default()
        };
        let err = from_config(&config).await.unwrap_err();
        assert_eq!(err.kind, seatline_core::ErrorKind::Configuration);
    }

    #[test]
    fn test_envelope_json() {
        let trip_id = TripId::new();
        let envelope = Envelope {
            instance_id: Uuid::new_v4(),
            target: Target::Trip(trip_id),
            frame: r#"{"type":"pong"}"#.to_string(),
        };
        let json = serde_json::to_string(&envelope).unwrap();
        assert_eq!(serde_json::from_str::<Envelope>(&json).unwrap(), envelope);
    }
}
