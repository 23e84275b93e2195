//! Redis pub/sub transport for multi-instance deployments.

#[cfg(feature = "redis-pubsub")]
pub mod implementation {
    use async_trait::async_trait;
    use futures::StreamExt;
    use futures::stream::BoxStream;
    use redis::aio::ConnectionManager;
    use tracing::{info, warn};

    use seatline_core::error::{AppError, ErrorKind};
    use seatline_core::result::AppResult;

    use super::super::{BroadcastTransport, Envelope};

    /// Publishes envelopes on one Redis channel and relays them back from it.
    #[derive(Clone)]
    pub struct RedisTransport {
        /// Client used to open the subscriber connection.
        client: redis::Client,
        /// Shared connection for PUBLISH.
        conn: ConnectionManager,
        /// Channel name.
        channel: String,
    }

    impl std::fmt::Debug for RedisTransport {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("RedisTransport")
                .field("channel", &self.channel)
                .finish_non_exhaustive()
        }
    }

    impl RedisTransport {
        /// Connect the publisher side.
        pub async fn connect(url: &str, channel: &str) -> AppResult<Self> {
            let client = redis::Client::open(url).map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Invalid realtime Redis URL", e)
            })?;
            let conn = ConnectionManager::new(client.clone())
                .await
                .map_err(|e| transport_err("Redis connection failed", e))?;
            info!(channel, "Realtime Redis transport connected");
            Ok(Self {
                client,
                conn,
                channel: channel.to_string(),
            })
        }
    }

    #[async_trait]
    impl BroadcastTransport for RedisTransport {
        fn name(&self) -> &'static str {
            "redis"
        }

        async fn publish(&self, envelope: &Envelope) -> AppResult<()> {
            let payload = serde_json::to_string(envelope)?;
            let mut conn = self.conn.clone();
            redis::cmd("PUBLISH")
                .arg(&self.channel)
                .arg(payload)
                .query_async::<i64>(&mut conn)
                .await
                .map_err(|e| transport_err("Redis PUBLISH failed", e))?;
            Ok(())
        }

        async fn subscribe(&self) -> AppResult<Option<BoxStream<'static, Envelope>>> {
            let mut pubsub = self
                .client
                .get_async_pubsub()
                .await
                .map_err(|e| transport_err("Redis subscriber connection failed", e))?;
            pubsub
                .subscribe(&self.channel)
                .await
                .map_err(|e| transport_err("Redis SUBSCRIBE failed", e))?;

            let stream = pubsub.into_on_message().filter_map(|msg| async move {
                let payload: String = match msg.get_payload() {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!(error = %e, "Unreadable relay payload");
                        return None;
                    }
                };
                match serde_json::from_str::<Envelope>(&payload) {
                    Ok(envelope) => Some(envelope),
                    Err(e) => {
                        warn!(error = %e, "Malformed relay envelope");
                        None
                    }
                }
            });
            Ok(Some(stream.boxed()))
        }
    }

    fn transport_err(context: &str, e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::ExternalService, format!("{context}: {e}"), e)
    }
}

#[cfg(feature = "redis-pubsub")]
pub use implementation::RedisTransport;
