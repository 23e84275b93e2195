//! Real-time broadcast hub configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) broadcast configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Broadcast transport: `"local"` (single instance) or `"redis"` (pub/sub
    /// relay between instances).
    #[serde(default = "default_transport")]
    pub transport: String,
    /// Redis URL used by the `"redis"` transport.
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// Pub/sub channel shared by all instances.
    #[serde(default = "default_redis_channel")]
    pub redis_channel: String,
    /// Outbound buffer per connection. A full buffer counts as a failed send.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            transport: default_transport(),
            redis_url: default_redis_url(),
            redis_channel: default_redis_channel(),
            channel_buffer_size: default_channel_buffer(),
        }
    }
}

fn default_transport() -> String {
    "local".to_string()
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_redis_channel() -> String {
    "seatline:broadcast".to_string()
}

fn default_channel_buffer() -> usize {
    256
}
