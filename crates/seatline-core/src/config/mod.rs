//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod booking;
pub mod cache;
pub mod logging;
pub mod realtime;
pub mod tracking;
pub mod worker;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use self::app::{CorsConfig, ServerConfig};
pub use self::booking::BookingConfig;
pub use self::cache::{CacheConfig, MemoryCacheConfig, RedisCacheConfig};
pub use self::logging::LoggingConfig;
pub use self::realtime::RealtimeConfig;
pub use self::tracking::TrackingConfig;
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// Deserialization target for the merged configuration sources
/// (`config/default.toml`, environment overlay, `SEATLINE__*` variables).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Ledger storage settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Hold store and location cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Hold, booking, and cancellation policy.
    #[serde(default)]
    pub booking: BookingConfig,
    /// Location ingest and geofence settings.
    #[serde(default)]
    pub tracking: TrackingConfig,
    /// Broadcast hub settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Background sweep settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Ledger storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Backend: `"postgres"` or `"memory"` (single process, non-durable).
    #[serde(default = "default_database_provider")]
    pub provider: String,
    /// PostgreSQL connection URL.
    #[serde(default)]
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Idle connection timeout in seconds.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            provider: default_database_provider(),
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_seconds: default_connect_timeout(),
            idle_timeout_seconds: default_idle_timeout(),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `SEATLINE__`, then checks the
    /// policy sections.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("SEATLINE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Check cross-field constraints and the validated sections.
    pub fn validate(&self) -> Result<(), AppError> {
        self.booking.validate()?;
        self.tracking.validate()?;

        if self.booking.hold_ttl_seconds > self.booking.max_hold_ttl_seconds {
            return Err(AppError::configuration(
                "booking.hold_ttl_seconds exceeds booking.max_hold_ttl_seconds",
            ));
        }
        if self.database.provider == "postgres" && self.database.url.is_empty() {
            return Err(AppError::configuration(
                "database.url is required for the postgres provider",
            ));
        }
        Ok(())
    }
}

fn default_database_provider() -> String {
    "memory".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    2
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_idle_timeout() -> u64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.booking.hold_ttl_seconds, 600);
        assert_eq!(config.booking.cancellation_window_minutes, 120);
        assert_eq!(config.tracking.geofence_radius_meters, 100.0);
    }

    #[test]
    fn test_rejects_hold_ttl_above_cap() {
        let mut config = AppConfig::default();
        config.booking.hold_ttl_seconds = 1200;
        config.booking.max_hold_ttl_seconds = 900;
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::Configuration);
    }

    #[test]
    fn test_rejects_out_of_range_geofence() {
        let mut config = AppConfig::default();
        config.tracking.geofence_radius_meters = 0.0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::Validation);
    }

    #[test]
    fn test_postgres_requires_url() {
        let mut config = AppConfig::default();
        config.database.provider = "postgres".to_string();
        assert!(config.validate().is_err());
    }
}
