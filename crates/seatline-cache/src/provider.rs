//! Cache manager that dispatches to the configured provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use seatline_core::config::cache::CacheConfig;
use seatline_core::error::AppError;
use seatline_core::result::AppResult;
use seatline_core::traits::cache::CacheProvider;

use crate::hold::HoldStore;

/// Cache manager that wraps the configured key-value provider and hold store.
///
/// Both are built from the same backend, selected at construction time from
/// `cache.provider`.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// The inner key-value provider.
    inner: Arc<dyn CacheProvider>,
    /// Temporary seat holds.
    holds: Arc<dyn HoldStore>,
    /// TTL applied when callers do not pass one.
    default_ttl: Duration,
}

impl CacheManager {
    /// Create a new cache manager from configuration.
    pub async fn new(config: &CacheConfig) -> AppResult<Self> {
        let (inner, holds): (Arc<dyn CacheProvider>, Arc<dyn HoldStore>) =
            match config.provider.as_str() {
                #[cfg(feature = "redis-backend")]
                "redis" => {
                    info!("Initializing Redis cache provider");
                    let client = crate::redis::RedisClient::connect(&config.redis).await?;
                    (
                        Arc::new(crate::redis::RedisCacheProvider::new(client.clone())),
                        Arc::new(crate::redis::RedisHoldStore::new(client)),
                    )
                }
                #[cfg(feature = "memory")]
                "memory" => {
                    info!("Initializing in-memory cache provider");
                    (
                        Arc::new(crate::memory::MemoryCacheProvider::new(&config.memory)),
                        Arc::new(crate::memory::MemoryHoldStore::new()),
                    )
                }
                other => {
                    return Err(AppError::configuration(format!(
                        "Unknown cache provider: '{other}'. Supported: memory, redis"
                    )));
                }
            };

        Ok(Self {
            inner,
            holds,
            default_ttl: Duration::from_secs(config.default_ttl_seconds),
        })
    }

    /// Create a cache manager from existing parts (for testing).
    pub fn from_parts(provider: Arc<dyn CacheProvider>, holds: Arc<dyn HoldStore>) -> Self {
        Self {
            inner: provider,
            holds,
            default_ttl: Duration::from_secs(300),
        }
    }

    /// In-process provider and hold store.
    #[cfg(feature = "memory")]
    pub fn in_memory(config: &CacheConfig) -> Self {
        Self {
            inner: Arc::new(crate::memory::MemoryCacheProvider::new(&config.memory)),
            holds: Arc::new(crate::memory::MemoryHoldStore::new()),
            default_ttl: Duration::from_secs(config.default_ttl_seconds),
        }
    }

    /// Get a reference to the inner provider.
    pub fn provider(&self) -> &dyn CacheProvider {
        self.inner.as_ref()
    }

    /// Shared handle to the hold store.
    pub fn holds(&self) -> Arc<dyn HoldStore> {
        Arc::clone(&self.holds)
    }

    /// TTL used by [`CacheManager::set_default`].
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Set a value with the configured default TTL.
    pub async fn set_default(&self, key: &str, value: &str) -> AppResult<()> {
        self.inner.set(key, value, self.default_ttl).await
    }
}

#[async_trait]
impl CacheProvider for CacheManager {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        self.inner.exists(key).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self.inner.health_check().await? && self.holds.health_check().await?)
    }
}
