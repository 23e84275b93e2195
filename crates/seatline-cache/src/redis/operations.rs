//! Redis cache provider implementation.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use seatline_core::result::AppResult;
use seatline_core::traits::cache::CacheProvider;

use super::client::{RedisClient, cache_err};

/// Redis-backed key-value cache.
#[derive(Debug, Clone)]
pub struct RedisCacheProvider {
    /// Redis client.
    client: RedisClient,
}

impl RedisCacheProvider {
    /// Create a new Redis cache provider.
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CacheProvider for RedisCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn();
        conn.get(&full_key).await.map_err(|e| cache_err("Redis GET failed", e))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn();
        let millis = ttl.as_millis().max(1) as u64;
        let _: () = conn
            .pset_ex(&full_key, value, millis)
            .await
            .map_err(|e| cache_err("Redis PSETEX failed", e))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn();
        let _: () = conn
            .del(&full_key)
            .await
            .map_err(|e| cache_err("Redis DEL failed", e))?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn();
        conn.exists(&full_key)
            .await
            .map_err(|e| cache_err("Redis EXISTS failed", e))
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.client.conn();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| cache_err("Redis PING failed", e))?;
        Ok(pong == "PONG")
    }
}
