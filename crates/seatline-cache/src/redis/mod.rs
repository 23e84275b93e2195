//! Redis backends.

pub mod client;
pub mod hold;
pub mod operations;

pub use client::RedisClient;
pub use hold::RedisHoldStore;
pub use operations::RedisCacheProvider;
