//! # seatline-cache
//!
//! Short-lived state for Seatline: the temporary hold store and the
//! latest-location cache. Two backends are available:
//!
//! - **memory**: in-process, using [moka](https://crates.io/crates/moka) and `dashmap`
//! - **redis**: shared between instances, with Lua scripts for atomic hold writes
//!
//! The backend is selected at runtime from `cache.provider`.

pub mod hold;
pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use hold::{HoldInsert, HoldStore};
pub use provider::CacheManager;
