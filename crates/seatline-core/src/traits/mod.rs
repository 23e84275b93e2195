//! Core traits defined in `seatline-core` and implemented by other crates.

pub mod cache;

pub use cache::{CacheProvider, CacheProviderExt};
