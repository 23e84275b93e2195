//! In-memory backends.

pub mod hold;
pub mod store;

pub use hold::MemoryHoldStore;
pub use store::MemoryCacheProvider;
