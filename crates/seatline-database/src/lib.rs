//! # seatline-database
//!
//! Storage for trips, the booking ledger, and location history. The
//! [`store`] traits are implemented twice: by PostgreSQL repositories in
//! [`repositories`] and by an in-process ledger in [`memory`] for single-node
//! and test deployments.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryLedger;
pub use store::{BookingStore, BookingTransition, LocationStore, TripStore};
