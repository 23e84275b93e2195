//! # seatline-core
//!
//! Core crate for Seatline. Contains configuration schemas, typed
//! identifiers, the seat bitset, the cache provider trait,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other Seatline crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
