//! Temporary seat hold entities.

pub mod model;

pub use model::TemporaryHold;
