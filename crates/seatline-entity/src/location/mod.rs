//! Append-only trip location fixes.

pub mod model;

pub use model::{NewTripLocation, TripLocation};
