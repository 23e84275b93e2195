//! Core type definitions used across the Seatline workspace.

pub mod id;
pub mod seat_set;

pub use id::*;
pub use seat_set::{SeatNumber, SeatSet};
