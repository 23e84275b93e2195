//! Built-in sweep jobs.

pub mod bookings;
pub mod holds;
pub mod locations;

pub use bookings::PendingExpiryJob;
pub use holds::HoldSweepJob;
pub use locations::LocationRetentionJob;
