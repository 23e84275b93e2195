//! Hold, booking, and cancellation policy configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Reservation policy knobs.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Default lifetime of a temporary hold in seconds.
    #[serde(default = "default_hold_ttl")]
    #[validate(range(min = 1, max = 3600))]
    pub hold_ttl_seconds: u64,
    /// Upper bound for a caller-supplied hold TTL.
    #[serde(default = "default_max_hold_ttl")]
    #[validate(range(min = 1, max = 3600))]
    pub max_hold_ttl_seconds: u64,
    /// Maximum seats in a single hold.
    #[serde(default = "default_max_seats_per_hold")]
    #[validate(range(min = 1, max = 64))]
    pub max_seats_per_hold: usize,
    /// Maximum seats in a single booking.
    #[serde(default = "default_max_seats_per_booking")]
    #[validate(range(min = 1, max = 64))]
    pub max_seats_per_booking: usize,
    /// Cancellation closes this many minutes before departure.
    #[serde(default = "default_cancellation_window")]
    pub cancellation_window_minutes: i64,
    /// Unpaid PENDING bookings older than this are expired by the sweep.
    #[serde(default = "default_pending_grace")]
    #[validate(range(min = 1))]
    pub pending_grace_minutes: i64,
    /// Attempts at generating a unique booking reference.
    #[serde(default = "default_reference_attempts")]
    #[validate(range(min = 1, max = 20))]
    pub reference_attempts: u32,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            hold_ttl_seconds: default_hold_ttl(),
            max_hold_ttl_seconds: default_max_hold_ttl(),
            max_seats_per_hold: default_max_seats_per_hold(),
            max_seats_per_booking: default_max_seats_per_booking(),
            cancellation_window_minutes: default_cancellation_window(),
            pending_grace_minutes: default_pending_grace(),
            reference_attempts: default_reference_attempts(),
        }
    }
}

fn default_hold_ttl() -> u64 {
    600
}

fn default_max_hold_ttl() -> u64 {
    900
}

fn default_max_seats_per_hold() -> usize {
    4
}

fn default_max_seats_per_booking() -> usize {
    10
}

fn default_cancellation_window() -> i64 {
    120
}

fn default_pending_grace() -> i64 {
    15
}

fn default_reference_attempts() -> u32 {
    5
}
