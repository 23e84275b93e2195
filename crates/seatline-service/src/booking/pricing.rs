//! Booking price calculation.

use seatline_entity::trip::Trip;

/// Computes the total charged for a booking.
pub trait PricingStrategy: Send + Sync + std::fmt::Debug + 'static {
    /// Total in minor currency units for `seat_count` seats on `trip`.
    fn total_amount(&self, trip: &Trip, seat_count: usize) -> i64;
}

/// Route fare times seat count.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatFare;

impl PricingStrategy for FlatFare {
    fn total_amount(&self, trip: &Trip, seat_count: usize) -> i64 {
        trip.fare_cents.saturating_mul(seat_count as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::trip;

    #[test]
    fn test_flat_fare_multiplies() {
        let t = trip(10);
        assert_eq!(FlatFare.total_amount(&t, 3), t.fare_cents * 3);
    }
}
