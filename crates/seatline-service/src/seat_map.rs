//! Seat range resolution and seat selection checks.

use seatline_core::error::AppError;
use seatline_core::result::AppResult;
use seatline_core::types::{SeatNumber, SeatSet};
use seatline_entity::trip::Trip;

/// Resolves a trip's seat range from its vehicle capacity.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeatMapResolver;

impl SeatMapResolver {
    /// Creates a new resolver.
    pub fn new() -> Self {
        Self
    }

    /// The full seat range `1..=capacity` of the trip's vehicle.
    pub fn resolve(&self, trip: &Trip) -> SeatSet {
        trip.seat_range()
    }

    /// Check a hold request: 1 to `max` distinct seats, all on the vehicle.
    pub fn validate_unique(
        &self,
        trip: &Trip,
        seats: &[SeatNumber],
        max: usize,
    ) -> AppResult<SeatSet> {
        check_count(seats.len(), max)?;
        SeatSet::from_unique(trip.capacity(), seats)
    }

    /// Check a booking request. Duplicates collapse before counting.
    pub fn normalize(&self, trip: &Trip, seats: &[SeatNumber], max: usize) -> AppResult<SeatSet> {
        let set = SeatSet::from_seats(trip.capacity(), seats.iter().copied())?;
        check_count(set.len(), max)?;
        Ok(set)
    }
}

fn check_count(count: usize, max: usize) -> AppResult<()> {
    if count == 0 {
        return Err(AppError::validation("At least one seat is required"));
    }
    if count > max {
        return Err(AppError::validation(format!(
            "At most {max} seats may be requested at once"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use seatline_core::ErrorKind;

    use super::*;
    use crate::test_support::trip;

    #[test]
    fn test_resolve_covers_capacity() {
        let seats = SeatMapResolver.resolve(&trip(12));
        assert_eq!(seats.len(), 12);
        assert_eq!(seats.iter().next(), Some(1));
        assert!(seats.contains(12));
        assert!(!seats.contains(13));
    }

    #[test]
    fn test_hold_selection_rules() {
        let resolver = SeatMapResolver;
        let t = trip(10);
        assert_eq!(resolver.validate_unique(&t, &[2, 1], 4).unwrap().to_vec(), vec![1, 2]);
        let cases: [&[SeatNumber]; 4] = [&[], &[1, 1], &[1, 2, 3, 4, 5], &[11]];
        for seats in cases {
            let err = resolver.validate_unique(&t, seats, 4).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation, "seats {seats:?}");
        }
    }

    #[test]
    fn test_booking_selection_collapses_duplicates() {
        let resolver = SeatMapResolver;
        let t = trip(10);
        assert_eq!(resolver.normalize(&t, &[3, 3, 2], 2).unwrap().to_vec(), vec![2, 3]);
        assert!(resolver.normalize(&t, &[0], 2).is_err());
    }
}
