use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;

use seatline_core::error::AppError;
use seatline_core::result::AppResult;
use seatline_core::types::{BookingId, SeatNumber, TripId, UserId};
use seatline_entity::booking::{Booking, BookingStatus, NewBooking, PaymentStatus};

use super::MemoryLedger;
use crate::store::{BookingStore, BookingTransition};

impl MemoryLedger {
    fn occupied_now(&self, trip_id: TripId) -> Vec<SeatNumber> {
        let mut seats: Vec<SeatNumber> = self
            .bookings
            .iter()
            .filter(|b| b.trip_id == trip_id && b.status.occupies_seats())
            .flat_map(|b| b.seat_numbers.clone())
            .collect();
        seats.sort_unstable();
        seats
    }

    fn adjust_booked_seats(&self, trip_id: TripId, delta: i32) {
        if let Some(mut trip) = self.trips.get_mut(&trip_id) {
            trip.booked_seats = (trip.booked_seats + delta).max(0);
        }
    }

    /// Validate and store a booking. The caller holds the trip's mutex.
    fn commit_locked(&self, booking: NewBooking) -> AppResult<Booking> {
        let status = self
            .trips
            .get(&booking.trip_id)
            .map(|t| t.status)
            .ok_or_else(|| AppError::not_found(format!("Trip {} not found", booking.trip_id)))?;
        if !status.is_bookable() {
            return Err(AppError::not_bookable(format!(
                "Trip {} is {status}",
                booking.trip_id
            )));
        }

        let occupied = self.occupied_now(booking.trip_id);
        let taken: Vec<SeatNumber> = booking
            .seat_numbers
            .iter()
            .copied()
            .filter(|s| occupied.binary_search(s).is_ok())
            .collect();
        if !taken.is_empty() {
            return Err(AppError::seat_not_available(format!(
                "Seats {taken:?} are no longer available"
            )));
        }

        match self.references.entry(booking.reference.clone()) {
            Entry::Occupied(_) => {
                return Err(AppError::conflict("Booking reference is already in use"));
            }
            Entry::Vacant(slot) => {
                slot.insert(booking.id);
            }
        }

        let seat_count = booking.seat_numbers.len() as i32;
        let stored = booking.into_booking(Utc::now());
        self.bookings.insert(stored.id, stored.clone());
        self.adjust_booked_seats(stored.trip_id, seat_count);
        Ok(stored)
    }
}

#[async_trait]
impl BookingStore for MemoryLedger {
    async fn occupied_seats(&self, trip_id: TripId) -> AppResult<Vec<SeatNumber>> {
        Ok(self.occupied_now(trip_id))
    }

    async fn reference_exists(&self, reference: &str) -> AppResult<bool> {
        Ok(self.references.contains_key(reference))
    }

    async fn commit_booking(&self, booking: NewBooking) -> AppResult<Booking> {
        let trip_id = booking.trip_id;
        let lock = self.trip_lock(trip_id);
        let committed = {
            let _guard = lock.lock().await;
            self.commit_locked(booking)
        };
        drop(lock);
        self.release_trip_lock(trip_id);
        committed
    }

    async fn find_booking(&self, booking_id: BookingId) -> AppResult<Option<Booking>> {
        Ok(self.bookings.get(&booking_id).map(|b| b.clone()))
    }

    async fn find_by_user(&self, user_id: UserId) -> AppResult<Vec<Booking>> {
        let mut found: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id)
            .map(|b| b.clone())
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn transition(&self, transition: BookingTransition) -> AppResult<Option<Booking>> {
        let Some(trip_id) = self.bookings.get(&transition.booking_id).map(|b| b.trip_id) else {
            return Ok(None);
        };
        let lock = self.trip_lock(trip_id);
        let guard = lock.lock().await;

        let updated = {
            let Some(mut booking) = self.bookings.get_mut(&transition.booking_id) else {
                return Ok(None);
            };
            if !transition.from.contains(&booking.status) {
                return Ok(None);
            }
            let released = transition.releases_seats() && booking.status.occupies_seats();
            booking.status = transition.to;
            if let Some(payment) = transition.payment_status {
                booking.payment_status = payment;
            }
            if transition.to == BookingStatus::Cancelled {
                if transition.reason.is_some() {
                    booking.cancellation_reason = transition.reason.clone();
                }
                booking.cancelled_at = Some(transition.at);
            }
            booking.updated_at = transition.at;
            (booking.clone(), released)
        };

        let (booking, released) = updated;
        if released {
            self.adjust_booked_seats(trip_id, -(booking.seat_numbers.len() as i32));
        }
        drop(guard);
        drop(lock);
        self.release_trip_lock(trip_id);
        Ok(Some(booking))
    }

    async fn set_payment_status(
        &self,
        booking_id: BookingId,
        payment_status: PaymentStatus,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Booking>> {
        Ok(self.bookings.get_mut(&booking_id).map(|mut b| {
            b.payment_status = payment_status;
            b.updated_at = at;
            b.clone()
        }))
    }

    async fn find_stale_pending(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Booking>> {
        let mut stale: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|b| {
                b.status == BookingStatus::Pending
                    && b.payment_status == PaymentStatus::Pending
                    && b.created_at < cutoff
            })
            .map(|b| b.clone())
            .collect();
        stale.sort_by_key(|b| b.created_at);
        Ok(stale)
    }

    async fn complete_for_trip(&self, trip_id: TripId, at: DateTime<Utc>) -> AppResult<u64> {
        let mut completed = 0;
        for mut booking in self.bookings.iter_mut() {
            if booking.trip_id == trip_id && booking.status == BookingStatus::Confirmed {
                booking.status = BookingStatus::Completed;
                booking.updated_at = at;
                completed += 1;
            }
        }
        Ok(completed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use seatline_core::ErrorKind;
    use seatline_entity::trip::TripStatus;

    use super::*;
    use crate::memory::fixtures;
    use crate::store::TripStore;

    fn new_booking(trip_id: TripId, seats: Vec<SeatNumber>, reference: &str) -> NewBooking {
        NewBooking {
            id: BookingId::new(),
            trip_id,
            user_id: UserId::new(),
            seat_numbers: seats,
            total_amount_cents: 3000,
            reference: reference.to_string(),
        }
    }

    #[tokio::test]
    async fn test_commit_claims_seats_and_counts() {
        let ledger = MemoryLedger::new();
        let trip = fixtures::trip(20);
        let trip_id = trip.id;
        ledger.upsert_trip(trip);

        let booking = ledger
            .commit_booking(new_booking(trip_id, vec![3, 4], "ABCDEFGH"))
            .await
            .unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.payment_status, PaymentStatus::Pending);
        assert_eq!(ledger.occupied_seats(trip_id).await.unwrap(), vec![3, 4]);
        assert_eq!(ledger.find_trip(trip_id).await.unwrap().unwrap().booked_seats, 2);
        assert!(ledger.reference_exists("ABCDEFGH").await.unwrap());
    }

    #[tokio::test]
    async fn test_commit_rejects_taken_seat_and_duplicate_reference() {
        let ledger = MemoryLedger::new();
        let trip = fixtures::trip(20);
        let trip_id = trip.id;
        ledger.upsert_trip(trip);

        ledger
            .commit_booking(new_booking(trip_id, vec![1], "AAAAAAAA"))
            .await
            .unwrap();

        let err = ledger
            .commit_booking(new_booking(trip_id, vec![1, 2], "BBBBBBBB"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::SeatNotAvailable);

        let err = ledger
            .commit_booking(new_booking(trip_id, vec![5], "AAAAAAAA"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(ledger.booking_count(), 1);
    }

    #[tokio::test]
    async fn test_commit_requires_bookable_trip() {
        let ledger = MemoryLedger::new();
        let mut trip = fixtures::trip(20);
        trip.status = TripStatus::InTransit;
        let trip_id = trip.id;
        ledger.upsert_trip(trip);

        let err = ledger
            .commit_booking(new_booking(trip_id, vec![1], "CCCCCCCC"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotBookable);

        let err = ledger
            .commit_booking(new_booking(TripId::new(), vec![1], "DDDDDDDD"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_concurrent_commits_for_same_seat() {
        let ledger = Arc::new(MemoryLedger::new());
        let trip = fixtures::trip(10);
        let trip_id = trip.id;
        ledger.upsert_trip(trip);

        let a = {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move {
                ledger.commit_booking(new_booking(trip_id, vec![7], "EEEEEEEE")).await
            })
        };
        let b = {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move {
                ledger.commit_booking(new_booking(trip_id, vec![7], "FFFFFFFF")).await
            })
        };
        let results = [a.await.unwrap(), b.await.unwrap()];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(ledger.occupied_seats(trip_id).await.unwrap(), vec![7]);
    }

    #[tokio::test]
    async fn test_cancel_transition_releases_seats_once() {
        let ledger = MemoryLedger::new();
        let trip = fixtures::trip(20);
        let trip_id = trip.id;
        ledger.upsert_trip(trip);
        let booking = ledger
            .commit_booking(new_booking(trip_id, vec![8, 9], "GGGGGGGG"))
            .await
            .unwrap();

        let now = Utc::now();
        let cancelled = ledger
            .transition(BookingTransition::cancel(booking.id, Some("plans changed".into()), now))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(cancelled.cancellation_reason.as_deref(), Some("plans changed"));
        assert!(ledger.occupied_seats(trip_id).await.unwrap().is_empty());
        assert_eq!(ledger.find_trip(trip_id).await.unwrap().unwrap().booked_seats, 0);

        let again = ledger
            .transition(BookingTransition::cancel(booking.id, None, now))
            .await
            .unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn test_confirm_transition_keeps_seats() {
        let ledger = MemoryLedger::new();
        let trip = fixtures::trip(20);
        let trip_id = trip.id;
        ledger.upsert_trip(trip);
        let booking = ledger
            .commit_booking(new_booking(trip_id, vec![2], "JJJJJJJJ"))
            .await
            .unwrap();

        let confirmed = ledger
            .transition(BookingTransition {
                booking_id: booking.id,
                from: vec![BookingStatus::Pending],
                to: BookingStatus::Confirmed,
                payment_status: Some(PaymentStatus::Completed),
                reason: None,
                at: Utc::now(),
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);
        assert!(confirmed.cancelled_at.is_none());
        assert_eq!(ledger.occupied_seats(trip_id).await.unwrap(), vec![2]);
        assert_eq!(ledger.find_trip(trip_id).await.unwrap().unwrap().booked_seats, 1);
    }

    #[tokio::test]
    async fn test_stale_pending_scan() {
        let ledger = MemoryLedger::new();
        let trip = fixtures::trip(20);
        let trip_id = trip.id;
        ledger.upsert_trip(trip);
        let booking = ledger
            .commit_booking(new_booking(trip_id, vec![1], "HHHHHHHH"))
            .await
            .unwrap();

        let before = ledger
            .find_stale_pending(Utc::now() - Duration::minutes(15))
            .await
            .unwrap();
        assert!(before.is_empty());

        let after = ledger
            .find_stale_pending(Utc::now() + Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].id, booking.id);
    }
}
