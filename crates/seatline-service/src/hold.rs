//! Temporary seat holds.
//!
//! A hold is an optimistic courtesy and is not linearizable with the ledger.
//! Booking re-checks occupancy at commit whatever happened here.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use seatline_cache::{HoldInsert, HoldStore};
use seatline_core::config::BookingConfig;
use seatline_core::error::AppError;
use seatline_core::result::AppResult;
use seatline_core::types::{HoldId, SeatNumber, SeatSet, TripId, UserId};
use seatline_entity::hold::TemporaryHold;

use crate::availability::AvailabilityService;
use crate::seat_map::SeatMapResolver;

/// What the caller gets back for a successful hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldReceipt {
    /// The new hold.
    pub hold_id: HoldId,
    /// The trip.
    pub trip_id: TripId,
    /// Held seats, ascending.
    pub seats: Vec<SeatNumber>,
    /// When the hold lapses.
    pub expires_at: DateTime<Utc>,
}

/// Places, lists, and releases temporary holds.
#[derive(Debug, Clone)]
pub struct HoldService {
    /// Hold storage.
    holds: Arc<dyn HoldStore>,
    /// Occupancy and trip reads.
    availability: Arc<AvailabilityService>,
    /// Seat selection rules.
    seat_map: SeatMapResolver,
    /// TTL and size limits.
    config: BookingConfig,
}

impl HoldService {
    /// Creates a new hold service.
    pub fn new(
        holds: Arc<dyn HoldStore>,
        availability: Arc<AvailabilityService>,
        config: BookingConfig,
    ) -> Self {
        Self {
            holds,
            availability,
            seat_map: SeatMapResolver,
            config,
        }
    }

    /// Hold 1 to `max_seats_per_hold` distinct seats on a bookable trip.
    ///
    /// `ttl` defaults to `hold_ttl_seconds` and is capped at
    /// `max_hold_ttl_seconds`.
    pub async fn create_hold(
        &self,
        trip_id: TripId,
        user_id: UserId,
        seats: &[SeatNumber],
        ttl: Option<Duration>,
    ) -> AppResult<HoldReceipt> {
        let trip = self.availability.load_trip(trip_id).await?;
        if !trip.status.is_bookable() {
            return Err(AppError::not_bookable(format!(
                "Trip {trip_id} is {}",
                trip.status
            )));
        }
        let requested =
            self.seat_map
                .validate_unique(&trip, seats, self.config.max_seats_per_hold)?;

        let now = Utc::now();
        let snapshot = self.availability.snapshot(&trip, now).await?;
        let occupied = requested.intersection(&snapshot.occupied);
        if !occupied.is_empty() {
            return Err(AppError::seat_not_available(format!(
                "Seats {:?} are already booked",
                occupied.to_vec()
            )));
        }

        let ttl = self.effective_ttl(ttl);
        let hold = TemporaryHold::new(trip_id, user_id, requested.to_vec(), now, ttl);
        match self.holds.try_insert(&hold, now).await? {
            HoldInsert::Inserted => {
                info!(
                    trip_id = %trip_id,
                    user_id = %user_id,
                    hold_id = %hold.id,
                    seats = ?hold.seats,
                    expires_at = %hold.expires_at,
                    "Seats held"
                );
                Ok(HoldReceipt {
                    hold_id: hold.id,
                    trip_id,
                    seats: hold.seats,
                    expires_at: hold.expires_at,
                })
            }
            HoldInsert::Conflict(taken) => {
                debug!(trip_id = %trip_id, seats = ?taken, "Hold rejected by live hold");
                Err(AppError::seat_not_available(format!(
                    "Seats {taken:?} are held by another request"
                )))
            }
        }
    }

    /// Release a hold owned by `user_id`.
    ///
    /// A missing, expired, or foreign hold is `NotFound`.
    pub async fn release_hold(
        &self,
        trip_id: TripId,
        hold_id: HoldId,
        user_id: UserId,
    ) -> AppResult<()> {
        match self.holds.release(trip_id, hold_id, user_id, Utc::now()).await? {
            Some(hold) => {
                info!(trip_id = %trip_id, hold_id = %hold_id, seats = ?hold.seats, "Hold released");
                Ok(())
            }
            None => Err(AppError::not_found(format!("Hold {hold_id} not found"))),
        }
    }

    /// The caller's live holds on a trip.
    pub async fn list_user_holds(
        &self,
        trip_id: TripId,
        user_id: UserId,
    ) -> AppResult<Vec<TemporaryHold>> {
        let holds = self.holds.active_holds(trip_id, Utc::now()).await?;
        Ok(holds.into_iter().filter(|h| h.user_id == user_id).collect())
    }

    /// Drop the user's holds that cover any of `seats`. Returns how many.
    pub async fn release_covering(
        &self,
        trip_id: TripId,
        user_id: UserId,
        seats: &SeatSet,
    ) -> AppResult<usize> {
        let now = Utc::now();
        let mut released = 0;
        for hold in self.holds.active_holds(trip_id, now).await? {
            if hold.user_id == user_id
                && hold.seats.iter().any(|s| seats.contains(*s))
                && self.holds.release(trip_id, hold.id, user_id, now).await?.is_some()
            {
                released += 1;
            }
        }
        Ok(released)
    }

    /// Physically delete lapsed holds. Returns the count.
    pub async fn purge_expired(&self) -> AppResult<u64> {
        self.holds.purge_expired(Utc::now()).await
    }

    fn effective_ttl(&self, requested: Option<Duration>) -> chrono::Duration {
        let max = self.config.max_hold_ttl_seconds;
        let secs = requested
            .map(|d| d.as_secs().max(1))
            .unwrap_or(self.config.hold_ttl_seconds)
            .min(max);
        chrono::Duration::seconds(secs as i64)
    }
}

#[cfg(test)]
mod tests {
    use seatline_core::ErrorKind;
    use seatline_entity::trip::TripStatus;

    use super::*;
    use crate::test_support::Harness;

    #[tokio::test]
    async fn test_hold_defaults_and_caps_ttl() {
        let h = Harness::new();
        let trip = h.add_trip(10);
        let user = UserId::new();

        let receipt = h.holds.create_hold(trip.id, user, &[2, 1], None).await.unwrap();
        assert_eq!(receipt.seats, vec![1, 2]);
        let ttl = receipt.expires_at - Utc::now();
        assert!(ttl <= chrono::Duration::seconds(600) && ttl > chrono::Duration::seconds(590));

        let capped = h
            .holds
            .create_hold(trip.id, user, &[3], Some(Duration::from_secs(7200)))
            .await
            .unwrap();
        assert!(capped.expires_at - Utc::now() <= chrono::Duration::seconds(900));
    }

    #[tokio::test]
    async fn test_hold_rejects_booked_and_held_seats() {
        let h = Harness::new();
        let trip = h.add_trip(10);
        h.seed_booking(trip.id, &[5]).await;
        h.holds.create_hold(trip.id, UserId::new(), &[6], None).await.unwrap();

        let booked = h.holds.create_hold(trip.id, UserId::new(), &[5], None).await.unwrap_err();
        assert_eq!(booked.kind, ErrorKind::SeatNotAvailable);
        let held = h.holds.create_hold(trip.id, UserId::new(), &[6, 7], None).await.unwrap_err();
        assert_eq!(held.kind, ErrorKind::SeatNotAvailable);
    }

    #[tokio::test]
    async fn test_hold_requires_bookable_trip() {
        let h = Harness::new();
        let mut trip = h.add_trip(10);
        trip.status = TripStatus::InTransit;
        h.ledger.upsert_trip(trip.clone());

        let err = h.holds.create_hold(trip.id, UserId::new(), &[1], None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotBookable);
        let err = h.holds.create_hold(TripId::new(), UserId::new(), &[1], None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_release_is_owner_only() {
        let h = Harness::new();
        let trip = h.add_trip(10);
        let owner = UserId::new();
        let receipt = h.holds.create_hold(trip.id, owner, &[4], None).await.unwrap();

        let err = h
            .holds
            .release_hold(trip.id, receipt.hold_id, UserId::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(h.holds.list_user_holds(trip.id, owner).await.unwrap().len(), 1);

        h.holds.release_hold(trip.id, receipt.hold_id, owner).await.unwrap();
        assert!(h.holds.list_user_holds(trip.id, owner).await.unwrap().is_empty());
    }
}
