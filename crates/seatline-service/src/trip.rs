//! Trip status transitions.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use seatline_core::error::AppError;
use seatline_core::result::AppResult;
use seatline_core::types::{DriverId, TripId};
use seatline_database::store::{BookingStore, TripStore};
use seatline_entity::event::{DomainEvent, TripEvent};
use seatline_entity::trip::{Trip, TripStatus};

use crate::collaborator::{Collaborators, Notification, notify};

/// Drives the trip lifecycle.
///
/// SCHEDULED → BOARDING → IN_TRANSIT → ARRIVED → COMPLETED, with
/// CANCELLED reachable from every state before ARRIVED.
#[derive(Debug, Clone)]
pub struct TripService {
    /// Trip reads and status writes.
    trips: Arc<dyn TripStore>,
    /// Booking ledger, for completion.
    bookings: Arc<dyn BookingStore>,
    /// Notification and event collaborators.
    collaborators: Collaborators,
}

impl TripService {
    /// Creates a new trip service.
    pub fn new(
        trips: Arc<dyn TripStore>,
        bookings: Arc<dyn BookingStore>,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            trips,
            bookings,
            collaborators,
        }
    }

    /// Load a trip.
    pub async fn get_trip(&self, trip_id: TripId) -> AppResult<Trip> {
        self.trips
            .find_trip(trip_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Trip {trip_id} not found")))
    }

    /// Move a trip to `next`.
    ///
    /// When the trip has an assigned driver, only that driver may change it.
    pub async fn transition_status(
        &self,
        trip_id: TripId,
        next: TripStatus,
        driver_id: Option<DriverId>,
    ) -> AppResult<Trip> {
        let trip = self.get_trip(trip_id).await?;
        if trip.driver_id.is_some_and(|assigned| driver_id != Some(assigned)) {
            return Err(AppError::invalid_state(format!(
                "Trip {trip_id} is assigned to another driver"
            )));
        }
        if !trip.status.can_transition_to(next) {
            return Err(AppError::invalid_state(format!(
                "Trip {trip_id} cannot move from {} to {next}",
                trip.status
            )));
        }

        self.apply(&trip, next, driver_id, Utc::now())
            .await?
            .ok_or_else(|| {
                AppError::invalid_state(format!("Trip {trip_id} status changed concurrently"))
            })
    }

    /// Compare-and-set `trip.status → next` and announce it.
    ///
    /// Returns `None` when another writer changed the status first.
    pub(crate) async fn apply(
        &self,
        trip: &Trip,
        next: TripStatus,
        changed_by: Option<DriverId>,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Trip>> {
        let from = trip.status;
        if !self.trips.compare_and_set_status(trip.id, from, next).await? {
            return Ok(None);
        }

        let mut updated = trip.clone();
        updated.status = next;
        info!(
            trip_id = %trip.id,
            from = %from,
            to = %next,
            driver_id = ?changed_by,
            "Trip status changed"
        );

        if next == TripStatus::Completed {
            match self.bookings.complete_for_trip(trip.id, at).await {
                Ok(completed) => info!(trip_id = %trip.id, completed, "Bookings completed"),
                Err(e) => warn!(trip_id = %trip.id, error = %e, "Failed to complete bookings"),
            }
        }

        self.collaborators
            .events
            .publish(DomainEvent::Trip(TripEvent::StatusChanged {
                trip_id: trip.id,
                from,
                to: next,
                changed_by,
                changed_at: at,
            }))
            .await;
        notify(
            &self.collaborators.notifications,
            Notification::trip_status(&updated, at),
        );
        Ok(Some(updated))
    }
}
