//! Cancellation policy and the unpaid-booking expiry.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use seatline_core::config::BookingConfig;
use seatline_core::error::AppError;
use seatline_core::result::AppResult;
use seatline_core::types::{BookingId, UserId};
use seatline_database::store::{BookingStore, BookingTransition, TripStore};
use seatline_entity::booking::{Booking, BookingStatus, PaymentStatus};
use seatline_entity::event::{BookingEvent, DomainEvent};

use crate::collaborator::{Collaborators, Notification, NotificationKind, fire_and_forget, notify};

/// Reason recorded on bookings cancelled by the pending sweep.
pub const PAYMENT_TIMEOUT_REASON: &str = "payment not received";

/// Applies the cancellation window and releases seats.
#[derive(Debug, Clone)]
pub struct CancellationService {
    /// Trip reads for departure times.
    trips: Arc<dyn TripStore>,
    /// Booking ledger.
    bookings: Arc<dyn BookingStore>,
    /// Payment, notification, and event collaborators.
    collaborators: Collaborators,
    /// Window and grace settings.
    config: BookingConfig,
}

impl CancellationService {
    /// Creates a new cancellation service.
    pub fn new(
        trips: Arc<dyn TripStore>,
        bookings: Arc<dyn BookingStore>,
        collaborators: Collaborators,
        config: BookingConfig,
    ) -> Self {
        Self {
            trips,
            bookings,
            collaborators,
            config,
        }
    }

    fn window(&self) -> Duration {
        Duration::minutes(self.config.cancellation_window_minutes)
    }

    /// Cancel the user's booking while `now < departure - window`.
    ///
    /// A captured payment is refunded in the background.
    pub async fn cancel_booking(
        &self,
        booking_id: BookingId,
        user_id: UserId,
        reason: Option<String>,
    ) -> AppResult<Booking> {
        self.cancel_booking_at(booking_id, user_id, reason, Utc::now())
            .await
    }

    /// [`CancellationService::cancel_booking`] evaluated at `now`.
    pub async fn cancel_booking_at(
        &self,
        booking_id: BookingId,
        user_id: UserId,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<Booking> {
        let booking = self
            .bookings
            .find_booking(booking_id)
            .await?
            .filter(|b| b.is_owned_by(&user_id))
            .ok_or_else(|| AppError::not_found(format!("Booking {booking_id} not found")))?;

        if booking.status.is_terminal() {
            return Err(AppError::invalid_state(format!(
                "Booking {booking_id} is already {}",
                booking.status
            )));
        }

        let trip = self
            .trips
            .find_trip(booking.trip_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Trip {} not found", booking.trip_id)))?;
        let deadline = trip.cancellation_deadline(self.window());
        if now >= deadline {
            return Err(AppError::not_available(format!(
                "Cancellation closed at {deadline}"
            )));
        }

        let cancelled = self
            .bookings
            .transition(BookingTransition::cancel(booking_id, reason.clone(), now))
            .await?
            .ok_or_else(|| {
                AppError::invalid_state(format!("Booking {booking_id} changed while cancelling"))
            })?;

        info!(
            booking_id = %booking_id,
            user_id = %user_id,
            trip_id = %cancelled.trip_id,
            seats = ?cancelled.seat_numbers,
            "Booking cancelled"
        );

        if cancelled.payment_status == PaymentStatus::Completed {
            let payments = Arc::clone(&self.collaborators.payments);
            let for_refund = cancelled.clone();
            fire_and_forget("request_refund", async move {
                payments.request_refund(&for_refund, reason.as_deref()).await
            });
        }
        self.announce(&cancelled).await;
        Ok(cancelled)
    }

    /// Cancel PENDING bookings still unpaid after the grace window.
    /// Returns how many were expired.
    pub async fn expire_unpaid_pending(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let cutoff = now - Duration::minutes(self.config.pending_grace_minutes);
        let stale = self.bookings.find_stale_pending(cutoff).await?;
        let mut expired = 0;

        for booking in stale {
            let transition = BookingTransition {
                booking_id: booking.id,
                from: vec![BookingStatus::Pending],
                to: BookingStatus::Cancelled,
                payment_status: None,
                reason: Some(PAYMENT_TIMEOUT_REASON.to_string()),
                at: now,
            };
            match self.bookings.transition(transition).await {
                Ok(Some(cancelled)) => {
                    expired += 1;
                    self.announce(&cancelled).await;
                }
                Ok(None) => {}
                Err(e) => warn!(booking_id = %booking.id, error = %e, "Failed to expire booking"),
            }
        }

        if expired > 0 {
            info!(expired, cutoff = %cutoff, "Expired unpaid bookings");
        }
        Ok(expired)
    }

    async fn announce(&self, booking: &Booking) {
        notify(
            &self.collaborators.notifications,
            Notification::for_booking(NotificationKind::BookingCancelled, booking, None),
        );
        self.collaborators
            .events
            .publish(DomainEvent::Booking(BookingEvent::from(booking)))
            .await;
    }
}
