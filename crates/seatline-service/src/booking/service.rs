//! Booking creation, payment results, and booking reads.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use seatline_core::config::BookingConfig;
use seatline_core::error::{AppError, ErrorKind};
use seatline_core::result::AppResult;
use seatline_core::types::{BookingId, SeatNumber, TripId, UserId};
use seatline_database::store::{BookingStore, BookingTransition};
use seatline_entity::booking::{Booking, BookingStatus, NewBooking, PaymentStatus};
use seatline_entity::event::{BookingEvent, DomainEvent};

use super::pricing::PricingStrategy;
use super::reference::ReferenceGenerator;
use crate::availability::AvailabilityService;
use crate::collaborator::{Collaborators, Notification, NotificationKind, fire_and_forget, notify};
use crate::hold::HoldService;
use crate::seat_map::SeatMapResolver;

/// Turns seat selections into ledger bookings.
#[derive(Debug, Clone)]
pub struct BookingService {
    /// Booking ledger.
    bookings: Arc<dyn BookingStore>,
    /// Availability reads.
    availability: Arc<AvailabilityService>,
    /// Hold cleanup after commit.
    holds: Arc<HoldService>,
    /// Seat selection rules.
    seat_map: SeatMapResolver,
    /// Reference codes.
    references: ReferenceGenerator,
    /// Price calculation.
    pricing: Arc<dyn PricingStrategy>,
    /// Payment, notification, and event collaborators.
    collaborators: Collaborators,
    /// Booking limits.
    config: BookingConfig,
}

impl BookingService {
    /// Creates a new booking service.
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        availability: Arc<AvailabilityService>,
        holds: Arc<HoldService>,
        pricing: Arc<dyn PricingStrategy>,
        collaborators: Collaborators,
        config: BookingConfig,
    ) -> Self {
        Self {
            bookings,
            availability,
            holds,
            seat_map: SeatMapResolver,
            references: ReferenceGenerator,
            pricing,
            collaborators,
            config,
        }
    }

    /// Book seats on a trip. The booking starts PENDING with payment PENDING.
    ///
    /// Occupancy is checked here and again inside the ledger write, so a
    /// concurrent booking of the same seat fails with `SeatNotAvailable`.
    /// The caller's own holds never block it; other users' live holds do.
    pub async fn create_booking(
        &self,
        user_id: UserId,
        trip_id: TripId,
        seats: &[SeatNumber],
    ) -> AppResult<Booking> {
        let trip = self.availability.load_trip(trip_id).await?;
        if !trip.status.is_bookable() {
            return Err(AppError::not_bookable(format!(
                "Trip {trip_id} is {}",
                trip.status
            )));
        }
        let requested = self
            .seat_map
            .normalize(&trip, seats, self.config.max_seats_per_booking)?;

        let snapshot = self.availability.snapshot(&trip, Utc::now()).await?;
        let taken = requested.intersection(&snapshot.occupied);
        if !taken.is_empty() {
            info!(trip_id = %trip_id, seats = ?taken.to_vec(), "Booking rejected: seats occupied");
            return Err(AppError::seat_not_available(format!(
                "Seats {:?} are already booked",
                taken.to_vec()
            )));
        }
        let held = requested.intersection(&snapshot.held_by_others(user_id));
        if !held.is_empty() {
            info!(trip_id = %trip_id, seats = ?held.to_vec(), "Booking rejected: seats held");
            return Err(AppError::seat_not_available(format!(
                "Seats {:?} are held by another user",
                held.to_vec()
            )));
        }

        let seat_numbers = requested.to_vec();
        let total_amount_cents = self.pricing.total_amount(&trip, seat_numbers.len());
        let booking = self
            .commit_with_fresh_reference(user_id, trip_id, &seat_numbers, total_amount_cents)
            .await?;

        info!(
            booking_id = %booking.id,
            trip_id = %trip_id,
            user_id = %user_id,
            reference = %booking.reference,
            seats = ?booking.seat_numbers,
            "Booking created"
        );

        match self.holds.release_covering(trip_id, user_id, &requested).await {
            Ok(0) => {}
            Ok(released) => info!(booking_id = %booking.id, released, "Holds promoted to booking"),
            Err(e) => warn!(
                booking_id = %booking.id,
                error = %e,
                "Failed to release holds after booking"
            ),
        }

        let payments = Arc::clone(&self.collaborators.payments);
        let for_payment = booking.clone();
        fire_and_forget("create_payment_intent", async move {
            payments.create_payment_intent(&for_payment).await
        });
        notify(
            &self.collaborators.notifications,
            Notification::for_booking(NotificationKind::BookingCreated, &booking, Some(&trip)),
        );

        Ok(booking)
    }

    async fn commit_with_fresh_reference(
        &self,
        user_id: UserId,
        trip_id: TripId,
        seat_numbers: &[SeatNumber],
        total_amount_cents: i64,
    ) -> AppResult<Booking> {
        for attempt in 1..=self.config.reference_attempts {
            let reference = self.references.generate();
            if self.bookings.reference_exists(&reference).await? {
                continue;
            }
            let new_booking = NewBooking {
                id: BookingId::new(),
                trip_id,
                user_id,
                seat_numbers: seat_numbers.to_vec(),
                total_amount_cents,
                reference,
            };
            match self.bookings.commit_booking(new_booking).await {
                Ok(booking) => return Ok(booking),
                Err(e) if e.is(ErrorKind::Conflict) => {
                    warn!(trip_id = %trip_id, attempt, "Booking reference collided, retrying");
                }
                Err(e) if e.is(ErrorKind::SeatNotAvailable) => {
                    info!(trip_id = %trip_id, seats = ?seat_numbers, "Seats taken at commit");
                    return Err(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(AppError::conflict(format!(
            "Could not allocate a unique booking reference in {} attempts",
            self.config.reference_attempts
        )))
    }

    /// Apply a payment result reported by the payment collaborator.
    ///
    /// - `COMPLETED` confirms a PENDING booking
    /// - `FAILED` cancels a PENDING booking and frees its seats
    /// - `REFUNDED` records the payment status of a CANCELLED or COMPLETED
    ///   booking
    ///
    /// Repeating the current payment status is a no-op. Any other change is
    /// `InvalidState`.
    pub async fn update_booking_payment_status(
        &self,
        booking_id: BookingId,
        status: PaymentStatus,
    ) -> AppResult<Booking> {
        let booking = self.find(booking_id).await?;
        if booking.payment_status == status {
            return Ok(booking);
        }
        let now = Utc::now();

        if status == PaymentStatus::Refunded {
            if !booking.status.is_terminal() {
                return Err(AppError::invalid_state(format!(
                    "Booking {booking_id} is {} and cannot be refunded",
                    booking.status
                )));
            }
            let updated = self
                .bookings
                .set_payment_status(booking_id, status, now)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Booking {booking_id} not found")))?;
            info!(booking_id = %booking_id, "Payment refunded");
            return Ok(updated);
        }

        if booking.status != BookingStatus::Pending {
            return Err(AppError::invalid_state(format!(
                "Booking {booking_id} is {} and cannot take payment status {}",
                booking.status,
                status.as_str()
            )));
        }

        let (to, kind, reason) = match status {
            PaymentStatus::Completed => (
                BookingStatus::Confirmed,
                NotificationKind::BookingConfirmed,
                None,
            ),
            PaymentStatus::Failed => (
                BookingStatus::Cancelled,
                NotificationKind::BookingCancelled,
                Some("payment failed".to_string()),
            ),
            PaymentStatus::Pending | PaymentStatus::Refunded => {
                let updated = self
                    .bookings
                    .set_payment_status(booking_id, status, now)
                    .await?
                    .ok_or_else(|| {
                        AppError::not_found(format!("Booking {booking_id} not found"))
                    })?;
                return Ok(updated);
            }
        };

        let transition = BookingTransition {
            booking_id,
            from: vec![BookingStatus::Pending],
            to,
            payment_status: Some(status),
            reason,
            at: now,
        };
        let updated = self.bookings.transition(transition).await?.ok_or_else(|| {
            AppError::invalid_state(format!("Booking {booking_id} changed while applying payment"))
        })?;

        info!(
            booking_id = %booking_id,
            status = %updated.status,
            payment_status = updated.payment_status.as_str(),
            "Payment result applied"
        );
        notify(
            &self.collaborators.notifications,
            Notification::for_booking(kind, &updated, None),
        );
        self.collaborators
            .events
            .publish(DomainEvent::Booking(BookingEvent::from(&updated)))
            .await;
        Ok(updated)
    }

    /// A booking owned by `user_id`. Foreign bookings are `NotFound`.
    pub async fn get_booking(&self, booking_id: BookingId, user_id: UserId) -> AppResult<Booking> {
        let booking = self.find(booking_id).await?;
        if !booking.is_owned_by(&user_id) {
            return Err(AppError::not_found(format!("Booking {booking_id} not found")));
        }
        Ok(booking)
    }

    /// The user's bookings, newest first.
    pub async fn list_user_bookings(&self, user_id: UserId) -> AppResult<Vec<Booking>> {
        self.bookings.find_by_user(user_id).await
    }

    async fn find(&self, booking_id: BookingId) -> AppResult<Booking> {
        self.bookings
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Booking {booking_id} not found")))
    }
}
