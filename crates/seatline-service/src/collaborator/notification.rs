//! Notification port for booking and trip lifecycle messages.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use seatline_core::result::AppResult;
use seatline_core::types::{SeatNumber, TripId, UserId};
use seatline_entity::booking::Booking;
use seatline_entity::trip::Trip;

/// Lifecycle moments that produce a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A booking was created and awaits payment.
    BookingCreated,
    /// Payment completed and the booking is confirmed.
    BookingConfirmed,
    /// The booking was cancelled.
    BookingCancelled,
    /// The trip moved to a new status.
    TripStatusChanged,
}

impl NotificationKind {
    /// Return the kind as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BookingCreated => "booking_created",
            Self::BookingConfirmed => "booking_confirmed",
            Self::BookingCancelled => "booking_cancelled",
            Self::TripStatusChanged => "trip_status_changed",
        }
    }
}

/// Payload handed to the notification collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// What happened.
    pub kind: NotificationKind,
    /// Recipient, when the message targets one user.
    pub user_id: Option<UserId>,
    /// The trip concerned.
    pub trip_id: TripId,
    /// Booking reference, for booking messages.
    pub reference: Option<String>,
    /// Route display name, when known.
    pub route_name: Option<String>,
    /// Seats concerned.
    pub seats: Vec<SeatNumber>,
    /// Status label for trip messages.
    pub status: Option<String>,
    /// When it happened.
    pub occurred_at: DateTime<Utc>,
}

impl Notification {
    /// A booking-scoped notification.
    pub fn for_booking(kind: NotificationKind, booking: &Booking, trip: Option<&Trip>) -> Self {
        Self {
            kind,
            user_id: Some(booking.user_id),
            trip_id: booking.trip_id,
            reference: Some(booking.reference.clone()),
            route_name: trip.map(|t| t.route_name.clone()),
            seats: booking.seat_numbers.clone(),
            status: Some(booking.status.to_string()),
            occurred_at: booking.updated_at,
        }
    }

    /// A trip status notification.
    pub fn trip_status(trip: &Trip, occurred_at: DateTime<Utc>) -> Self {
        Self {
            kind: NotificationKind::TripStatusChanged,
            user_id: None,
            trip_id: trip.id,
            reference: None,
            route_name: Some(trip.route_name.clone()),
            seats: Vec::new(),
            status: Some(trip.status.to_string()),
            occurred_at,
        }
    }
}

/// Delivery of user-facing notifications (email, SMS, push).
///
/// Calls are fire-and-forget: a failure is logged and never fails the
/// operation that produced the notification.
#[async_trait]
pub trait NotificationSink: Send + Sync + std::fmt::Debug + 'static {
    /// Deliver one notification.
    async fn notify(&self, notification: Notification) -> AppResult<()>;
}

/// Sink that writes notifications to the log.
#[derive(Debug, Clone, Default)]
pub struct LoggingNotificationSink;

#[async_trait]
impl NotificationSink for LoggingNotificationSink {
    async fn notify(&self, notification: Notification) -> AppResult<()> {
        info!(
            kind = notification.kind.as_str(),
            trip_id = %notification.trip_id,
            user_id = ?notification.user_id,
            reference = ?notification.reference,
            "Notification dispatched"
        );
        Ok(())
    }
}
