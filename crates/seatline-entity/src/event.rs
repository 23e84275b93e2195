//! Domain events emitted by reservation and tracking operations.
//!
//! Events are handed to the service layer's publisher and consumed by the
//! broadcast hub, which turns them into outbound socket frames.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use seatline_core::types::{BookingId, DriverId, SeatNumber, TripId, UserId};

use crate::booking::{Booking, BookingStatus, PaymentStatus};
use crate::location::TripLocation;
use crate::trip::TripStatus;

/// Events scoped to a single trip. Fanned out to every trip subscriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TripEvent {
    /// A location fix was accepted.
    LocationUpdated {
        /// The stored fix.
        location: TripLocation,
    },
    /// The trip moved to a new status.
    StatusChanged {
        /// The trip.
        trip_id: TripId,
        /// Previous status.
        from: TripStatus,
        /// New status.
        to: TripStatus,
        /// Driver that triggered the change, if any.
        changed_by: Option<DriverId>,
        /// When the change was applied.
        changed_at: DateTime<Utc>,
    },
    /// The vehicle entered the destination geofence. Emitted once per trip.
    Arrived {
        /// The trip.
        trip_id: TripId,
        /// Distance to the destination at detection.
        distance_meters: f64,
        /// When arrival was detected.
        arrived_at: DateTime<Utc>,
    },
}

impl TripEvent {
    /// The trip the event belongs to.
    pub fn trip_id(&self) -> TripId {
        match self {
            Self::LocationUpdated { location } => location.trip_id,
            Self::StatusChanged { trip_id, .. } | Self::Arrived { trip_id, .. } => *trip_id,
        }
    }
}

/// Booking lifecycle events. Delivered to the owning user's socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingEvent {
    /// The booking.
    pub booking_id: BookingId,
    /// The owner.
    pub user_id: UserId,
    /// The booked trip.
    pub trip_id: TripId,
    /// Reference code.
    pub reference: String,
    /// Seats covered by the booking.
    pub seat_numbers: Vec<SeatNumber>,
    /// Ledger status after the change.
    pub status: BookingStatus,
    /// Payment status after the change.
    pub payment_status: PaymentStatus,
    /// When the change happened.
    pub occurred_at: DateTime<Utc>,
}

impl From<&Booking> for BookingEvent {
    fn from(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id,
            user_id: booking.user_id,
            trip_id: booking.trip_id,
            reference: booking.reference.clone(),
            seat_numbers: booking.seat_numbers.clone(),
            status: booking.status,
            payment_status: booking.payment_status,
            occurred_at: booking.updated_at,
        }
    }
}

/// Union of all events handed to the publisher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A trip-scoped event.
    Trip(TripEvent),
    /// A booking event.
    Booking(BookingEvent),
}
