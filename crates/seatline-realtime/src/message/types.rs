//! Inbound and outbound WebSocket frame definitions.
//!
//! Every frame is a `{"type": ..., "data": ...}` JSON object; frames without
//! a payload carry only `type`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use seatline_core::error::AppError;
use seatline_core::types::{BookingId, TripId};
use seatline_entity::booking::{BookingStatus, PaymentStatus};
use seatline_entity::location::TripLocation;
use seatline_entity::trip::TripStatus;
use seatline_service::LocationUpdate;

/// Frames sent by clients. Only drivers may send updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum InboundFrame {
    /// A GPS fix for the driver's trip.
    LocationUpdate(LocationUpdate),
    /// A requested trip status change.
    StatusUpdate {
        /// Trip to transition.
        trip_id: TripId,
        /// Target status.
        status: TripStatus,
    },
    /// Keepalive.
    Ping,
}

impl InboundFrame {
    /// Frame name as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LocationUpdate(_) => "location_update",
            Self::StatusUpdate { .. } => "status_update",
            Self::Ping => "ping",
        }
    }
}

/// Frames sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// A new location for a followed trip.
    LocationUpdate(TripLocation),
    /// A followed trip changed status.
    StatusUpdate {
        /// The trip.
        trip_id: TripId,
        /// New status.
        status: TripStatus,
        /// Status before the change.
        previous: TripStatus,
        /// When the change was applied.
        changed_at: DateTime<Utc>,
    },
    /// One of the user's bookings changed.
    BookingUpdate {
        /// The booking.
        booking_id: BookingId,
        /// Reference code.
        reference: String,
        /// Ledger status.
        status: BookingStatus,
        /// Payment status.
        payment_status: PaymentStatus,
    },
    /// A rejected inbound frame.
    Error {
        /// Machine-readable code.
        code: String,
        /// Human-readable reason.
        message: String,
    },
    /// Reply to `ping`.
    Pong,
    /// A driver update was accepted.
    Ack {
        /// The updated trip.
        trip_id: TripId,
    },
}

impl OutboundFrame {
    /// An error frame with an explicit code.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    /// An error frame for a failed operation.
    pub fn from_error(err: &AppError) -> Self {
        Self::error(err.kind.as_code(), err.message.clone())
    }
}
