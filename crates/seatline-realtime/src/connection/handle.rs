//! Individual WebSocket connection handle.

use std::sync::atomic::{AtomicU8, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use seatline_core::types::{DriverId, TripId, UserId};

/// Unique connection identifier.
pub type ConnectionId = Uuid;

/// Lifecycle of a connection: CONNECTING → OPEN → CLOSED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    /// Registered, upgrade not finished.
    Connecting,
    /// Accepting frames.
    Open,
    /// Removed; nothing more is sent.
    Closed,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::Open,
            _ => Self::Closed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Connecting => 0,
            Self::Open => 1,
            Self::Closed => 2,
        }
    }
}

/// Who is on the other end of the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConnectionRole {
    /// A passenger following one trip, optionally identified.
    Passenger {
        /// The followed trip.
        trip_id: TripId,
        /// The passenger, when known.
        user_id: Option<UserId>,
    },
    /// A driver streaming locations and status changes.
    Driver {
        /// The driver.
        driver_id: DriverId,
    },
    /// A user receiving booking updates.
    User {
        /// The user.
        user_id: UserId,
    },
}

/// A handle to a single WebSocket connection.
///
/// Holds the bounded sender for pushing serialized frames to the socket
/// writer. Sends never wait: a full buffer or a dropped receiver is a
/// failed send and closes the handle.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID.
    pub id: ConnectionId,
    /// Role and subscription target.
    pub role: ConnectionRole,
    /// When the connection was registered.
    pub connected_at: DateTime<Utc>,
    /// Sender for outbound frames.
    sender: mpsc::Sender<String>,
    /// Current lifecycle state.
    state: AtomicU8,
    /// Cancelled when the connection closes.
    closed: CancellationToken,
}

impl ConnectionHandle {
    /// Create a handle in the CONNECTING state.
    pub fn new(role: ConnectionRole, sender: mpsc::Sender<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            connected_at: Utc::now(),
            sender,
            state: AtomicU8::new(ConnectionState::Connecting.as_u8()),
            closed: CancellationToken::new(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Move CONNECTING → OPEN. A closed handle stays closed.
    pub fn open(&self) -> bool {
        self.state
            .compare_exchange(
                ConnectionState::Connecting.as_u8(),
                ConnectionState::Open.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// Whether frames can still be delivered.
    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Move to CLOSED and wake anything waiting on [`ConnectionHandle::closed`].
    pub fn close(&self) {
        self.state
            .store(ConnectionState::Closed.as_u8(), Ordering::SeqCst);
        self.closed.cancel();
    }

    /// Resolves once the connection is closed.
    pub async fn closed(&self) {
        self.closed.cancelled().await
    }

    /// Queue a frame without waiting. Returns `false` on failure, after
    /// which the handle is closed.
    pub fn send(&self, frame: &str) -> bool {
        if !self.is_open() {
            return false;
        }
        match self.sender.try_send(frame.to_string()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!(conn_id = %self.id, "Send buffer full, closing connection");
                self.close();
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.close();
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passenger() -> ConnectionRole {
        ConnectionRole::Passenger {
            trip_id: TripId::new(),
            user_id: None,
        }
    }

    #[test]
    fn test_lifecycle() {
        let (tx, _rx) = mpsc::channel(4);
        let handle = ConnectionHandle::new(passenger(), tx);
        assert_eq!(handle.state(), ConnectionState::Connecting);
        assert!(!handle.send("early"));
        assert!(handle.open());
        assert!(handle.send("hello"));
        handle.close();
        assert!(!handle.open());
        assert_eq!(handle.state(), ConnectionState::Closed);
    }

    #[test]
    fn test_full_buffer_closes() {
        let (tx, _rx) = mpsc::channel(1);
        let handle = ConnectionHandle::new(passenger(), tx);
        handle.open();
        assert!(handle.send("one"));
        assert!(!handle.send("two"));
        assert_eq!(handle.state(), ConnectionState::Closed);
    }

    #[test]
    fn test_dropped_receiver_closes() {
        let (tx, rx) = mpsc::channel(4);
        let handle = ConnectionHandle::new(passenger(), tx);
        handle.open();
        drop(rx);
        assert!(!handle.send("lost"));
        assert!(!handle.is_open());
    }
}
