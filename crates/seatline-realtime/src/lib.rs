//! # seatline-realtime
//!
//! WebSocket broadcast hub for Seatline. Passenger sockets subscribe to a
//! trip, drivers stream locations and status changes, and users receive
//! updates about their bookings.
//!
//! The hub fans frames out to local sockets first and then hands them to a
//! [`transport::BroadcastTransport`] so peer instances can relay them to
//! their own sockets.

pub mod connection;
pub mod hub;
pub mod ingress;
pub mod message;
pub mod transport;

pub use connection::{ConnectionCounts, ConnectionHandle, ConnectionRole, DeliveryReport};
pub use hub::BroadcastHub;
pub use ingress::DriverIngress;
pub use message::{InboundFrame, OutboundFrame};
pub use transport::{BroadcastTransport, Envelope, LocalTransport, Target};
