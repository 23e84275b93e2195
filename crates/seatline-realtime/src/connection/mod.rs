//! Connection handles and the socket registry.

pub mod handle;
pub mod registry;

pub use handle::{ConnectionHandle, ConnectionId, ConnectionRole, ConnectionState};
pub use registry::{ConnectionCounts, DeliveryReport, SocketRegistry};
