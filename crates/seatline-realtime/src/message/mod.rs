//! WebSocket frame types.

pub mod types;

pub use types::{InboundFrame, OutboundFrame};
