//! # seatline-api
//!
//! WebSocket surface for Seatline built on Axum: passenger, driver, and user
//! sockets plus a health endpoint. Also assembles the full service graph
//! from configuration.

pub mod app;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{Runtime, assemble, assemble_with, build_app};
pub use state::AppState;
