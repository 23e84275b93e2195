//! Route definitions.
//!
//! The router receives `AppState` and passes it to all handlers via Axum's
//! `State` extractor.

use axum::{Router, routing::get};

use crate::handlers;
use crate::state::AppState;

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(socket_routes())
        .merge(health_routes())
        .with_state(state)
}

/// Passenger, driver, and user sockets
fn socket_routes() -> Router<AppState> {
    Router::new()
        .route("/ws/trips/{trip_id}", get(handlers::ws::trip_socket))
        .route("/ws/drivers/{driver_id}", get(handlers::ws::driver_socket))
        .route("/ws/users/{user_id}", get(handlers::ws::user_socket))
}

/// Liveness
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
