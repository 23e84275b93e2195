//! Health check handler.

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use serde::Serialize;

use seatline_core::traits::CacheProvider;
use seatline_realtime::ConnectionCounts;

use crate::state::AppState;

/// Liveness report.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Seconds since startup.
    pub uptime_seconds: i64,
    /// Cache backend reachability.
    pub cache: String,
    /// Live sockets on this instance.
    pub connections: ConnectionCounts,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache_ok = match state.cache.health_check().await {
        Ok(ok) => ok,
        Err(e) => {
            tracing::warn!(error = %e, "Cache health check failed");
            false
        }
    };

    Json(HealthResponse {
        status: if cache_ok { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
        cache: if cache_ok { "connected" } else { "unreachable" }.to_string(),
        connections: state.hub.connection_counts(),
    })
}
