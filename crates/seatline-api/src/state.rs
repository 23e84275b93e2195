//! Application state shared across all handlers.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use seatline_cache::CacheManager;
use seatline_core::config::AppConfig;
use seatline_realtime::{BroadcastHub, DriverIngress};
use seatline_service::Services;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// Cache manager (Redis or in-memory)
    pub cache: CacheManager,

    // ── Services ─────────────────────────────────────────────
    /// Reservation and tracking services
    pub services: Services,

    // ── Real-time ────────────────────────────────────────────
    /// Broadcast hub
    pub hub: Arc<BroadcastHub>,
    /// Inbound frame router
    pub ingress: Arc<DriverIngress>,

    /// Process start, for uptime reporting
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Creates the state, wiring the ingress router to the hub and services.
    pub fn new(
        config: Arc<AppConfig>,
        cache: CacheManager,
        services: Services,
        hub: Arc<BroadcastHub>,
    ) -> Self {
        let ingress = Arc::new(DriverIngress::new(
            hub.clone(),
            services.tracking.clone(),
            services.trips.clone(),
        ));
        Self {
            config,
            cache,
            services,
            hub,
            ingress,
            started_at: Utc::now(),
        }
    }
}
