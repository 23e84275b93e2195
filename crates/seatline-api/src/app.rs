//! Application builder: wires stores, cache, hub, services, and the
//! scheduler from configuration, and layers the router.

use std::sync::Arc;

use axum::Router;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use seatline_cache::CacheManager;
use seatline_core::config::AppConfig;
use seatline_core::error::AppError;
use seatline_core::result::AppResult;
use seatline_database::repositories::{BookingRepository, LocationRepository, TripRepository};
use seatline_database::{DatabasePool, MemoryLedger};
use seatline_realtime::BroadcastHub;
use seatline_realtime::transport;
use seatline_service::{Collaborators, Services, Stores};
use seatline_worker::CronScheduler;

use crate::middleware::cors::build_cors_layer;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and layers.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);
    build_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Everything a running instance owns besides the listener.
#[derive(Debug)]
pub struct Runtime {
    /// Shared handler state.
    pub state: AppState,
    /// Sweep scheduler, when `worker.enabled`.
    pub scheduler: Option<CronScheduler>,
    /// Relay task of a multi-instance transport.
    pub relay: Option<JoinHandle<()>>,
    /// Database pool, when running on PostgreSQL.
    pub database: Option<DatabasePool>,
}

impl Runtime {
    /// Start background work: the sweep scheduler.
    pub async fn start(&self) -> AppResult<()> {
        if let Some(scheduler) = &self.scheduler {
            scheduler.start().await?;
        }
        Ok(())
    }

    /// Stop the scheduler, close every socket, and release the pool.
    pub async fn shutdown(self) {
        if let Some(scheduler) = &self.scheduler {
            if let Err(e) = scheduler.shutdown().await {
                tracing::warn!(error = %e, "Scheduler shutdown failed");
            }
        }

        self.state.hub.shutdown();
        if let Some(relay) = self.relay {
            if let Err(e) = relay.await {
                tracing::warn!(error = %e, "Relay task ended abnormally");
            }
        }

        if let Some(database) = &self.database {
            database.close().await;
        }
        tracing::info!("Runtime stopped");
    }
}

/// Build the runtime on the stores selected by `database.provider`.
pub async fn assemble(config: AppConfig) -> AppResult<Runtime> {
    // ── Step 1: Stores ───────────────────────────────────────────
    let (stores, database) = open_stores(&config).await?;
    let mut runtime = assemble_with(config, stores).await?;
    runtime.database = database;
    Ok(runtime)
}

/// Build the runtime on the given stores.
pub async fn assemble_with(config: AppConfig, stores: Stores) -> AppResult<Runtime> {
    let config = Arc::new(config);

    // ── Step 2: Cache and hold store ─────────────────────────────
    tracing::info!(provider = %config.cache.provider, "Initializing cache");
    let cache = CacheManager::new(&config.cache).await?;

    // ── Step 3: Broadcast hub ────────────────────────────────────
    tracing::info!(transport = %config.realtime.transport, "Initializing broadcast hub");
    let transport = transport::from_config(&config.realtime).await?;
    let hub = Arc::new(BroadcastHub::new(transport, &config.realtime));
    let relay = hub.start_relay().await?;

    // ── Step 4: Services ─────────────────────────────────────────
    let services = Services::build(
        stores,
        cache.clone(),
        Collaborators::with_publisher(hub.clone()),
        &config,
    );

    // ── Step 5: Background sweeps ────────────────────────────────
    let scheduler = if config.worker.enabled {
        let mut scheduler = CronScheduler::new().await?;
        scheduler.register_default_jobs(&config.worker, &services).await?;
        Some(scheduler)
    } else {
        tracing::info!("Background sweeps disabled");
        None
    };

    let state = AppState::new(config, cache, services, hub);
    Ok(Runtime {
        state,
        scheduler,
        relay,
        database: None,
    })
}

async fn open_stores(config: &AppConfig) -> AppResult<(Stores, Option<DatabasePool>)> {
    match config.database.provider.as_str() {
        "postgres" => {
            tracing::info!("Connecting to database");
            let database = DatabasePool::connect(&config.database).await?;
            seatline_database::migration::run_migrations(database.pool()).await?;
            let pool = database.pool().clone();
            let stores = Stores {
                trips: Arc::new(TripRepository::new(pool.clone())),
                bookings: Arc::new(BookingRepository::new(pool.clone())),
                locations: Arc::new(LocationRepository::new(pool)),
            };
            Ok((stores, Some(database)))
        }
        "memory" => {
            tracing::warn!("Using the in-process ledger; bookings are lost on restart");
            Ok((Stores::shared(Arc::new(MemoryLedger::new())), None))
        }
        other => Err(AppError::configuration(format!(
            "Unknown database provider: '{other}'. Supported: postgres, memory"
        ))),
    }
}
