//! Seatline Server: seat holds, booking ledger, and fleet broadcast
//!
//! Main entry point that loads configuration, wires all crates together,
//! and serves the WebSocket surface.

use std::time::Duration;

use tracing;
use tracing_subscriber::{EnvFilter, fmt};

use seatline_core::config::AppConfig;
use seatline_core::error::AppError;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load configuration from `config/default.toml`, the `SEATLINE_ENV`
/// overlay, and `SEATLINE__*` variables
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("SEATLINE_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        database = %config.database.provider,
        cache = %config.cache.provider,
        transport = %config.realtime.transport,
        "Starting Seatline"
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);

    // ── Step 1: Stores, cache, hub, services, scheduler ──────────
    let runtime = seatline_api::assemble(config).await?;

    // ── Step 2: Background sweeps ────────────────────────────────
    runtime.start().await?;

    // ── Step 3: Build and start HTTP server ──────────────────────
    let app = seatline_api::build_app(runtime.state.clone());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!(%addr, "Seatline server listening");

    // ── Step 4: Graceful shutdown ────────────────────────────────
    // Open sockets keep the server alive, so the hub is closed as soon as
    // the signal arrives.
    let hub = runtime.state.hub.clone();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, closing sockets");
        hub.shutdown();
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 5: Stop background work ─────────────────────────────
    if tokio::time::timeout(grace, runtime.shutdown()).await.is_err() {
        tracing::warn!(grace_seconds = grace.as_secs(), "Shutdown grace period exceeded");
    }

    tracing::info!("Seatline server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
