//! Flight Cache server
//!
//! Exposes the coordinator over HTTP with an in-memory cache, an in-process
//! dispatcher and the builtin computations.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flight_cache::api::create_router;
use flight_cache::builtins::register_builtins;
use flight_cache::{spawn_cleanup_task, AppState, Config, HandlerRegistry};

/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Register handlers, then build cache, dispatcher and coordinator
/// 4. Start background TTL sweep
/// 5. Serve HTTP until SIGINT/SIGTERM, then close the dispatcher and wait
///    (bounded by the computation timeout) for running jobs to finish
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flight_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Flight Cache");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_entries={}, default_ttl={}s, timeout={}ms, max_in_flight={}, workers={}, port={}",
        config.max_entries,
        config.default_ttl,
        config.computation_timeout_ms,
        config.max_in_flight,
        config.worker_concurrency,
        config.server_port
    );

    // Handlers must all be in place before the first request can arrive.
    let registry = HandlerRegistry::new();
    register_builtins(&registry);
    info!(types = ?registry.computation_types(), "Handlers registered");

    let state = AppState::from_config(&config, Arc::new(registry));
    let dispatcher = state.dispatcher.clone();

    let cleanup_handle = spawn_cleanup_task(state.cache.clone(), config.cleanup_interval);

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    dispatcher.shutdown();
    if !dispatcher.drain(config.computation_timeout()).await {
        warn!(
            active = dispatcher.active_jobs(),
            "Shutting down with jobs still running"
        );
    }
    cleanup_handle.abort();
    info!("Cleanup task stopped");
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
