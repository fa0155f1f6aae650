//! API Handlers
//!
//! HTTP request handlers wrapping the coordinator.

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, Json};

use crate::cache::MemoryBackend;
use crate::config::Config;
use crate::coordinator::Coordinator;
use crate::dispatch::LocalDispatcher;
use crate::error::{ResolveError, Result};
use crate::models::{
    HandlersResponse, HealthResponse, ResolveRequest, ResolveResponse, StatsResponse,
};
use crate::registry::HandlerRegistry;
use crate::worker::Worker;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Coordinator,
    pub registry: Arc<HandlerRegistry>,
    pub dispatcher: LocalDispatcher,
    pub cache: MemoryBackend,
    pub default_ttl: u64,
    pub default_timeout: Duration,
}

impl AppState {
    /// Wires a memory cache and a local dispatcher around `registry`.
    pub fn from_config(config: &Config, registry: Arc<HandlerRegistry>) -> Self {
        let cache = MemoryBackend::new(config.max_entries);
        let dispatcher = LocalDispatcher::from_config(Worker::new(registry.clone()), config);
        let coordinator = Coordinator::new(Arc::new(cache.clone()), Arc::new(dispatcher.clone()))
            .with_late_fill(config.late_fill);

        Self {
            coordinator,
            registry,
            dispatcher,
            cache,
            default_ttl: config.default_ttl,
            default_timeout: config.computation_timeout(),
        }
    }
}

/// Handler for POST /resolve
pub async fn resolve_handler(
    State(state): State<AppState>,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<ResolveResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ResolveError::InvalidRequest(error_msg));
    }

    let request = req.into_computation(state.default_ttl, state.default_timeout);
    let value = state.coordinator.resolve(&request).await?;

    Ok(Json(ResolveResponse::new(request.cache_key, value)))
}

/// Handler for POST /refresh
pub async fn refresh_handler(
    State(state): State<AppState>,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<ResolveResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ResolveError::InvalidRequest(error_msg));
    }

    let request = req.into_computation(state.default_ttl, state.default_timeout);
    let value = state.coordinator.warm_refresh(&request).await?;

    Ok(Json(ResolveResponse::new(request.cache_key, value)))
}

/// Handler for GET /handlers
pub async fn handlers_handler(State(state): State<AppState>) -> Json<HandlersResponse> {
    Json(HandlersResponse {
        computation_types: state.registry.computation_types(),
    })
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(
        state.coordinator.stats(),
        state.dispatcher.active_jobs(),
        state.cache.len().await,
        state.cache.evictions().await,
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
