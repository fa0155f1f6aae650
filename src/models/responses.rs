//! Response DTOs for the coordinator API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::coordinator::StatsSnapshot;

/// Response body for `POST /resolve` and `POST /refresh`
#[derive(Debug, Clone, Serialize)]
pub struct ResolveResponse {
    pub key: String,
    pub value: Value,
}

impl ResolveResponse {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Response body for `GET /handlers`
#[derive(Debug, Clone, Serialize)]
pub struct HandlersResponse {
    pub computation_types: Vec<String>,
}

/// Response body for `GET /stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub resolve: StatsSnapshot,
    /// hits / (hits + misses)
    pub hit_rate: f64,
    /// Jobs enqueued and not yet finished
    pub active_jobs: usize,
    /// Entries currently held by the memory cache
    pub cache_entries: usize,
    /// Entries pushed out by capacity pressure
    pub cache_evictions: u64,
}

impl StatsResponse {
    pub fn new(
        resolve: StatsSnapshot,
        active_jobs: usize,
        cache_entries: usize,
        cache_evictions: u64,
    ) -> Self {
        Self {
            hit_rate: resolve.hit_rate(),
            resolve,
            active_jobs,
            cache_entries,
            cache_evictions,
        }
    }
}

/// Response body for `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
