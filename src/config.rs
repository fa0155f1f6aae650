//! Configuration Module
//!
//! Loads server and coordinator settings from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Runtime configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the memory cache can hold
    pub max_entries: usize,
    /// Cache TTL in seconds when a request does not carry one
    pub default_ttl: u64,
    /// Wait bound in milliseconds when a request does not carry one
    pub computation_timeout_ms: u64,
    /// Maximum number of simultaneously active jobs
    pub max_in_flight: usize,
    /// Maximum number of handlers executing at once
    pub worker_concurrency: usize,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Whether a timed-out job still fills the cache when it finishes
    pub late_fill: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `COMPUTATION_TIMEOUT_MS` - Default wait bound (default: 5000)
    /// - `MAX_IN_FLIGHT` - Active job limit (default: 1024)
    /// - `WORKER_CONCURRENCY` - Concurrent handler limit (default: 16)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    /// - `LATE_FILL` - Fill the cache after a timed-out wait (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            default_ttl: env_or("DEFAULT_TTL", defaults.default_ttl),
            computation_timeout_ms: env_or(
                "COMPUTATION_TIMEOUT_MS",
                defaults.computation_timeout_ms,
            ),
            max_in_flight: env_or("MAX_IN_FLIGHT", defaults.max_in_flight),
            worker_concurrency: env_or("WORKER_CONCURRENCY", defaults.worker_concurrency),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            late_fill: env_or("LATE_FILL", defaults.late_fill),
        }
    }

    /// Default wait bound as a Duration.
    pub fn computation_timeout(&self) -> Duration {
        Duration::from_millis(self.computation_timeout_ms)
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            default_ttl: 300,
            computation_timeout_ms: 5000,
            max_in_flight: 1024,
            worker_concurrency: 16,
            server_port: 3000,
            cleanup_interval: 1,
            late_fill: true,
        }
    }
}
