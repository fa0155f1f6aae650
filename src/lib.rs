//! Flight Cache - cache-first, single-flight computation coordinator
//!
//! Serves a value from the cache when present; otherwise runs exactly one
//! computation per key no matter how many callers ask at once, waits for it
//! with a bounded timeout and writes the result back to the cache.

pub mod api;
pub mod builtins;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod registry;
pub mod tasks;
pub mod worker;

pub use api::AppState;
pub use config::Config;
pub use coordinator::{ComputationRequest, Coordinator};
pub use error::{ResolveError, Result};
pub use registry::HandlerRegistry;
pub use tasks::spawn_cleanup_task;
