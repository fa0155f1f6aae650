//! API Module
//!
//! HTTP handlers and routing over the coordinator.
//!
//! # Endpoints
//! - `POST /resolve` - Cached-or-computed value for a key
//! - `POST /refresh` - Drop the cached value and recompute
//! - `GET /handlers` - Registered computation types
//! - `GET /stats` - Coordinator and cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
