//! Cache Module
//!
//! The cache capability consumed by the coordinator and an in-memory
//! implementation with TTL expiration and LRU eviction.

mod backend;
mod entry;
mod lru;
mod store;

#[cfg(test)]
mod property_tests;

pub use backend::{CacheBackend, MemoryBackend};
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use store::CacheStore;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
