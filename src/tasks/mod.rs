//! Background Tasks Module
//!
//! # Tasks
//! - TTL sweep: drops expired entries from the memory cache so they stop
//!   occupying capacity before anyone reads them

mod cleanup;

pub use cleanup::spawn_cleanup_task;
