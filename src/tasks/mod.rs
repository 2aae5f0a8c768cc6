//! Background Tasks Module
//!
//! Contains background tasks that run periodically while a store is open.
//!
//! # Tasks
//! - Prune: Removes expired entries and enforces capacity at configured intervals

mod prune;

pub use prune::spawn_prune_task;
