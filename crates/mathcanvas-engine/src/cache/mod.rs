//! Plan cache.
//!
//! Responsibilities:
//! - serve a cached [`Plan`] when its signature matches the current inputs
//! - translate cached plans when only the pan changed
//! - rebuild (and count a miss) on any other mismatch
//! - evict entries that were not touched during a frame
//!
//! The cache never serves a plan whose signature disagrees with the
//! drawable and mapper passed in the same call.

mod store;

pub use store::{CacheConfig, CacheOutcome, PlanCache};
