//! Cache Module
//!
//! Provides a bounded in-memory store with TTL expiration and LRU eviction,
//! and the load coordinator that fronts it with per-key load coalescing.

mod coordinator;
mod entry;
mod lru;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use coordinator::{Cache, LoadState};
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::{LruStore, Store};

// == Public Constants ==
/// Maximum key length in bytes accepted by the HTTP surface
pub const MAX_KEY_LENGTH: usize = 256;
