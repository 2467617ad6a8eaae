//! loadcache - An in-process cache with load coalescing
//!
//! [`Cache`] sits in front of an expensive, possibly failing data source.
//! For every key at most one loader runs at a time, concurrent callers for
//! the same missing key share its result, and a key deleted while its load
//! is in flight is not repopulated with the stale result.
//!
//! The crate also ships a read-through HTTP proxy built on the cache.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod origin;
pub mod tasks;

pub use api::AppState;
pub use cache::{Cache, CacheStats, LoadState, LruStore, Store};
pub use config::Config;
pub use error::{CacheError, Result};
pub use origin::{LoadPolicy, Origin};
pub use tasks::spawn_cleanup_task;
