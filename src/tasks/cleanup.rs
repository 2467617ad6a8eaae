//! TTL Cleanup Task
//!
//! Background task that periodically purges expired store entries so that
//! entries nobody reads again do not linger until LRU pressure evicts them.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{Cache, Store};

/// Spawns a background task that purges expired entries every
/// `cleanup_interval`.
///
/// Returns the task's JoinHandle; abort it during shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(Cache::<String>::new(1000)?);
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(1));
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task<V, S>(cache: Arc<Cache<V, S>>, cleanup_interval: Duration) -> JoinHandle<()>
where
    V: Send + 'static,
    S: Store<V> + 'static,
{
    tokio::spawn(async move {
        info!(
            interval_ms = cleanup_interval.as_millis() as u64,
            "Starting TTL cleanup task"
        );

        let mut ticker = tokio::time::interval(cleanup_interval);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let removed = cache.purge_expired();
            if removed > 0 {
                info!(removed, "TTL cleanup: removed expired entries");
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}
