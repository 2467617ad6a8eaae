//! Load Coordinator Module
//!
//! Fronts a [`Store`] with per-key load coalescing. On a miss exactly one
//! caller (the owner of the key's load token) runs the loader; everyone else
//! parks on the token's [`Notify`] and checks the store again once it is
//! released. A `delete` that lands while a load is in flight marks the token
//! `NeedReload`, and the owner then skips committing its result.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, warn};

use super::stats::LoadCounters;
use super::{CacheStats, LruStore, Store};
use crate::error::{CacheError, Result};

// == Load State ==
/// Status of an in-flight fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// The owner is running the loader.
    Loading,
    /// The key was deleted while loading; the owner must not commit.
    NeedReload,
}

#[derive(Debug)]
struct InFlight {
    state: LoadState,
    /// Woken once the token is released.
    released: Arc<Notify>,
}

/// Load tokens and consecutive failure counts, always accessed under one lock.
#[derive(Debug, Default)]
struct Registry {
    loading: HashMap<String, InFlight>,
    fail_counts: HashMap<String, u32>,
}

enum Acquire {
    Owner(Arc<Notify>),
    Waiter(Arc<Notify>),
}

/// Exclusive right to fill one key. Dropping it (on return, error, panic, or
/// cancellation of the owning future) releases the key and wakes waiters.
struct LoadToken<'a> {
    registry: &'a Mutex<Registry>,
    key: &'a str,
    released: Arc<Notify>,
}

impl Drop for LoadToken<'_> {
    fn drop(&mut self) {
        self.registry.lock().loading.remove(self.key);
        self.released.notify_waiters();
    }
}

// == Cache ==
/// A read-through cache that runs at most one loader per key at a time.
///
/// Share it between tasks behind an `Arc`.
pub struct Cache<V, S = LruStore<V>> {
    store: S,
    registry: Mutex<Registry>,
    counters: LoadCounters,
    _value: PhantomData<fn() -> V>,
}

impl<V: Clone + Send> Cache<V> {
    // == Constructor ==
    /// Creates a cache backed by an [`LruStore`] holding at most `capacity`
    /// entries.
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self::with_store(LruStore::new(capacity)?))
    }
}

impl<V, S: Store<V>> Cache<V, S> {
    /// Creates a cache in front of an arbitrary store.
    ///
    /// Commits call [`Store::set_with_expiry`] while holding the lock that
    /// every `get`, `delete` and `fail_count` on this cache goes through, so
    /// it must be a short in-memory write. A store backed by I/O has to
    /// buffer or spawn its writes.
    pub fn with_store(store: S) -> Self {
        Self {
            store,
            registry: Mutex::new(Registry::default()),
            counters: LoadCounters::default(),
            _value: PhantomData,
        }
    }

    // == Has ==
    /// Whether a live value is committed for `key`. Keys that are still
    /// loading are not reported.
    pub fn has(&self, key: &str) -> bool {
        self.store.has(key)
    }

    // == Delete ==
    /// Removes `key` from the store. If a load for `key` is in flight, its
    /// result will be returned to its caller but not committed.
    pub fn delete(&self, key: &str) {
        // The flip has to precede the removal: a commit racing with us is
        // then either discarded or removed right after.
        if let Some(in_flight) = self.registry.lock().loading.get_mut(key) {
            in_flight.state = LoadState::NeedReload;
            debug!(key, "Key deleted during in-flight load");
        }
        self.store.remove(key);
    }

    /// Consecutive failed loads for `key` since its last successful load.
    pub fn fail_count(&self, key: &str) -> u32 {
        self.registry
            .lock()
            .fail_counts
            .get(key)
            .copied()
            .unwrap_or(0)
    }

    /// Forgets the failure history of `key`.
    pub fn clear_fail_count(&self, key: &str) {
        self.registry.lock().fail_counts.remove(key);
    }

    pub fn is_loading(&self, key: &str) -> bool {
        self.load_state(key).is_some()
    }

    /// State of the in-flight load for `key`, None when nothing is loading.
    pub fn load_state(&self, key: &str) -> Option<LoadState> {
        self.registry
            .lock()
            .loading
            .get(key)
            .map(|in_flight| in_flight.state)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn purge_expired(&self) -> usize {
        self.store.purge_expired()
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.store.stats();
        self.counters.fill(&mut stats);
        stats
    }

    fn try_acquire(&self, key: &str) -> Acquire {
        let mut registry = self.registry.lock();
        match registry.loading.get(key) {
            Some(in_flight) => Acquire::Waiter(Arc::clone(&in_flight.released)),
            None => {
                let released = Arc::new(Notify::new());
                registry.loading.insert(
                    key.to_string(),
                    InFlight {
                        state: LoadState::Loading,
                        released: Arc::clone(&released),
                    },
                );
                Acquire::Owner(released)
            }
        }
    }

    /// Whether the token identified by `released` still holds `key`.
    fn still_held(&self, key: &str, released: &Arc<Notify>) -> bool {
        self.registry
            .lock()
            .loading
            .get(key)
            .is_some_and(|in_flight| Arc::ptr_eq(&in_flight.released, released))
    }
}

impl<V: Clone, S: Store<V>> Cache<V, S> {
    // == Get ==
    /// Returns the value for `key`, running `loader` on a miss.
    ///
    /// The loader receives the key's consecutive failure count and returns
    /// the value with its TTL. Concurrent callers for the same key wait for
    /// the running loader instead of starting their own. A loader error is
    /// returned only to the caller that ran it and bumps the failure count;
    /// nothing is stored. Store faults other than a miss are returned
    /// immediately.
    pub async fn get<F, Fut>(&self, key: &str, loader: F) -> Result<V>
    where
        F: FnOnce(u32) -> Fut,
        Fut: Future<Output = anyhow::Result<(V, Duration)>>,
    {
        let token = loop {
            match self.store.get(key) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_miss() => {}
                Err(err) => {
                    warn!(key, error = %err, "Store fault while reading key");
                    return Err(err);
                }
            }

            match self.try_acquire(key) {
                Acquire::Owner(released) => {
                    break LoadToken {
                        registry: &self.registry,
                        key,
                        released,
                    }
                }
                Acquire::Waiter(released) => {
                    self.counters.record_wait();
                    // Register before re-checking so a release in between
                    // still wakes us.
                    let notified = released.notified();
                    if self.still_held(key, &released) {
                        debug!(key, "Waiting for in-flight load");
                        notified.await;
                    }
                }
            }
        };

        // The previous owner may have committed between our miss and the
        // token acquisition.
        if self.store.has(key) {
            match self.store.get(key) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_miss() => {}
                Err(err) => {
                    warn!(key, error = %err, "Store fault while re-checking key");
                    return Err(err);
                }
            }
        }

        let fail_count = self.fail_count(key);
        self.counters.record_load();
        debug!(key, fail_count, "Loading value");

        let (value, ttl) = match loader(fail_count).await {
            Ok(loaded) => loaded,
            Err(source) => {
                let failures = {
                    let mut registry = self.registry.lock();
                    let count = registry.fail_counts.entry(key.to_string()).or_insert(0);
                    *count += 1;
                    *count
                };
                self.counters.record_failure();
                warn!(key, failures, error = %source, "Loader failed");
                return Err(CacheError::LoadFailed {
                    key: key.to_string(),
                    source,
                });
            }
        };

        {
            let mut registry = self.registry.lock();
            registry.fail_counts.remove(key);

            let state = registry.loading.get(key).map(|in_flight| in_flight.state);
            if state == Some(LoadState::NeedReload) {
                self.counters.record_discard();
                debug!(key, "Discarding value loaded across a delete");
            } else if let Err(err) = self.store.set_with_expiry(key, value.clone(), ttl) {
                warn!(key, error = %err, "Failed to commit loaded value");
            } else {
                debug!(key, ttl_ms = ttl.as_millis() as u64, "Committed loaded value");
            }
        }

        drop(token);
        Ok(value)
    }
}

impl<V, S: Store<V>> fmt::Debug for Cache<V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Cache");
        out.field("entries", &self.store.len());
        match self.registry.try_lock() {
            Some(registry) => out
                .field("in-flight loads", &registry.loading.len())
                .field("failing keys", &registry.fail_counts.len()),
            None => out.field("registry", &format_args!("<locked>")),
        };
        out.finish()
    }
}
