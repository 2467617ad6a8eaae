//! Cache Store Module
//!
//! The bounded store the load coordinator sits in front of: a [`Store`]
//! capability trait plus [`LruStore`], a HashMap with LRU eviction and
//! per-entry expiry.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::cache::{CacheEntry, CacheStats, LruTracker};
use crate::error::{CacheError, Result};

// == Store Trait ==
/// Thread-safe bounded key/value storage with per-entry expiry.
///
/// `get` signals a miss with [`CacheError::NotFound`] or
/// [`CacheError::Expired`]; any other error is treated as a store fault.
pub trait Store<V>: Send + Sync {
    fn get(&self, key: &str) -> Result<V>;

    fn set_with_expiry(&self, key: &str, value: V, ttl: Duration) -> Result<()>;

    /// Removes the key, returning whether it was present.
    fn remove(&self, key: &str) -> bool;

    fn has(&self, key: &str) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every expired entry, returning how many were removed.
    fn purge_expired(&self) -> usize {
        0
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            total_entries: self.len(),
            ..CacheStats::default()
        }
    }
}

// == LRU Store ==
/// In-memory store with LRU eviction and TTL support.
#[derive(Debug)]
pub struct LruStore<V> {
    inner: Mutex<StoreInner<V>>,
    max_entries: usize,
}

#[derive(Debug)]
struct StoreInner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    lru: LruTracker,
    stats: CacheStats,
}

impl<V> StoreInner<V> {
    fn drop_entry(&mut self, key: &str) -> bool {
        let existed = self.entries.remove(key).is_some();
        if existed {
            self.lru.remove(key);
            self.stats.set_total_entries(self.entries.len());
        }
        existed
    }
}

impl<V> LruStore<V> {
    // == Constructor ==
    /// Creates a store holding at most `max_entries` entries.
    pub fn new(max_entries: usize) -> Result<Self> {
        if max_entries == 0 {
            return Err(CacheError::InvalidRequest(
                "Capacity must be a positive integer".to_string(),
            ));
        }

        Ok(Self {
            inner: Mutex::new(StoreInner {
                entries: HashMap::new(),
                lru: LruTracker::new(),
                stats: CacheStats::new(),
            }),
            max_entries,
        })
    }
}

impl<V: Clone + Send> Store<V> for LruStore<V> {
    // == Get ==
    /// Returns a clone of the live value. Expired entries are removed and
    /// reported as [`CacheError::Expired`].
    fn get(&self, key: &str) -> Result<V> {
        let mut inner = self.inner.lock();

        let live = inner
            .entries
            .get(key)
            .map(|entry| (!entry.is_expired()).then(|| entry.value.clone()));

        match live {
            Some(Some(value)) => {
                inner.stats.record_hit();
                inner.lru.touch(key);
                Ok(value)
            }
            Some(None) => {
                inner.drop_entry(key);
                inner.stats.record_miss();
                Err(CacheError::Expired(key.to_string()))
            }
            None => {
                inner.stats.record_miss();
                Err(CacheError::NotFound(key.to_string()))
            }
        }
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl`, overwriting any previous entry.
    /// Evicts the least recently used entry when a new key would exceed
    /// capacity.
    fn set_with_expiry(&self, key: &str, value: V, ttl: Duration) -> Result<()> {
        let mut inner = self.inner.lock();

        let is_overwrite = inner.entries.contains_key(key);
        if !is_overwrite && inner.entries.len() >= self.max_entries {
            match inner.lru.evict_oldest() {
                Some(evicted) => {
                    inner.entries.remove(&evicted);
                    inner.stats.record_eviction();
                }
                None => {
                    return Err(CacheError::CacheFull(
                        "Cache is full and eviction failed".to_string(),
                    ));
                }
            }
        }

        inner
            .entries
            .insert(key.to_string(), CacheEntry::new(value, ttl));
        inner.lru.touch(key);
        let len = inner.entries.len();
        inner.stats.set_total_entries(len);

        Ok(())
    }

    fn remove(&self, key: &str) -> bool {
        self.inner.lock().drop_entry(key)
    }

    /// Existence check that does not count as a hit or refresh LRU order.
    fn has(&self, key: &str) -> bool {
        self.inner
            .lock()
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired())
    }

    fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    // == Purge Expired ==
    fn purge_expired(&self) -> usize {
        let mut inner = self.inner.lock();
        let now = Instant::now();

        let expired_keys: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            inner.drop_entry(key);
        }

        expired_keys.len()
    }

    fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.entries.len());
        stats
    }
}
