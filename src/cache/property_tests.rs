//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the store's capacity and LRU guarantees and the
//! coordinator's fail-count and commit bookkeeping against a simple model.

use proptest::prelude::*;
use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::cache::{Cache, LruStore, Store};

// == Test Configuration ==
const TEST_TTL: Duration = Duration::from_secs(300);

// == Strategies ==
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,16}"
}

/// A handful of keys so operation sequences actually collide.
fn small_key_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "c"]).prop_map(str::to_string)
}

#[derive(Debug, Clone)]
enum StoreOp {
    Set { key: String, value: u32 },
    Get { key: String },
    Remove { key: String },
}

fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        (valid_key_strategy(), any::<u32>()).prop_map(|(key, value)| StoreOp::Set { key, value }),
        valid_key_strategy().prop_map(|key| StoreOp::Get { key }),
        valid_key_strategy().prop_map(|key| StoreOp::Remove { key }),
    ]
}

#[derive(Debug, Clone)]
enum CacheOp {
    Load { key: String, succeed: bool },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        3 => (small_key_strategy(), any::<bool>())
            .prop_map(|(key, succeed)| CacheOp::Load { key, succeed }),
        1 => small_key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // The store never holds more entries than its capacity, and the key
    // written last is always retrievable.
    #[test]
    fn prop_capacity_enforcement(
        capacity in 1usize..8,
        ops in prop::collection::vec(store_op_strategy(), 1..60)
    ) {
        let store = LruStore::new(capacity).unwrap();

        for op in ops {
            match op {
                StoreOp::Set { key, value } => {
                    store.set_with_expiry(&key, value, TEST_TTL).unwrap();
                    prop_assert_eq!(store.get(&key).unwrap(), value);
                }
                StoreOp::Get { key } => {
                    let _ = store.get(&key);
                }
                StoreOp::Remove { key } => {
                    store.remove(&key);
                    prop_assert!(!store.has(&key));
                }
            }
            prop_assert!(store.len() <= capacity, "Store grew past capacity");
        }

        let stats = store.stats();
        prop_assert_eq!(stats.total_entries, store.len());
    }

    // Hits and misses reported by the store match what callers observed.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(store_op_strategy(), 1..50)) {
        let store = LruStore::new(100).unwrap();
        let mut expected_hits = 0u64;
        let mut expected_misses = 0u64;

        for op in ops {
            match op {
                StoreOp::Set { key, value } => store.set_with_expiry(&key, value, TEST_TTL).unwrap(),
                StoreOp::Get { key } => match store.get(&key) {
                    Ok(_) => expected_hits += 1,
                    Err(_) => expected_misses += 1,
                },
                StoreOp::Remove { key } => {
                    store.remove(&key);
                }
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits);
        prop_assert_eq!(stats.misses, expected_misses);
    }

    // Sequential gets and deletes agree with a model of committed keys and
    // per-key consecutive failures: the loader only runs on a miss, sees the
    // modelled fail count, and only successful loads become visible.
    #[test]
    fn prop_coordinator_matches_model(ops in prop::collection::vec(cache_op_strategy(), 1..40)) {
        let cache: Cache<u32> = Cache::new(100).unwrap();
        let mut committed: HashSet<String> = HashSet::new();
        let mut failures: HashMap<String, u32> = HashMap::new();

        for (step, op) in ops.into_iter().enumerate() {
            match op {
                CacheOp::Load { key, succeed } => {
                    let observed = Cell::new(None);
                    let result = tokio_test::block_on(cache.get(&key, |fail_count| {
                        observed.set(Some(fail_count));
                        async move {
                            if succeed {
                                Ok((step as u32, TEST_TTL))
                            } else {
                                Err(anyhow::anyhow!("origin unavailable"))
                            }
                        }
                    }));

                    let expected_failures = failures.get(&key).copied().unwrap_or(0);
                    if committed.contains(&key) {
                        prop_assert_eq!(observed.get(), None, "Loader ran on a hit");
                        prop_assert!(result.is_ok());
                    } else {
                        prop_assert_eq!(observed.get(), Some(expected_failures));
                        if succeed {
                            prop_assert_eq!(result.unwrap(), step as u32);
                            committed.insert(key.clone());
                            failures.remove(&key);
                        } else {
                            prop_assert!(result.is_err());
                            failures.insert(key.clone(), expected_failures + 1);
                        }
                    }
                }
                CacheOp::Delete { key } => {
                    cache.delete(&key);
                    committed.remove(&key);
                }
            }

            for key in ["a", "b", "c"] {
                prop_assert_eq!(cache.has(key), committed.contains(key));
                prop_assert_eq!(cache.fail_count(key), failures.get(key).copied().unwrap_or(0));
                prop_assert!(!cache.is_loading(key));
            }
        }
    }
}
