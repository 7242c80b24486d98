//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the store's structural invariants and eviction
//! order against arbitrary operation sequences.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

use chrono::TimeDelta;

use crate::cache::{CacheStore, EvictionPolicy};

// == Strategies ==
/// Generates keys from a small alphabet so operations collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-f][0-3]".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,32}".prop_map(|s| s)
}

fn policy_strategy() -> impl Strategy<Value = EvictionPolicy> {
    prop_oneof![
        Just(EvictionPolicy::FirstInFirstOut),
        Just(EvictionPolicy::LeastRecentlyUsed),
    ]
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    SetWithTtl { key: String, value: String, ttl_secs: i64 },
    Get { key: String },
    Delete { key: String },
    DeleteAll { keys: Vec<String> },
    Expire { key: String },
    Clear,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        6 => (key_strategy(), value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        2 => (key_strategy(), value_strategy(), -5i64..60)
            .prop_map(|(key, value, ttl_secs)| CacheOp::SetWithTtl { key, value, ttl_secs }),
        6 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        2 => key_strategy().prop_map(|key| CacheOp::Delete { key }),
        1 => prop::collection::vec(key_strategy(), 0..5)
            .prop_map(|keys| CacheOp::DeleteAll { keys }),
        1 => key_strategy().prop_map(|key| CacheOp::Expire { key }),
        1 => Just(CacheOp::Clear),
    ]
}

fn apply(store: &CacheStore<String>, op: CacheOp) {
    match op {
        CacheOp::Set { key, value } => store.set(key, value),
        CacheOp::SetWithTtl { key, value, ttl_secs } => {
            store.set_with_ttl(key, value, Some(TimeDelta::seconds(ttl_secs)))
        }
        CacheOp::Get { key } => {
            store.get(&key);
        }
        CacheOp::Delete { key } => {
            store.delete(&key);
        }
        CacheOp::DeleteAll { keys } => {
            store.delete_all(&keys);
        }
        CacheOp::Expire { key } => {
            store.expire(&key, Some(TimeDelta::seconds(30)));
        }
        CacheOp::Clear => store.clear(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // The list visits exactly the indexed keys once each, with no cycles,
    // after any operation sequence
    #[test]
    fn prop_list_matches_index(
        policy in policy_strategy(),
        max_size in 0usize..8,
        ops in prop::collection::vec(cache_op_strategy(), 1..80)
    ) {
        let store = CacheStore::new()
            .with_max_size(max_size)
            .with_eviction_policy(policy);

        for op in ops {
            apply(&store, op);
            store.assert_consistent();
        }

        let keys = store.keys();
        let unique: HashSet<&String> = keys.iter().collect();
        prop_assert_eq!(unique.len(), keys.len(), "Duplicate key in list");
        prop_assert_eq!(keys.len(), store.count(), "List and index disagree");
    }

    // count() equals the number of distinct keys a model without eviction
    // would hold, when the store is unbounded
    #[test]
    fn prop_count_matches_model(
        ops in prop::collection::vec(cache_op_strategy(), 1..80)
    ) {
        let store = CacheStore::new().with_max_size(0);
        let mut model: HashSet<String> = HashSet::new();

        for op in ops {
            match &op {
                CacheOp::Set { key, .. } => {
                    model.insert(key.clone());
                }
                CacheOp::SetWithTtl { key, ttl_secs, .. } => {
                    if *ttl_secs >= 0 || model.contains(key) {
                        model.insert(key.clone());
                    }
                }
                CacheOp::Delete { key } => {
                    model.remove(key);
                }
                CacheOp::DeleteAll { keys } => {
                    for key in keys {
                        model.remove(key);
                    }
                }
                CacheOp::Clear => model.clear(),
                CacheOp::Get { .. } | CacheOp::Expire { .. } => {}
            }
            apply(&store, op);
            prop_assert_eq!(store.count(), model.len());
        }
    }

    // The store never holds more than max_size entries after a set
    #[test]
    fn prop_capacity_enforcement(
        policy in policy_strategy(),
        max_size in 1usize..10,
        entries in prop::collection::vec((key_strategy(), value_strategy()), 1..100)
    ) {
        let store = CacheStore::new()
            .with_max_size(max_size)
            .with_eviction_policy(policy);

        for (key, value) in entries {
            store.set(key, value);
            prop_assert!(
                store.count() <= max_size,
                "Cache size {} exceeds max {}",
                store.count(),
                max_size
            );
        }
    }

    // Values read back are the last ones written, for keys still present
    #[test]
    fn prop_last_write_wins(
        policy in policy_strategy(),
        entries in prop::collection::vec((key_strategy(), value_strategy()), 1..60)
    ) {
        let store = CacheStore::new()
            .with_max_size(0)
            .with_eviction_policy(policy);
        let mut expected: HashMap<String, String> = HashMap::new();

        for (key, value) in entries {
            store.set(key.clone(), value.clone());
            expected.insert(key, value);
        }

        for (key, value) in expected {
            prop_assert_eq!(store.get(&key), Some(value));
        }
    }

    // Under FIFO, reads never save the oldest entry from eviction
    #[test]
    fn prop_fifo_eviction_order(
        keys in prop::collection::hash_set(key_strategy(), 2..10),
        reads in prop::collection::vec(0usize..10, 0..20)
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let store = CacheStore::new().with_max_size(keys.len());

        for key in &keys {
            store.set(key.clone(), key.clone());
        }
        for read in reads {
            store.get(&keys[read % keys.len()]);
        }
        store.set("new-key", "value".to_string());

        prop_assert!(!store.exists(&keys[0]), "Oldest key should have been evicted");
        for key in keys.iter().skip(1) {
            prop_assert!(store.exists(key), "Key '{}' should remain", key);
        }
    }

    // Under LRU, the evicted entry is the one read or written least recently
    #[test]
    fn prop_lru_eviction_order(
        keys in prop::collection::hash_set(key_strategy(), 3..10),
        reads in prop::collection::vec(0usize..10, 0..20)
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let store = CacheStore::new()
            .with_max_size(keys.len())
            .with_eviction_policy(EvictionPolicy::LeastRecentlyUsed);

        // Recency order, most recent last
        let mut recency: Vec<String> = Vec::new();
        for key in &keys {
            store.set(key.clone(), key.clone());
            recency.push(key.clone());
        }
        for read in reads {
            let key = keys[read % keys.len()].clone();
            store.get(&key);
            recency.retain(|k| k != &key);
            recency.push(key);
        }
        store.set("new-key", "value".to_string());

        prop_assert!(!store.exists(&recency[0]), "Least recently used key should be evicted");
        for key in recency.iter().skip(1) {
            prop_assert!(store.exists(key), "Key '{}' should remain", key);
        }
    }
}
