//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the memory store against a plain map model and to
//! pin down capacity and eviction behaviour.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

use crate::cache::CacheStore;

const TEST_TTL: u64 = 300;

// == Strategies ==
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9:_]{1,32}"
}

/// JSON-ish payloads, the shape the coordinator actually writes.
fn value_strategy() -> impl Strategy<Value = String> {
    (any::<i64>(), "[a-zA-Z ]{0,32}")
        .prop_map(|(n, s)| serde_json::json!({ "n": n, "s": s }).to_string())
}

#[derive(Debug, Clone)]
enum StoreOp {
    Set { key: String, value: String },
    Get { key: String },
    Delete { key: String },
}

fn op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        (key_strategy(), value_strategy()).prop_map(|(key, value)| StoreOp::Set { key, value }),
        key_strategy().prop_map(|key| StoreOp::Get { key }),
        key_strategy().prop_map(|key| StoreOp::Delete { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Without capacity pressure the store behaves exactly like a map.
    #[test]
    fn prop_matches_map_model(ops in prop::collection::vec(op_strategy(), 1..80)) {
        let mut store = CacheStore::new(10_000);
        let mut model: HashMap<String, String> = HashMap::new();

        for op in ops {
            match op {
                StoreOp::Set { key, value } => {
                    store.set(key.clone(), value.clone(), TEST_TTL).unwrap();
                    model.insert(key, value);
                }
                StoreOp::Get { key } => {
                    prop_assert_eq!(store.get(&key), model.get(&key).cloned());
                }
                StoreOp::Delete { key } => {
                    prop_assert_eq!(store.delete(&key), model.remove(&key).is_some());
                }
            }
        }

        prop_assert_eq!(store.len(), model.len());
    }

    #[test]
    fn prop_capacity_is_never_exceeded(
        entries in prop::collection::vec((key_strategy(), value_strategy()), 1..200)
    ) {
        let max_entries = 25;
        let mut store = CacheStore::new(max_entries);

        for (key, value) in entries {
            store.set(key, value, TEST_TTL).unwrap();
            prop_assert!(store.len() <= max_entries);
        }
    }

    // A read protects a key from being the next eviction victim.
    #[test]
    fn prop_read_key_survives_eviction(
        keys in prop::collection::vec(key_strategy(), 3..10),
        new_key in key_strategy(),
    ) {
        let unique: Vec<String> = keys
            .into_iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        prop_assume!(unique.len() >= 3);
        prop_assume!(!unique.contains(&new_key));

        let mut store = CacheStore::new(unique.len());
        for key in &unique {
            store.set(key.clone(), "{}".to_string(), TEST_TTL).unwrap();
        }

        prop_assert!(store.get(&unique[0]).is_some());
        store.set(new_key.clone(), "{}".to_string(), TEST_TTL).unwrap();

        prop_assert!(store.get(&unique[0]).is_some());
        prop_assert!(store.get(&unique[1]).is_none());
        prop_assert!(store.get(&new_key).is_some());
        prop_assert_eq!(store.evictions(), 1);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    // Every caller-visible error renders as JSON with an "error" string.
    #[test]
    fn prop_error_response_format(msg in "[a-zA-Z0-9 _-]{1,60}") {
        use crate::error::{DispatchError, JobError, ResolveError, StoreError};
        use axum::body::to_bytes;
        use axum::response::IntoResponse;
        use std::time::Duration;

        let errors = vec![
            ResolveError::UnregisteredHandler(msg.clone()),
            ResolveError::Dispatch { key: msg.clone(), source: DispatchError::CapacityExhausted(1) },
            ResolveError::Timeout { key: msg.clone(), timeout: Duration::from_millis(5) },
            ResolveError::Computation { key: msg.clone(), source: JobError::Failed(msg.clone()) },
            ResolveError::Store(StoreError::Unavailable(msg.clone())),
            ResolveError::InvalidRequest(msg.clone()),
        ];

        let rt = tokio::runtime::Runtime::new().unwrap();
        for error in errors {
            let expected = error.to_string();
            let response = error.into_response();
            let bytes = rt.block_on(async {
                to_bytes(response.into_body(), usize::MAX).await.unwrap()
            });
            let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            prop_assert_eq!(json["error"].as_str(), Some(expected.as_str()));
        }
    }
}
