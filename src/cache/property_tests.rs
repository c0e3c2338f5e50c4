//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check write policy, capacity and activation behavior.

use std::collections::HashSet;

use axum::http::{Method, StatusCode};
use proptest::prelude::*;

use crate::cache::{CacheStore, CacheVersion, PartitionName, PartitionRole, RequestKey};
use crate::fetch::{FetchRequest, FetchResponse};

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 100;
const TEST_MAX_ENTRY_BYTES: usize = 64 * 1024;

fn version(tag: &str) -> CacheVersion {
    CacheVersion::new(tag).unwrap()
}

// == Strategies ==
fn path_strategy() -> impl Strategy<Value = String> {
    "/[a-z]{1,8}(/[a-z0-9]{1,8}){0,3}(\\?[a-z]=[0-9]{1,3})?".prop_map(|s| s)
}

fn body_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..512)
}

fn method_strategy() -> impl Strategy<Value = Method> {
    prop_oneof![
        Just(Method::POST),
        Just(Method::PUT),
        Just(Method::PATCH),
        Just(Method::DELETE),
    ]
}

fn role_strategy() -> impl Strategy<Value = PartitionRole> {
    prop_oneof![
        Just(PartitionRole::Static),
        Just(PartitionRole::Dynamic),
        Just(PartitionRole::Api),
    ]
}

fn status_strategy() -> impl Strategy<Value = u16> {
    prop_oneof![200u16..300, 300u16..600]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // A successful GET is stored exactly as it was returned.
    #[test]
    fn prop_write_through_stores_returned_bytes(
        path in path_strategy(),
        body in body_strategy(),
        role in role_strategy()
    ) {
        let mut store = CacheStore::new(version("v1"), TEST_MAX_ENTRIES, TEST_MAX_ENTRY_BYTES);
        let request = FetchRequest::get(path.clone());
        let response = FetchResponse::new(StatusCode::OK, body.clone());

        prop_assert!(store.put(role, &request, &response).unwrap());

        let entry = store.get(role, &RequestKey::new(&Method::GET, &path)).unwrap().unwrap();
        prop_assert_eq!(entry.status, response.status);
        prop_assert_eq!(&entry.body[..], &body[..]);
    }

    // Mutating methods never produce an entry, whatever the response.
    #[test]
    fn prop_non_get_never_stored(
        path in path_strategy(),
        method in method_strategy(),
        role in role_strategy()
    ) {
        let mut store = CacheStore::new(version("v1"), TEST_MAX_ENTRIES, TEST_MAX_ENTRY_BYTES);
        let request = FetchRequest::new(method.clone(), path.clone());
        let response = FetchResponse::new(StatusCode::OK, "ok");

        prop_assert!(!store.put(role, &request, &response).unwrap());
        prop_assert_eq!(store.len(role), 0);
        prop_assert!(store.get(role, &RequestKey::new(&method, &path)).unwrap().is_none());
    }

    // Only 2xx statuses are stored.
    #[test]
    fn prop_only_success_stored(path in path_strategy(), status in status_strategy()) {
        let mut store = CacheStore::new(version("v1"), TEST_MAX_ENTRIES, TEST_MAX_ENTRY_BYTES);
        let status = StatusCode::from_u16(status).unwrap();
        let stored = store
            .put(PartitionRole::Api, &FetchRequest::get(path), &FetchResponse::new(status, "x"))
            .unwrap();

        prop_assert_eq!(stored, status.is_success());
        prop_assert_eq!(store.len(PartitionRole::Api), usize::from(status.is_success()));
    }

    // No partition grows beyond its capacity.
    #[test]
    fn prop_capacity_enforcement(paths in prop::collection::vec(path_strategy(), 1..200)) {
        let max_entries = 20;
        let mut store = CacheStore::new(version("v1"), max_entries, TEST_MAX_ENTRY_BYTES);

        for path in paths {
            store
                .put(PartitionRole::Dynamic, &FetchRequest::get(path), &FetchResponse::new(StatusCode::OK, "x"))
                .unwrap();
            prop_assert!(store.len(PartitionRole::Dynamic) <= max_entries);
        }
    }

    // After activating a new version, nothing written under the old one is readable,
    // and exactly the old partitions were deleted.
    #[test]
    fn prop_activation_hides_old_version(
        writes in prop::collection::vec((role_strategy(), path_strategy()), 1..30)
    ) {
        let mut store = CacheStore::new(version("v1"), TEST_MAX_ENTRIES, TEST_MAX_ENTRY_BYTES);
        for (role, path) in &writes {
            store
                .put(*role, &FetchRequest::get(path.clone()), &FetchResponse::new(StatusCode::OK, "old"))
                .unwrap();
        }

        let removed: HashSet<PartitionName> = store.activate(&version("v2")).into_iter().collect();
        let expected: HashSet<PartitionName> = PartitionRole::ALL
            .iter()
            .map(|role| PartitionName::new(*role, &version("v1")))
            .collect();
        prop_assert_eq!(removed, expected);

        for (role, path) in &writes {
            prop_assert!(store.get(*role, &RequestKey::new(&Method::GET, path)).unwrap().is_none());
        }
    }
}
