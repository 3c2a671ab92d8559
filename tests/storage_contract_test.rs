//! Contract tests run against every backend configuration

use proptest::prelude::*;
use recordstore::error::Error;
use recordstore::storage::{pages_for, SlottedStore};
use recordstore::{Backend, BackendKind, Outcome, Record, RecordId, RecordStore, StoreConfig, Template};
use std::collections::BTreeSet;

const CAPACITY: usize = 30;

/// Every backend, bare and behind the cache overlay
fn backends() -> Vec<Backend> {
    let mut built = Vec::new();
    for kind in [BackendKind::List, BackendKind::OrderedMap, BackendKind::Slotted] {
        for cached in [false, true] {
            let mut config = StoreConfig::default();
            config.backend = kind;
            config.slotted.capacity = CAPACITY;
            config.cache.enabled = cached;
            config.cache.capacity = 3;
            built.push(Backend::from_config(&config).expect("backend"));
        }
    }
    built
}

fn record(id: RecordId, title: &str, value: &str) -> Record {
    Template::default()
        .record(id, [("title", title), ("value", value)])
        .expect("record")
}

#[tokio::test]
async fn test_uniqueness() {
    for backend in backends() {
        assert_eq!(backend.add(record(7, "first", "")).await.unwrap(), Outcome::Success);
        assert_eq!(
            backend.add(record(7, "second", "")).await.unwrap(),
            Outcome::AlreadyExists,
            "{:?}",
            backend
        );
        let stored = backend.get(7).await.unwrap().unwrap();
        assert_eq!(stored.field("title"), Some("first"));
        assert_eq!(backend.count().await.unwrap(), 1);
    }
}

#[tokio::test]
async fn test_round_trip_and_update() {
    for backend in backends() {
        let original = record(3, "Aleksandr Pushkin", "poet");
        assert_eq!(backend.add(original.clone()).await.unwrap(), Outcome::Success);
        assert_eq!(backend.get(3).await.unwrap(), Some(original));

        let replaced = record(3, "Aleksandr Pushkin", "writer");
        assert_eq!(backend.update(replaced.clone()).await.unwrap(), Outcome::Success);
        assert_eq!(backend.get(3).await.unwrap(), Some(replaced), "{:?}", backend);

        assert_eq!(backend.update(record(4, "nobody", "")).await.unwrap(), Outcome::NotFound);
        assert_eq!(backend.get(4).await.unwrap(), None);
    }
}

#[tokio::test]
async fn test_delete_leaves_nothing_behind() {
    for backend in backends() {
        let _ = backend.add(record(5, "gone", "soon")).await.unwrap();
        assert_eq!(backend.delete(5).await.unwrap(), Outcome::Success);
        assert_eq!(backend.delete(5).await.unwrap(), Outcome::NotFound);
        assert_eq!(backend.get(5).await.unwrap(), None);
        assert!(backend.list().await.unwrap().is_empty(), "{:?}", backend);
        assert!(backend.search("gone").await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_readd_after_delete_returns_new_record() {
    for backend in backends() {
        let _ = backend.add(record(6, "Aleksandr Sergeevich Pushkin", "poet")).await.unwrap();
        assert_eq!(backend.delete(6).await.unwrap(), Outcome::Success);

        let shorter = record(6, "Lev", "");
        assert_eq!(backend.add(shorter.clone()).await.unwrap(), Outcome::Success);
        assert_eq!(backend.get(6).await.unwrap(), Some(shorter), "{:?}", backend);
    }
}

#[tokio::test]
async fn test_readd_into_tombstone_leaves_clean_tail() {
    let store = SlottedStore::new(4, 40, Template::default()).unwrap();
    let _ = store.add(record(3, "Aleksandr Sergeevich Pushkin", "poet")).await.unwrap();
    let _ = store.delete(3).await.unwrap();

    let shorter = record(3, "Lev", "");
    assert_eq!(store.add(shorter.clone()).await.unwrap(), Outcome::Success);
    assert_eq!(store.get(3).await.unwrap(), Some(shorter));

    let payload = br#"{"title":"Lev","value":""}"#;
    let bytes = store.slot_bytes(3).unwrap();
    assert_eq!(&bytes[..payload.len()], payload);
    assert!(bytes[payload.len()..].iter().all(|&b| b == 0));
}

#[tokio::test]
async fn test_deleted_slot_is_zeroed() {
    let store = SlottedStore::new(4, 40, Template::default()).unwrap();
    let _ = store.add(record(2, "Pyotr Pervy", "tsar")).await.unwrap();
    assert!(store.slot_bytes(2).unwrap().iter().any(|&b| b != 0));

    let _ = store.delete(2).await.unwrap();
    assert!(store.slot_bytes(2).unwrap().iter().all(|&b| b == 0));
}

#[tokio::test]
async fn test_shorter_update_clears_old_tail() {
    let store = SlottedStore::new(4, 40, Template::default()).unwrap();
    let _ = store.add(record(1, "a much longer title", "value")).await.unwrap();
    let _ = store.update(record(1, "x", "")).await.unwrap();

    let bytes = store.slot_bytes(1).unwrap();
    let payload_len = bytes.iter().rposition(|&b| b != 0).unwrap() + 1;
    assert_eq!(&bytes[..payload_len], br#"{"title":"x","value":""}"#);
    assert_eq!(store.get(1).await.unwrap(), Some(record(1, "x", "")));
}

#[tokio::test]
async fn test_slotted_bounds_are_hard_errors() {
    let store = SlottedStore::new(4, 40, Template::default()).unwrap();

    for id in [0, 5, 1000] {
        assert!(matches!(
            store.add(record(id, "x", "")).await,
            Err(Error::OutOfRange { capacity: 4, .. })
        ));
        assert_eq!(store.get(id).await.unwrap(), None);
        assert_eq!(store.delete(id).await.unwrap(), Outcome::NotFound);
        assert_eq!(store.update(record(id, "x", "")).await.unwrap(), Outcome::NotFound);
    }
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_oversize_payload_is_rejected_untouched() {
    let store = SlottedStore::new(4, 16, Template::default()).unwrap();
    let _ = store.add(record(1, "short", "")).await.unwrap();
    let before = store.slot_bytes(1).unwrap();

    let long = "x".repeat(64);
    assert!(matches!(
        store.update(record(1, &long, "")).await,
        Err(Error::Serialization(_))
    ));
    assert!(matches!(
        store.add(record(2, &long, "")).await,
        Err(Error::Serialization(_))
    ));
    assert_eq!(store.slot_bytes(1).unwrap(), before);
    assert!(store.slot_bytes(2).unwrap().iter().all(|&b| b == 0));
}

#[tokio::test]
async fn test_capacity_four_scenario() {
    let template = Template::default();
    let store = SlottedStore::new(4, 40, template.clone()).unwrap();

    assert_eq!(store.add(template.blank(1, "A")).await.unwrap(), Outcome::Success);
    assert_eq!(store.add(template.blank(1, "B")).await.unwrap(), Outcome::AlreadyExists);
    assert_eq!(store.get(1).await.unwrap(), Some(template.blank(1, "A")));
    assert_eq!(store.update(template.blank(1, "C")).await.unwrap(), Outcome::Success);
    assert_eq!(store.get(1).await.unwrap(), Some(template.blank(1, "C")));
    assert_eq!(store.delete(1).await.unwrap(), Outcome::Success);
    assert_eq!(store.get(1).await.unwrap(), None);
    assert!(store.add(template.blank(5, "x")).await.is_err());
}

#[tokio::test]
async fn test_search_matches_first_field() {
    for backend in backends() {
        let _ = backend.add(record(1, "Aleksandr Pushkin", "poet")).await.unwrap();
        let _ = backend.add(record(2, "Lev Tolstoy", "Pushkin fan")).await.unwrap();

        let hits: Vec<RecordId> = backend
            .search("Pushkin")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(hits, vec![1], "{:?}", backend);
        assert!(backend.search("pushkin").await.unwrap().is_empty());
        assert_eq!(backend.search("").await.unwrap().len(), 2);
    }
}

#[tokio::test]
async fn test_pages_past_the_end_are_empty() {
    for backend in backends() {
        for id in 1..=12 {
            let _ = backend.add(record(id, "r", "")).await.unwrap();
        }
        assert_eq!(backend.page_count().await.unwrap(), 2);
        assert_eq!(backend.list_paginated(1).await.unwrap().len(), 10);
        assert_eq!(backend.list_paginated(2).await.unwrap().len(), 2);
        assert!(backend.list_paginated(3).await.unwrap().is_empty());
        assert!(backend.list_paginated(0).await.unwrap().is_empty());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The union of all pages is the full listing, with no duplicates
    #[test]
    fn prop_pagination_is_complete(ids in proptest::collection::btree_set(1..=CAPACITY as u64, 0..CAPACITY)) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            for backend in backends() {
                for &id in &ids {
                    let _ = backend.add(record(id, "r", "")).await.unwrap();
                }

                let count = backend.count().await.unwrap();
                prop_assert_eq!(count, ids.len());

                let mut paged = Vec::new();
                for page in 1..=pages_for(count) {
                    paged.extend(backend.list_paginated(page).await.unwrap().into_iter().map(|r| r.id));
                }
                let unique: BTreeSet<RecordId> = paged.iter().copied().collect();
                prop_assert_eq!(unique.len(), paged.len());

                let listed: BTreeSet<RecordId> =
                    backend.list().await.unwrap().into_iter().map(|r| r.id).collect();
                prop_assert_eq!(&unique, &listed);
                prop_assert_eq!(&listed, &ids);
            }
            Ok(())
        })?;
    }
}
