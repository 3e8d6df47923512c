//! Tests for the in-memory fallback store

mod common;

use std::sync::Arc;

use campus_data::error::Error;
use campus_data::fallback::FallbackStore;
use campus_data::notify::{MemoryNotifier, NotificationLevel};
use campus_data::query::ReadOptions;
use campus_data::types::{Filter, Value};
use common::record;

// ==================== Full CRUD Scenario ====================

/// The canonical fallback-mode walkthrough: insert, filtered read, update,
/// delete, empty read.
#[tokio::test]
async fn test_books_lifecycle() {
    let store = FallbackStore::default();
    assert!(store.read_collection("books", &ReadOptions::new()).await.is_empty());

    // Insert generates an id.
    let stored = store
        .insert(
            "books",
            record(&[
                ("title", Value::String("1984".into())),
                ("available", Value::Bool(true)),
            ]),
        )
        .await
        .unwrap();
    let id = stored.get("id").and_then(Value::as_string).unwrap();
    assert!(id.starts_with("mock-"));
    assert_eq!(stored.get("title"), Some(&Value::String("1984".into())));
    assert_eq!(stored.get("available"), Some(&Value::Bool(true)));

    // Filtered read returns exactly that record.
    let options = ReadOptions::new()
        .with_filter(Filter::from([("available".to_string(), Value::Bool(true))]));
    let found = store.read_collection("books", &options).await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0], stored);

    // Update flips one field, leaves the rest alone.
    let updated = store
        .update("books", &id, record(&[("available", Value::Bool(false))]))
        .await
        .unwrap();
    assert_eq!(updated.get("available"), Some(&Value::Bool(false)));
    assert_eq!(updated.get("title"), Some(&Value::String("1984".into())));
    assert_eq!(
        updated.get("id").and_then(Value::as_string).as_deref(),
        Some(id.as_str())
    );

    // Delete removes it; the collection is empty afterwards.
    store.remove("books", &id).await.unwrap();
    assert!(store.read_collection("books", &ReadOptions::new()).await.is_empty());

    // Second delete reports not-found, nothing else.
    let err = store.remove("books", &id).await.unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

// ==================== Filter Properties ====================

#[tokio::test]
async fn test_filtered_result_is_subset_and_satisfies_filter() {
    let store = FallbackStore::default();
    for (title, year, available) in [
        ("a", 2024, true),
        ("b", 2025, false),
        ("c", 2024, true),
        ("d", 2024, false),
    ] {
        store
            .insert(
                "books",
                record(&[
                    ("title", Value::String(title.into())),
                    ("year", Value::Int32(year)),
                    ("available", Value::Bool(available)),
                ]),
            )
            .await
            .unwrap();
    }

    let all = store.read_collection("books", &ReadOptions::new()).await;
    let filter = Filter::from([
        ("year".to_string(), Value::Int32(2024)),
        ("available".to_string(), Value::Bool(true)),
    ]);
    let filtered = store
        .read_collection(
            "books",
            &ReadOptions::new().with_filter(filter.clone()),
        )
        .await;

    // Every returned record satisfies every filter key.
    for found in &filtered {
        for (key, value) in &filter {
            assert_eq!(found.get(key), Some(value));
        }
    }
    // Filtered result is a subset of the unfiltered result.
    assert!(filtered.iter().all(|r| all.contains(r)));
    assert_eq!(filtered.len(), 2);
}

#[tokio::test]
async fn test_filter_on_unknown_field_matches_nothing() {
    let store = FallbackStore::default();
    store
        .insert("books", record(&[("title", Value::String("1984".into()))]))
        .await
        .unwrap();

    let options = ReadOptions::new()
        .with_filter(Filter::from([("genre".to_string(), Value::String("x".into()))]));
    assert!(store.read_collection("books", &options).await.is_empty());
}

// ==================== Identifier Generation ====================

#[tokio::test]
async fn test_generated_ids_are_unique_and_monotonic() {
    let store = FallbackStore::default();
    let mut ids = Vec::new();
    for i in 0..5 {
        let stored = store
            .insert("books", record(&[("n", Value::Int32(i))]))
            .await
            .unwrap();
        ids.push(stored.get("id").and_then(Value::as_string).unwrap());
    }

    let mut deduped = ids.clone();
    deduped.dedup();
    assert_eq!(deduped.len(), 5);
    assert_eq!(ids[0], "mock-1");
    assert_eq!(ids[4], "mock-5");
}

// ==================== Notifications ====================

#[tokio::test]
async fn test_every_mutation_notifies_with_session_flag() {
    let notifier = Arc::new(MemoryNotifier::new());
    let store = FallbackStore::new(notifier.clone());

    let stored = store
        .insert("books", record(&[("title", Value::String("1984".into()))]))
        .await
        .unwrap();
    let id = stored.get("id").and_then(Value::as_string).unwrap();
    store
        .update("books", &id, record(&[("title", Value::String("x".into()))]))
        .await
        .unwrap();
    store.remove("books", &id).await.unwrap();
    let _ = store.remove("books", &id).await;

    let captured = notifier.captured();
    assert_eq!(captured.len(), 4);
    assert!(captured.iter().all(|n| n.session_only));
    assert_eq!(captured[0].level, NotificationLevel::Info);
    assert_eq!(captured[3].level, NotificationLevel::Error);
}

// ==================== Insertion Order ====================

#[tokio::test]
async fn test_unordered_read_preserves_insertion_order() {
    let store = FallbackStore::default();
    for title in ["z", "a", "m"] {
        store
            .insert("books", record(&[("title", Value::String(title.into()))]))
            .await
            .unwrap();
    }

    let all = store.read_collection("books", &ReadOptions::new()).await;
    let titles: Vec<_> = all
        .iter()
        .map(|r| r.get("title").and_then(Value::as_string).unwrap())
        .collect();
    assert_eq!(titles, vec!["z", "a", "m"]);
}
