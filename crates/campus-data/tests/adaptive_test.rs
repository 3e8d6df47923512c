//! Tests for mode selection and adaptive dispatch

mod common;

use std::sync::Arc;
use std::time::Duration;

use campus_data::adaptive::AdaptiveStore;
use campus_data::config::StoreConfig;
use campus_data::environment::Environment;
use campus_data::fallback::FallbackStore;
use campus_data::notify::{MemoryNotifier, NotificationLevel};
use campus_data::pool::PoolManager;
use campus_data::query::ReadOptions;
use campus_data::store::DataStore;
use campus_data::types::{Filter, Value};
use common::{FakeFactory, record, row};

fn adaptive_store(
    factory: Arc<FakeFactory>,
    environment: Environment,
) -> (AdaptiveStore, Arc<MemoryNotifier>) {
    let config = StoreConfig::default().with_connect_timeout(Duration::from_millis(200));
    let pool = Arc::new(PoolManager::with_parts(config, factory, environment));
    let notifier = Arc::new(MemoryNotifier::new());
    let fallback = FallbackStore::new(notifier.clone());
    (
        AdaptiveStore::with_parts(pool, fallback, notifier.clone(), environment),
        notifier,
    )
}

// ==================== Restricted Environment ====================

#[tokio::test]
async fn test_restricted_environment_is_stable_fallback() {
    let factory = FakeFactory::new();
    let (store, _) = adaptive_store(factory.clone(), Environment::Restricted);

    // Once fallback, always fallback: no flip-flopping in one environment.
    for _ in 0..3 {
        assert!(store.should_use_fallback().await);
    }

    let stored = store
        .insert("books", record(&[("title", Value::String("1984".into()))]))
        .await
        .unwrap();
    assert!(
        stored
            .get("id")
            .and_then(Value::as_string)
            .unwrap()
            .starts_with("mock-")
    );

    // The pool was never initialized and no connection was ever attempted.
    assert!(!store.pool().is_initialized().await);
    assert_eq!(factory.attempts(), 0);
}

// ==================== Degradation ====================

#[tokio::test]
async fn test_unreachable_store_degrades_to_fallback() {
    let factory = FakeFactory::unreachable();
    let (store, notifier) = adaptive_store(factory.clone(), Environment::Server);

    let stored = store
        .insert("books", record(&[("title", Value::String("1984".into()))]))
        .await
        .unwrap();

    // The probe tried the pool, failed, and the call ran in memory instead.
    assert!(factory.attempts() > 0);
    assert!(factory.statements().is_empty());
    assert_eq!(store.fallback().len("books").await, 1);
    assert_eq!(stored.get("title"), Some(&Value::String("1984".into())));

    // Degradation is announced as a warning, not a hard error.
    let captured = notifier.captured();
    assert!(
        captured
            .iter()
            .any(|n| n.level == NotificationLevel::Warning
                && n.message.contains("fallback"))
    );
}

#[tokio::test]
async fn test_degraded_reads_see_fallback_writes() {
    let factory = FakeFactory::unreachable();
    let (store, _) = adaptive_store(factory.clone(), Environment::Server);

    store
        .insert(
            "books",
            record(&[
                ("title", Value::String("1984".into())),
                ("available", Value::Bool(true)),
            ]),
        )
        .await
        .unwrap();

    let options = ReadOptions::new()
        .with_filter(Filter::from([("available".to_string(), Value::Bool(true))]));
    let found = store.read_collection("books", &options).await.unwrap();
    assert_eq!(found.len(), 1);
}

// ==================== Pooled Mode ====================

#[tokio::test]
async fn test_reachable_store_uses_pool_not_fallback() {
    let factory = FakeFactory::new();
    let (store, _) = adaptive_store(factory.clone(), Environment::Server);

    assert!(!store.should_use_fallback().await);

    factory.push_response(vec![row(&[
        ("id", Value::String("b-1".into())),
        ("title", Value::String("1984".into())),
    ])]);
    let stored = store
        .insert("books", record(&[("title", Value::String("1984".into()))]))
        .await
        .unwrap();

    assert_eq!(stored.get("id"), Some(&Value::String("b-1".into())));
    // Exactly one backend per call: the statement went to the store and the
    // in-memory collection stayed empty.
    assert_eq!(factory.statements().len(), 1);
    assert_eq!(store.fallback().len("books").await, 0);
}

#[tokio::test]
async fn test_empty_insert_rejected_without_sql_in_pooled_mode() {
    let factory = FakeFactory::new();
    let (store, _) = adaptive_store(factory.clone(), Environment::Server);

    let err = store.insert("books", record(&[])).await.unwrap_err();
    assert!(matches!(
        err,
        campus_data::Error::EmptyPayload { operation: "insert", .. }
    ));
    assert!(factory.statements().is_empty());
}

// ==================== Per-Call Re-Evaluation ====================

#[tokio::test]
async fn test_mode_is_reevaluated_after_shutdown() {
    let factory = FakeFactory::new();
    let (store, _) = adaptive_store(factory.clone(), Environment::Server);

    assert!(!store.should_use_fallback().await);

    // Shutting the pool down does not strand the API: the next call
    // re-enters lazy initialization and lands back in pooled mode.
    store.pool().shutdown().await;
    assert!(!store.should_use_fallback().await);
    assert!(store.pool().is_initialized().await);
}
