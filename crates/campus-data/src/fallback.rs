//! In-memory fallback store for campus-data
//!
//! When the process has no direct store connectivity, the data access API
//! runs against these per-table record collections instead. Collections are
//! created on first reference, keep insertion order, live for the process
//! lifetime, and are never persisted; every mutation announces that the
//! data is session-only.
//!
//! Mutations are synchronous memory operations under one async mutex, so
//! logically concurrent calls interleave only between operations, never in
//! the middle of one.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::notify::{LogNotifier, Notification, Notifier};
use crate::query::ReadOptions;
use crate::types::{Record, Value};

/// Per-table in-memory record collections with CRUD semantics matching the
/// pooled store.
pub struct FallbackStore {
    tables: Mutex<HashMap<String, Vec<Record>>>,
    next_id: AtomicU64,
    notifier: Arc<dyn Notifier>,
}

impl FallbackStore {
    /// Create an empty fallback store
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            notifier,
        }
    }

    /// Create a store seeded with a few example records for well-known
    /// tables. A demo convenience, not a correctness requirement.
    pub fn with_demo_data(notifier: Arc<dyn Notifier>) -> Self {
        let store = Self::new(notifier);
        let mut tables = HashMap::new();
        tables.insert(
            "students".to_string(),
            vec![
                demo_record(&store, &[
                    ("name", Value::String("Ada Lovelace".into())),
                    ("year", Value::Int32(2)),
                ]),
                demo_record(&store, &[
                    ("name", Value::String("Alan Turing".into())),
                    ("year", Value::Int32(3)),
                ]),
            ],
        );
        tables.insert(
            "courses".to_string(),
            vec![
                demo_record(&store, &[
                    ("title", Value::String("Algorithms".into())),
                    ("credits", Value::Int32(6)),
                ]),
                demo_record(&store, &[
                    ("title", Value::String("Databases".into())),
                    ("credits", Value::Int32(5)),
                ]),
            ],
        );
        *store.tables.try_lock().expect("store not yet shared") = tables;
        store
    }

    fn next_mock_id(&self) -> String {
        format!("mock-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Number of records currently held for `table`
    pub async fn len(&self, table: &str) -> usize {
        self.tables
            .lock()
            .await
            .get(table)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Read records matching the given options.
    pub async fn read_collection(&self, table: &str, options: &ReadOptions) -> Vec<Record> {
        let mut tables = self.tables.lock().await;
        let records = tables.entry(table.to_string()).or_default();

        let mut result: Vec<Record> = records
            .iter()
            .filter(|record| matches_filter(record, options))
            .cloned()
            .collect();

        if let Some((column, direction)) = &options.order_by {
            // Stable sort keeps insertion order for ties and incomparable
            // values.
            result.sort_by(|a, b| {
                let ordering = match (a.get(column.as_str()), b.get(column.as_str())) {
                    (Some(left), Some(right)) => {
                        left.compare(right).unwrap_or(std::cmp::Ordering::Equal)
                    }
                    _ => std::cmp::Ordering::Equal,
                };
                match direction {
                    crate::query::OrderDirection::Asc => ordering,
                    crate::query::OrderDirection::Desc => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = options.limit {
            result.truncate(limit as usize);
        }

        if let Some(select) = &options.select {
            for record in &mut result {
                record.retain(|key, _| select.iter().any(|col| col == key));
            }
        }

        debug!(table, matched = result.len(), "fallback read");
        result
    }

    /// Append a record, generating a `mock-` identifier when none was
    /// supplied. Returns the stored record.
    pub async fn insert(&self, table: &str, mut record: Record) -> Result<Record> {
        if record.is_empty() {
            return Err(Error::empty_payload("insert", table));
        }

        if !record.contains_key("id") {
            record.insert("id".to_string(), Value::String(self.next_mock_id()));
        }

        let mut tables = self.tables.lock().await;
        tables
            .entry(table.to_string())
            .or_default()
            .push(record.clone());

        self.notifier.notify(
            Notification::info(format!("saved to {} for this session only", table))
                .session_only(),
        );
        Ok(record)
    }

    /// Update the record with the given id, merging `changes` over it.
    ///
    /// A missing id is a not-found error: this collection only ever holds
    /// what the fallback itself inserted, so data that exists solely in the
    /// real store behind it counts as absent here too.
    pub async fn update(&self, table: &str, id: &str, changes: Record) -> Result<Record> {
        if changes.is_empty() {
            return Err(Error::empty_payload("update", table));
        }

        let mut tables = self.tables.lock().await;
        let records = tables.entry(table.to_string()).or_default();

        let Some(record) = records.iter_mut().find(|r| has_id(r, id)) else {
            self.notifier.notify(
                Notification::error(format!("nothing to update in {} for id {}", table, id))
                    .session_only(),
            );
            return Err(Error::not_found(table, id));
        };

        for (key, value) in changes {
            record.insert(key, value);
        }
        let updated = record.clone();

        self.notifier.notify(
            Notification::info(format!("updated {} for this session only", table))
                .session_only(),
        );
        Ok(updated)
    }

    /// Remove the record with the given id, reporting success explicitly.
    pub async fn remove(&self, table: &str, id: &str) -> Result<()> {
        let mut tables = self.tables.lock().await;
        let records = tables.entry(table.to_string()).or_default();

        let Some(position) = records.iter().position(|r| has_id(r, id)) else {
            self.notifier.notify(
                Notification::error(format!("nothing to delete in {} for id {}", table, id))
                    .session_only(),
            );
            return Err(Error::not_found(table, id));
        };

        records.remove(position);
        self.notifier.notify(
            Notification::info(format!("deleted from {} for this session only", table))
                .session_only(),
        );
        Ok(())
    }
}

impl Default for FallbackStore {
    fn default() -> Self {
        Self::new(Arc::new(LogNotifier))
    }
}

fn demo_record(store: &FallbackStore, fields: &[(&str, Value)]) -> Record {
    let mut record: Record = fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    record.insert("id".to_string(), Value::String(store.next_mock_id()));
    record
}

fn matches_filter(record: &Record, options: &ReadOptions) -> bool {
    match &options.filter {
        Some(filter) => filter
            .iter()
            .all(|(key, value)| record.get(key) == Some(value)),
        None => true,
    }
}

fn has_id(record: &Record, id: &str) -> bool {
    record
        .get("id")
        .and_then(Value::as_string)
        .is_some_and(|candidate| candidate == id)
}
