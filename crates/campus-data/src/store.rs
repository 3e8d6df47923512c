//! The data access contract and its pooled implementation
//!
//! `DataStore` is the capability interface every consumer programs against:
//! five operations, field maps in, field maps out. Two concrete
//! implementations exist, [`PooledStore`] over the connection pool here and
//! [`FallbackStore`](crate::fallback::FallbackStore) over in-memory
//! collections, with [`AdaptiveStore`](crate::adaptive::AdaptiveStore)
//! choosing between them per call.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::fallback::FallbackStore;
use crate::notify::{LogNotifier, Notification, Notifier};
use crate::pool::PoolManager;
use crate::query::{self, QuerySpec, ReadOptions};
use crate::types::{Filter, Record, Value};

/// Result of a delete operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deleted {
    /// The identifier that was removed
    pub id: String,
}

/// The uniform CRUD contract over whichever backend is in effect.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Read records from a table
    async fn read_collection(&self, table: &str, options: &ReadOptions) -> Result<Vec<Record>>;

    /// Read records from a view, with `params` as an equality filter
    async fn read_view(&self, view: &str, params: Option<&Filter>) -> Result<Vec<Record>>;

    /// Insert a record, returning it with its identifier
    async fn insert(&self, table: &str, record: Record) -> Result<Record>;

    /// Update the record with the given id, returning the updated record
    async fn update(&self, table: &str, id: &str, changes: Record) -> Result<Record>;

    /// Delete the record with the given id
    async fn remove(&self, table: &str, id: &str) -> Result<Deleted>;
}

/// `DataStore` over the pooled relational store.
pub struct PooledStore {
    pool: Arc<PoolManager>,
    notifier: Arc<dyn Notifier>,
}

impl PooledStore {
    /// Create a pooled store reporting outcomes through `tracing`
    pub fn new(pool: Arc<PoolManager>) -> Self {
        Self::with_notifier(pool, Arc::new(LogNotifier))
    }

    /// Create a pooled store with an injected notifier
    pub fn with_notifier(pool: Arc<PoolManager>, notifier: Arc<dyn Notifier>) -> Self {
        Self { pool, notifier }
    }

    /// Announce the outcome: failures always, successes when a message is
    /// given (mutations).
    fn report<T>(&self, result: Result<T>, success: Option<String>) -> Result<T> {
        match &result {
            Ok(_) => {
                if let Some(message) = success {
                    self.notifier.notify(Notification::info(message));
                }
            }
            Err(e) => self.notifier.notify(Notification::error(e.to_string())),
        }
        result
    }

    async fn run_read(&self, sql: String, params: Vec<Value>) -> Result<Vec<Record>> {
        let rows = self.pool.query(&sql, &params).await?;
        Ok(rows.into_iter().map(|row| row.into_record()).collect())
    }
}

#[async_trait]
impl DataStore for PooledStore {
    async fn read_collection(&self, table: &str, options: &ReadOptions) -> Result<Vec<Record>> {
        let (sql, params) = query::build_select(&QuerySpec::for_read(table, options.clone()));
        let result = self.run_read(sql, params).await;
        self.report(result, None)
    }

    async fn read_view(&self, view: &str, params: Option<&Filter>) -> Result<Vec<Record>> {
        let (sql, args) = query::build_view(view, params);
        let result = self.run_read(sql, args).await;
        self.report(result, None)
    }

    async fn insert(&self, table: &str, record: Record) -> Result<Record> {
        let result = async {
            let (sql, params) = query::build_insert(table, &record)?;
            let rows = self.pool.query(&sql, &params).await?;
            rows.into_iter()
                .next()
                .map(|row| row.into_record())
                .ok_or_else(|| Error::store_with_sql("insert returned no row", sql))
        }
        .await;
        self.report(result, Some(format!("saved to {}", table)))
    }

    async fn update(&self, table: &str, id: &str, changes: Record) -> Result<Record> {
        let result = async {
            let (sql, params) = query::build_update(table, id, &changes)?;
            let rows = self.pool.query(&sql, &params).await?;
            rows.into_iter()
                .next()
                .map(|row| row.into_record())
                .ok_or_else(|| Error::not_found(table, id))
        }
        .await;
        self.report(result, Some(format!("updated {}", table)))
    }

    async fn remove(&self, table: &str, id: &str) -> Result<Deleted> {
        let result = async {
            let (sql, params) = query::build_delete(table, id);
            let rows = self.pool.query(&sql, &params).await?;
            let row = rows.into_iter().next().ok_or_else(|| Error::not_found(table, id))?;
            let id = row
                .get_by_name("id")
                .and_then(Value::as_string)
                .unwrap_or_else(|| id.to_owned());
            Ok(Deleted { id })
        }
        .await;
        self.report(result, Some(format!("deleted from {}", table)))
    }
}

#[async_trait]
impl DataStore for FallbackStore {
    async fn read_collection(&self, table: &str, options: &ReadOptions) -> Result<Vec<Record>> {
        Ok(FallbackStore::read_collection(self, table, options).await)
    }

    async fn read_view(&self, view: &str, params: Option<&Filter>) -> Result<Vec<Record>> {
        // Views are emulated as plain collections in memory.
        let mut options = ReadOptions::new();
        if let Some(filter) = params {
            options = options.with_filter(filter.clone());
        }
        debug!(view, "fallback view read");
        Ok(FallbackStore::read_collection(self, view, &options).await)
    }

    async fn insert(&self, table: &str, record: Record) -> Result<Record> {
        FallbackStore::insert(self, table, record).await
    }

    async fn update(&self, table: &str, id: &str, changes: Record) -> Result<Record> {
        FallbackStore::update(self, table, id, changes).await
    }

    async fn remove(&self, table: &str, id: &str) -> Result<Deleted> {
        FallbackStore::remove(self, table, id).await?;
        Ok(Deleted { id: id.to_owned() })
    }
}
