//! Environment-adaptive store: mode selection plus dispatch
//!
//! `AdaptiveStore` presents the [`DataStore`] contract and decides, per
//! call, whether to execute against the pooled relational store or the
//! in-memory fallback. The decision is binary and made exactly once per
//! logical call; both backends are never consulted for the same call.
//!
//! Selection is re-evaluated on every call rather than cached, so a server
//! whose store becomes unreachable degrades gracefully on the next call,
//! and recovers the same way. A restricted (browser-like) environment short
//! circuits to the fallback without ever probing.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::config::StoreConfig;
use crate::environment::Environment;
use crate::error::Result;
use crate::fallback::FallbackStore;
use crate::notify::{LogNotifier, Notification, Notifier};
use crate::pool::PoolManager;
use crate::query::ReadOptions;
use crate::store::{DataStore, Deleted, PooledStore};
use crate::types::{Filter, Record};

/// The environment-adaptive data access API.
pub struct AdaptiveStore {
    environment: Environment,
    pool: Arc<PoolManager>,
    pooled: PooledStore,
    fallback: FallbackStore,
    notifier: Arc<dyn Notifier>,
}

impl AdaptiveStore {
    /// Assemble the full stack from configuration: detected environment,
    /// PostgreSQL-backed pool, empty fallback, `tracing` notifications.
    pub fn new(config: StoreConfig) -> Self {
        let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
        let pool = Arc::new(PoolManager::new(config));
        Self::with_parts(
            Arc::clone(&pool),
            FallbackStore::new(Arc::clone(&notifier)),
            notifier,
            Environment::detect(),
        )
    }

    /// Assemble from injected collaborators (tests swap in a fake pool
    /// factory, a capturing notifier, or a forced environment).
    pub fn with_parts(
        pool: Arc<PoolManager>,
        fallback: FallbackStore,
        notifier: Arc<dyn Notifier>,
        environment: Environment,
    ) -> Self {
        Self {
            environment,
            pooled: PooledStore::with_notifier(Arc::clone(&pool), Arc::clone(&notifier)),
            pool,
            fallback,
            notifier,
        }
    }

    /// The pool handle, for lifecycle control (shutdown) and statistics
    pub fn pool(&self) -> &Arc<PoolManager> {
        &self.pool
    }

    /// The in-memory fallback backend
    pub fn fallback(&self) -> &FallbackStore {
        &self.fallback
    }

    /// Decide the backend for one call.
    ///
    /// Restricted environments always use the fallback. Otherwise the pool
    /// is probed; an acquisition failure selects the fallback for this call
    /// and announces the degradation, distinguishing "no connectivity" from
    /// a hard error.
    pub async fn should_use_fallback(&self) -> bool {
        if self.environment.is_restricted() {
            return true;
        }

        match self.pool.probe().await {
            Ok(()) => false,
            Err(e) if e.triggers_fallback() => {
                self.notifier.notify(Notification::warning(format!(
                    "store unreachable, using in-memory fallback: {}",
                    e
                )));
                true
            }
            Err(e) => {
                self.notifier.notify(Notification::error(format!(
                    "store probe failed: {}",
                    e
                )));
                true
            }
        }
    }

    fn backend(&self, use_fallback: bool) -> &dyn DataStore {
        debug!(fallback = use_fallback, "selected backend");
        if use_fallback {
            &self.fallback
        } else {
            &self.pooled
        }
    }
}

#[async_trait]
impl DataStore for AdaptiveStore {
    async fn read_collection(&self, table: &str, options: &ReadOptions) -> Result<Vec<Record>> {
        let use_fallback = self.should_use_fallback().await;
        self.backend(use_fallback)
            .read_collection(table, options)
            .await
    }

    async fn read_view(&self, view: &str, params: Option<&Filter>) -> Result<Vec<Record>> {
        let use_fallback = self.should_use_fallback().await;
        self.backend(use_fallback).read_view(view, params).await
    }

    async fn insert(&self, table: &str, record: Record) -> Result<Record> {
        let use_fallback = self.should_use_fallback().await;
        self.backend(use_fallback).insert(table, record).await
    }

    async fn update(&self, table: &str, id: &str, changes: Record) -> Result<Record> {
        let use_fallback = self.should_use_fallback().await;
        self.backend(use_fallback).update(table, id, changes).await
    }

    async fn remove(&self, table: &str, id: &str) -> Result<Deleted> {
        let use_fallback = self.should_use_fallback().await;
        self.backend(use_fallback).remove(table, id).await
    }
}
