//! Connection pool manager for campus-data
//!
//! One `PoolManager` exists per process, constructed explicitly at startup
//! and shared by reference with every consumer of the data access API. The
//! underlying pool is created lazily on first use; concurrent first callers
//! await the same in-flight initialization instead of racing to build two
//! pools. After `shutdown` the next call re-enters lazy initialization.
//!
//! In a restricted (browser-like) environment every method fails
//! immediately with a connectivity error and performs no network activity.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::connection::{Connection, ConnectionFactory};
use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::postgres::PgConnectionFactory;
use crate::types::{Row, Value};

/// Pool statistics snapshot
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Total number of connections created
    pub connections_created: u64,
    /// Total number of connections closed
    pub connections_closed: u64,
    /// Total number of connection acquisitions
    pub acquisitions: u64,
    /// Number of acquisitions that timed out waiting for a connection
    pub exhausted_count: u64,
    /// Total wait time for connections (in milliseconds)
    pub total_wait_time_ms: u64,
    /// Number of connections discarded after failing the borrow-time check
    pub validation_failures: u64,
}

/// Atomic pool stats for concurrent updates
#[derive(Debug, Default)]
struct AtomicPoolStats {
    connections_created: AtomicU64,
    connections_closed: AtomicU64,
    acquisitions: AtomicU64,
    exhausted_count: AtomicU64,
    total_wait_time_ms: AtomicU64,
    validation_failures: AtomicU64,
}

impl AtomicPoolStats {
    fn record_created(&self) {
        self.connections_created.fetch_add(1, Ordering::Relaxed);
    }

    fn record_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_acquisition(&self, wait_time_ms: u64) {
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        self.total_wait_time_ms
            .fetch_add(wait_time_ms, Ordering::Relaxed);
    }

    fn record_exhausted(&self) {
        self.exhausted_count.fetch_add(1, Ordering::Relaxed);
    }

    fn record_validation_failure(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> PoolStats {
        PoolStats {
            connections_created: self.connections_created.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
            acquisitions: self.acquisitions.load(Ordering::Relaxed),
            exhausted_count: self.exhausted_count.load(Ordering::Relaxed),
            total_wait_time_ms: self.total_wait_time_ms.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
        }
    }
}

/// Idle pool entry with recycling metadata
struct IdleEntry {
    conn: Box<dyn Connection>,
    last_used: Instant,
}

/// The actual pool. Created lazily by [`PoolManager`], replaced wholesale
/// after a shutdown.
struct PoolCore {
    config: StoreConfig,
    factory: Arc<dyn ConnectionFactory>,
    /// Idle connections, LIFO
    idle: Mutex<Vec<IdleEntry>>,
    /// Bounds total connections at `config.pool_max_size`
    semaphore: Semaphore,
    total: AtomicUsize,
    stats: Arc<AtomicPoolStats>,
    shut_down: AtomicBool,
}

impl PoolCore {
    fn new(
        config: StoreConfig,
        factory: Arc<dyn ConnectionFactory>,
        stats: Arc<AtomicPoolStats>,
    ) -> Arc<Self> {
        Arc::new(Self {
            semaphore: Semaphore::new(config.pool_max_size),
            idle: Mutex::new(Vec::with_capacity(config.pool_max_size)),
            config,
            factory,
            total: AtomicUsize::new(0),
            stats,
            shut_down: AtomicBool::new(false),
        })
    }

    async fn create_connection(&self) -> Result<Box<dyn Connection>> {
        let conn = self.factory.connect(&self.config).await?;
        self.total.fetch_add(1, Ordering::Release);
        self.stats.record_created();
        Ok(conn)
    }

    fn discard(&self) {
        self.total.fetch_sub(1, Ordering::Release);
        self.stats.record_closed();
    }

    async fn acquire(core: &Arc<Self>) -> Result<PooledConnection> {
        if core.shut_down.load(Ordering::Acquire) {
            return Err(Error::connectivity("pool is shut down"));
        }

        let start = Instant::now();

        let permit =
            tokio::time::timeout(core.config.connect_timeout, core.semaphore.acquire())
                .await
                .map_err(|_| {
                    core.stats.record_exhausted();
                    Error::pool_exhausted(format!(
                        "timed out waiting for a connection ({}ms)",
                        core.config.connect_timeout.as_millis()
                    ))
                })?
                .map_err(|_| Error::pool_exhausted("pool semaphore closed"))?;

        // Reuse an idle connection if a live one exists; recycle stale or
        // invalid entries on the way.
        let conn = {
            let mut idle = core.idle.lock().await;
            loop {
                match idle.pop() {
                    Some(entry) => {
                        if entry.last_used.elapsed() > core.config.idle_timeout {
                            core.discard();
                            continue;
                        }
                        if !entry.conn.is_valid().await {
                            core.discard();
                            core.stats.record_validation_failure();
                            continue;
                        }
                        break Some(entry.conn);
                    }
                    None => break None,
                }
            }
        };

        let conn = match conn {
            Some(c) => c,
            None => match core.create_connection().await {
                Ok(c) => c,
                Err(e) => {
                    drop(permit);
                    return Err(e);
                }
            },
        };

        core.stats
            .record_acquisition(start.elapsed().as_millis() as u64);

        // The permit is re-added when the connection comes back.
        permit.forget();

        Ok(PooledConnection {
            conn: Some(conn),
            core: Arc::clone(core),
        })
    }

    async fn return_connection(&self, conn: Box<dyn Connection>) {
        self.semaphore.add_permits(1);

        if self.shut_down.load(Ordering::Acquire) {
            let _ = conn.close().await;
            self.discard();
            return;
        }

        let mut idle = self.idle.lock().await;
        idle.push(IdleEntry {
            conn,
            last_used: Instant::now(),
        });
    }

    async fn close(&self) {
        self.shut_down.store(true, Ordering::Release);
        let mut idle = self.idle.lock().await;
        for entry in idle.drain(..) {
            let _ = entry.conn.close().await;
            self.discard();
        }
    }
}

/// A connection checked out of the pool, returned on drop.
pub struct PooledConnection {
    conn: Option<Box<dyn Connection>>,
    core: Arc<PoolCore>,
}

impl std::fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("checked_out", &self.conn.is_some())
            .finish()
    }
}

impl std::ops::Deref for PooledConnection {
    type Target = dyn Connection;

    fn deref(&self) -> &Self::Target {
        self.conn
            .as_ref()
            .expect("connection already returned")
            .as_ref()
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            let core = Arc::clone(&self.core);
            tokio::spawn(async move {
                core.return_connection(conn).await;
            });
        }
    }
}

/// The per-process pool handle.
///
/// Construct once from [`StoreConfig`], share by `Arc`. Tests swap the
/// [`ConnectionFactory`] for a capture double.
pub struct PoolManager {
    config: StoreConfig,
    factory: Arc<dyn ConnectionFactory>,
    environment: Environment,
    state: Mutex<Option<Arc<PoolCore>>>,
    stats: Arc<AtomicPoolStats>,
}

impl PoolManager {
    /// Create a pool manager over the PostgreSQL backend.
    pub fn new(config: StoreConfig) -> Self {
        Self::with_parts(config, Arc::new(PgConnectionFactory), Environment::detect())
    }

    /// Create a pool manager with an injected connection factory.
    pub fn with_factory(config: StoreConfig, factory: Arc<dyn ConnectionFactory>) -> Self {
        Self::with_parts(config, factory, Environment::detect())
    }

    /// Create a pool manager with every collaborator injected.
    pub fn with_parts(
        config: StoreConfig,
        factory: Arc<dyn ConnectionFactory>,
        environment: Environment,
    ) -> Self {
        Self {
            config,
            factory,
            environment,
            state: Mutex::new(None),
            stats: Arc::new(AtomicPoolStats::default()),
        }
    }

    /// Get the pool configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Lazily initialize and return the live pool.
    ///
    /// The state mutex is the `initializing` guard: whoever holds it first
    /// creates the pool, racing callers block on the lock and then see the
    /// initialized state.
    async fn core(&self) -> Result<Arc<PoolCore>> {
        if self.environment.is_restricted() {
            return Err(Error::connectivity(
                "no direct store connectivity in a restricted environment",
            ));
        }

        let mut state = self.state.lock().await;
        match state.as_ref() {
            Some(core) if !core.shut_down.load(Ordering::Acquire) => Ok(Arc::clone(core)),
            _ => {
                info!(
                    host = %self.config.host,
                    port = self.config.port,
                    database = %self.config.database,
                    max_size = self.config.pool_max_size,
                    "initializing connection pool"
                );
                let core = PoolCore::new(
                    self.config.clone(),
                    Arc::clone(&self.factory),
                    Arc::clone(&self.stats),
                );
                *state = Some(Arc::clone(&core));
                Ok(core)
            }
        }
    }

    /// Acquire a connection, initializing the pool if needed.
    pub async fn acquire(&self) -> Result<PooledConnection> {
        let core = self.core().await?;
        PoolCore::acquire(&core).await
    }

    /// Execute exactly one statement and return its rows.
    ///
    /// No implicit transaction, no retry; driver failures propagate as
    /// store errors.
    pub async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let conn = self.acquire().await?;
        debug!(sql, params = params.len(), "executing pooled statement");
        conn.query(sql, params).await
    }

    /// Connectivity check: acquire a connection and return it immediately.
    pub async fn probe(&self) -> Result<()> {
        self.acquire().await.map(drop)
    }

    /// Drain and close the pool. Subsequent calls re-enter lazy
    /// initialization with a fresh pool.
    pub async fn shutdown(&self) {
        let core = self.state.lock().await.take();
        if let Some(core) = core {
            info!("shutting down connection pool");
            core.close().await;
        }
    }

    /// Whether the underlying pool currently exists
    pub async fn is_initialized(&self) -> bool {
        self.state.lock().await.is_some()
    }

    /// Pool statistics, accumulated across shutdown/re-initialization
    pub fn stats(&self) -> PoolStats {
        self.stats.snapshot()
    }
}
