//! # campus-data
//!
//! Environment-adaptive data access layer for the Campus school-management
//! platform.
//!
//! One CRUD contract, two backends: a pooled PostgreSQL connection when the
//! process has direct store connectivity, and an in-memory substitute store
//! when it does not (a browser-hosted build, or a server whose store just
//! became unreachable). Callers never branch on where they are running.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use campus_data::prelude::*;
//!
//! // Configuration is read once at process start.
//! let config = StoreConfig::from_env()?;
//! let store = AdaptiveStore::new(config);
//!
//! // Schema-agnostic CRUD: field maps in, field maps out.
//! let mut record = Record::new();
//! record.insert("title".into(), Value::String("1984".into()));
//! let stored = store.insert("books", record).await?;
//!
//! let options = ReadOptions::new()
//!     .with_filter(Filter::from([("available".into(), Value::Bool(true))]))
//!     .with_order_by("title", OrderDirection::Asc)
//!     .with_limit(20);
//! let books = store.read_collection("books", &options).await?;
//! ```
//!
//! ## Mode selection
//!
//! Every public operation consults the mode detector first: a restricted
//! environment always uses the fallback; otherwise a pool probe decides,
//! per call, so connectivity loss degrades gracefully and recovery is
//! picked up on the next call. Exactly one backend executes each call.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adaptive;
pub mod config;
pub mod connection;
pub mod environment;
pub mod error;
pub mod fallback;
pub mod notify;
pub mod pool;
pub mod postgres;
pub mod query;
pub mod security;
pub mod store;
pub mod types;

/// Prelude module for convenient imports
pub mod prelude {
    // Error types
    pub use crate::error::{Error, ErrorCategory, Result};

    // Value and record types
    pub use crate::types::{Filter, Record, Row, Value};

    // Configuration and environment
    pub use crate::config::{StoreConfig, TlsMode};
    pub use crate::environment::Environment;

    // Query construction
    pub use crate::query::{OrderDirection, QuerySpec, ReadOptions};

    // Connection and pool
    pub use crate::connection::{Connection, ConnectionFactory};
    pub use crate::pool::{PoolManager, PoolStats, PooledConnection};
    pub use crate::postgres::PgConnectionFactory;

    // Stores
    pub use crate::adaptive::AdaptiveStore;
    pub use crate::fallback::FallbackStore;
    pub use crate::store::{DataStore, Deleted, PooledStore};

    // Notifications
    pub use crate::notify::{LogNotifier, MemoryNotifier, Notification, NotificationLevel, Notifier};
}

// Re-export commonly used items at crate root
pub use error::{Error, Result};
pub use types::{Record, Value};
