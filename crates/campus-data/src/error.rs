//! Error types for campus-data
//!
//! The taxonomy mirrors how callers are expected to react:
//! - `Connectivity` / `PoolExhausted` steer mode selection toward the
//!   fallback store instead of propagating
//! - `Store` is the driver's failure, passed through unchanged and untried
//! - `EmptyPayload` and `NotFound` are caller mistakes with distinct UI
//!   presentations ("nothing to save" / "not found", not "server error")

use thiserror::Error;

/// Result type for campus-data operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Store unreachable (selects fallback mode)
    Connectivity,
    /// Pool could not hand out a connection in time (selects fallback mode)
    PoolExhausted,
    /// Driver reported a failure executing a built query
    Store,
    /// Insert/update called with zero fields
    EmptyPayload,
    /// Update/delete target id does not exist
    NotFound,
    /// Configuration error
    Configuration,
}

impl ErrorCategory {
    /// Whether mode selection treats this as "no connectivity, use fallback"
    /// rather than a hard error to surface.
    #[inline]
    pub const fn triggers_fallback(self) -> bool {
        matches!(self, Self::Connectivity | Self::PoolExhausted)
    }
}

/// Main error type for campus-data
#[derive(Error, Debug)]
pub enum Error {
    /// Store unreachable: connection refused, timed out, or driver unavailable
    #[error("connectivity error: {message}")]
    Connectivity {
        /// Human-readable description
        message: String,
        /// Underlying driver error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Connection pool could not provide a connection within the timeout
    #[error("pool exhausted: {message}")]
    PoolExhausted {
        /// Human-readable description
        message: String,
    },

    /// The driver reported a failure executing a built query
    #[error("store error: {message}")]
    Store {
        /// Human-readable description
        message: String,
        /// The SQL text that failed, when known
        sql: Option<String>,
        /// Underlying driver error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Insert or update called with an empty field map
    #[error("empty payload: {operation} on {table} has no fields")]
    EmptyPayload {
        /// The operation that was rejected ("insert" or "update")
        operation: &'static str,
        /// The target table
        table: String,
    },

    /// Update or delete target id does not exist
    #[error("not found: {table} has no record with id {id}")]
    NotFound {
        /// The target table
        table: String,
        /// The missing identifier
        id: String,
    },

    /// Configuration error
    #[error("configuration error: {message}")]
    Configuration {
        /// Human-readable description
        message: String,
    },
}

impl Error {
    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Connectivity { .. } => ErrorCategory::Connectivity,
            Self::PoolExhausted { .. } => ErrorCategory::PoolExhausted,
            Self::Store { .. } => ErrorCategory::Store,
            Self::EmptyPayload { .. } => ErrorCategory::EmptyPayload,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Configuration { .. } => ErrorCategory::Configuration,
        }
    }

    /// Whether mode selection should degrade to the fallback store
    #[inline]
    pub fn triggers_fallback(&self) -> bool {
        self.category().triggers_fallback()
    }

    /// Create a connectivity error
    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::Connectivity {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connectivity error with source
    pub fn connectivity_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connectivity {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a pool exhaustion error
    pub fn pool_exhausted(message: impl Into<String>) -> Self {
        Self::PoolExhausted {
            message: message.into(),
        }
    }

    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
            sql: None,
            source: None,
        }
    }

    /// Create a store error carrying the SQL text that failed
    pub fn store_with_sql(message: impl Into<String>, sql: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
            sql: Some(sql.into()),
            source: None,
        }
    }

    /// Create an empty payload error
    pub fn empty_payload(operation: &'static str, table: impl Into<String>) -> Self {
        Self::EmptyPayload {
            operation,
            table: table.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(table: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            table: table.into(),
            id: id.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
