//! Connection traits for campus-data
//!
//! The seam between the pool and the concrete driver. The pool owns
//! lifecycle; a `Connection` executes exactly one statement per call. No
//! transactions, prepared statements, or streaming: those belong to the
//! underlying driver and are not re-exposed by this layer.

use async_trait::async_trait;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::types::{Row, Value};

/// A live connection to the relational store.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Execute a query that returns rows
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Execute a statement that modifies data, returns affected row count
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Check if the connection is still usable
    async fn is_valid(&self) -> bool;

    /// Close the connection
    async fn close(&self) -> Result<()>;
}

/// Factory for creating connections.
///
/// The pool depends on this trait, not on a driver; tests inject a capture
/// double here to observe exactly which statements reach the store.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    /// Establish a new connection from the fixed configuration
    async fn connect(&self, config: &StoreConfig) -> Result<Box<dyn Connection>>;
}
