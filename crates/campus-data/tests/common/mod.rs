//! Test doubles shared by the integration tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use campus_data::config::StoreConfig;
use campus_data::connection::{Connection, ConnectionFactory};
use campus_data::error::{Error, Result};
use campus_data::types::{Row, Value};

/// A statement captured by the fake connection
pub type CapturedStatement = (String, Vec<Value>);

/// A fake connection that records every statement and answers from a
/// configurable response queue (empty row set once the queue runs dry).
pub struct FakeConnection {
    log: Arc<Mutex<Vec<CapturedStatement>>>,
    responses: Arc<Mutex<VecDeque<Vec<Row>>>>,
    valid: Arc<AtomicBool>,
}

#[async_trait]
impl Connection for FakeConnection {
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.log
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        self.log
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        Ok(1)
    }

    async fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Relaxed)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Factory handing out [`FakeConnection`]s that share one statement log and
/// one response queue. Flip `fail` to simulate an unreachable store.
#[derive(Default)]
pub struct FakeFactory {
    log: Arc<Mutex<Vec<CapturedStatement>>>,
    responses: Arc<Mutex<VecDeque<Vec<Row>>>>,
    attempts: AtomicUsize,
    fail: AtomicBool,
    valid: Arc<AtomicBool>,
}

impl FakeFactory {
    pub fn new() -> Arc<Self> {
        let factory = Self::default();
        factory.valid.store(true, Ordering::Relaxed);
        Arc::new(factory)
    }

    /// A factory whose every connection attempt is refused
    pub fn unreachable() -> Arc<Self> {
        let factory = Self::new();
        factory.fail.store(true, Ordering::Relaxed);
        factory
    }

    /// Queue one row set to answer the next query
    pub fn push_response(&self, rows: Vec<Row>) {
        self.responses.lock().unwrap().push_back(rows);
    }

    /// Every statement any connection has executed, in order
    pub fn statements(&self) -> Vec<CapturedStatement> {
        self.log.lock().unwrap().clone()
    }

    /// Number of connection attempts, successful or not
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ConnectionFactory for FakeFactory {
    async fn connect(&self, _config: &StoreConfig) -> Result<Box<dyn Connection>> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        if self.fail.load(Ordering::Relaxed) {
            return Err(Error::connectivity("connection refused"));
        }
        Ok(Box::new(FakeConnection {
            log: Arc::clone(&self.log),
            responses: Arc::clone(&self.responses),
            valid: Arc::clone(&self.valid),
        }))
    }
}

/// Build a row from (column, value) pairs
pub fn row(pairs: &[(&str, Value)]) -> Row {
    Row::new(
        pairs.iter().map(|(k, _)| k.to_string()).collect(),
        pairs.iter().map(|(_, v)| v.clone()).collect(),
    )
}

/// Build a record from (field, value) pairs
pub fn record(pairs: &[(&str, Value)]) -> campus_data::Record {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
