//! Query construction for campus-data
//!
//! Pure functions that turn a table/view name, a field map, and a filter
//! map into parameterized SQL text plus a positional argument list. Data
//! values never appear in the query text; they travel only through the
//! argument list. Table and field names are caller-supplied identifiers and
//! are trusted verbatim here; validating them against an allow-list is the
//! boundary's job (see [`crate::security`]).

use crate::error::{Error, Result};
use crate::types::{Filter, Record, Value};

/// Sort direction for a read operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending
    Asc,
    /// Descending
    Desc,
}

impl OrderDirection {
    /// SQL keyword for this direction
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Caller-facing options for a read operation (everything but the table).
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Columns to select (None = all)
    pub select: Option<Vec<String>>,
    /// Equality filter, applied as a conjunction
    pub filter: Option<Filter>,
    /// Order specification (column, direction)
    pub order_by: Option<(String, OrderDirection)>,
    /// Row limit
    pub limit: Option<u64>,
}

impl ReadOptions {
    /// Create empty options (select everything)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the column projection
    pub fn with_select(mut self, columns: Vec<String>) -> Self {
        self.select = Some(columns);
        self
    }

    /// Set the equality filter
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set the order specification
    pub fn with_order_by(mut self, column: impl Into<String>, direction: OrderDirection) -> Self {
        self.order_by = Some((column.into(), direction));
        self
    }

    /// Set the row limit
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Structured description of a read, prior to rendering into SQL.
#[derive(Debug, Clone)]
pub struct QuerySpec {
    /// Table or view name
    pub table: String,
    /// Read options
    pub options: ReadOptions,
}

impl QuerySpec {
    /// Describe a full-table read
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            options: ReadOptions::default(),
        }
    }

    /// Describe a read with the given options
    pub fn for_read(table: impl Into<String>, options: ReadOptions) -> Self {
        Self {
            table: table.into(),
            options,
        }
    }
}

/// Positional placeholder in PostgreSQL syntax ($1, $2, ...)
fn placeholder(index: usize) -> String {
    format!("${}", index)
}

/// Build a `SELECT` statement for a collection read.
///
/// Filter keys are emitted in the map's iteration order; each becomes one
/// positional placeholder with its value appended to the argument list in
/// the same order. An absent or empty filter omits the `WHERE` clause
/// entirely.
pub fn build_select(spec: &QuerySpec) -> (String, Vec<Value>) {
    let fields = match &spec.options.select {
        Some(columns) if !columns.is_empty() => columns.join(", "),
        _ => "*".to_string(),
    };

    let mut sql = format!("SELECT {} FROM {}", fields, spec.table);
    let mut params = Vec::new();

    if let Some(filter) = &spec.options.filter {
        if !filter.is_empty() {
            let mut conditions = Vec::with_capacity(filter.len());
            for (key, value) in filter {
                conditions.push(format!("{} = {}", key, placeholder(params.len() + 1)));
                params.push(value.clone());
            }
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
    }

    if let Some((column, direction)) = &spec.options.order_by {
        sql.push_str(&format!(" ORDER BY {} {}", column, direction.as_sql()));
    }

    if let Some(limit) = spec.options.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }

    (sql, params)
}

/// Build a `SELECT` against a view, with `params` read as an equality filter.
pub fn build_view(view: &str, params: Option<&Filter>) -> (String, Vec<Value>) {
    let mut options = ReadOptions::new();
    if let Some(filter) = params {
        options = options.with_filter(filter.clone());
    }
    build_select(&QuerySpec::for_read(view, options))
}

/// Build an `INSERT ... RETURNING *` statement.
///
/// Rejects an empty record before any SQL exists.
pub fn build_insert(table: &str, record: &Record) -> Result<(String, Vec<Value>)> {
    if record.is_empty() {
        return Err(Error::empty_payload("insert", table));
    }

    let mut columns = Vec::with_capacity(record.len());
    let mut placeholders = Vec::with_capacity(record.len());
    let mut params = Vec::with_capacity(record.len());
    for (key, value) in record {
        columns.push(key.as_str());
        placeholders.push(placeholder(params.len() + 1));
        params.push(value.clone());
    }

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
        table,
        columns.join(", "),
        placeholders.join(", ")
    );
    Ok((sql, params))
}

/// Build an `UPDATE ... RETURNING *` statement targeting one id.
///
/// The id placeholder is one past the last change key. Rejects an empty
/// change set before any SQL exists.
pub fn build_update(table: &str, id: &str, changes: &Record) -> Result<(String, Vec<Value>)> {
    if changes.is_empty() {
        return Err(Error::empty_payload("update", table));
    }

    let mut assignments = Vec::with_capacity(changes.len());
    let mut params = Vec::with_capacity(changes.len() + 1);
    for (key, value) in changes {
        assignments.push(format!("{} = {}", key, placeholder(params.len() + 1)));
        params.push(value.clone());
    }

    let sql = format!(
        "UPDATE {} SET {} WHERE id = {} RETURNING *",
        table,
        assignments.join(", "),
        placeholder(params.len() + 1)
    );
    params.push(Value::String(id.to_owned()));
    Ok((sql, params))
}

/// Build a `DELETE ... RETURNING id` statement targeting one id.
pub fn build_delete(table: &str, id: &str) -> (String, Vec<Value>) {
    let sql = format!("DELETE FROM {} WHERE id = $1 RETURNING id", table);
    (sql, vec![Value::String(id.to_owned())])
}
