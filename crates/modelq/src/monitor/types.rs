use super::truncate_bytes;
use crate::dialect::Dialect;
use crate::value::{Value, format_params};
use std::fmt;
use std::time::Duration;

/// The type of SQL statement being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    Other,
}

impl QueryType {
    /// Detect the statement type from its leading keyword.
    pub fn from_sql(sql: &str) -> Self {
        let keyword = sql
            .trim_start()
            .split(|c: char| c.is_whitespace() || c == '(')
            .next()
            .unwrap_or("");
        if keyword.eq_ignore_ascii_case("SELECT") {
            QueryType::Select
        } else if keyword.eq_ignore_ascii_case("INSERT") {
            QueryType::Insert
        } else if keyword.eq_ignore_ascii_case("UPDATE") {
            QueryType::Update
        } else if keyword.eq_ignore_ascii_case("DELETE") {
            QueryType::Delete
        } else {
            QueryType::Other
        }
    }
}

/// What a monitor sees about one statement.
#[derive(Debug, Clone)]
pub struct QueryContext {
    /// Rendered SQL, as sent to the driver.
    pub sql: String,
    /// Bound parameters, in placeholder order.
    pub params: Vec<Value>,
    pub query_type: QueryType,
    pub dialect: Dialect,
}

impl QueryContext {
    pub fn new(sql: &str, params: &[Value], dialect: Dialect) -> Self {
        Self {
            sql: sql.to_string(),
            params: params.to_vec(),
            query_type: QueryType::from_sql(sql),
            dialect,
        }
    }

    pub fn params_display(&self) -> String {
        format_params(&self.params)
    }
}

/// Maximum length for error messages in `QueryResult::Error`.
const MAX_ERROR_LEN: usize = 512;

/// Outcome of one statement, for monitoring purposes.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// Rows handed to the row visitor.
    Rows(usize),
    /// Rows affected by a write.
    Affected(u64),
    /// Failure, truncated to 512 bytes.
    Error(String),
}

impl QueryResult {
    /// Create an error result, truncating the message.
    pub fn error(msg: String) -> Self {
        if msg.len() > MAX_ERROR_LEN {
            Self::Error(format!("{}...", truncate_bytes(&msg, MAX_ERROR_LEN)))
        } else {
            Self::Error(msg)
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, QueryResult::Error(_))
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Rows(n) => write!(f, "{n} rows"),
            QueryResult::Affected(n) => write!(f, "{n} affected"),
            QueryResult::Error(e) => write!(f, "error: {e}"),
        }
    }
}

/// Observer of statement execution.
///
/// Handed to [`super::InstrumentedClient`] at construction.
pub trait QueryMonitor: Send + Sync {
    /// Called before a statement is executed. Default does nothing.
    fn on_query_start(&self, _ctx: &QueryContext) {}

    /// Called after a statement completes, successfully or not.
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult);

    /// Called when a statement exceeds the client's slow-query threshold.
    fn on_slow_query(&self, _ctx: &QueryContext, _duration: Duration) {}
}
