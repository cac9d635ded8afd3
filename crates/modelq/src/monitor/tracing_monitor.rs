use super::truncate_bytes;
use super::types::{QueryContext, QueryMonitor, QueryResult};
use std::time::Duration;
use tracing::Level;

/// Emits one `tracing` event per statement on target `modelq.sql`.
///
/// Successful statements are logged at [`TracingMonitor::level`]; failures
/// at `WARN`, slow statements at `WARN` as well.
///
/// Enable via the crate feature: `modelq = { features = ["tracing"] }`.
#[derive(Debug, Clone)]
pub struct TracingMonitor {
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for TracingMonitor {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl TracingMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }
}

macro_rules! emit_at_level {
    ($level:expr, $($field:tt)*) => {
        match $level {
            Level::ERROR => tracing::error!($($field)*),
            Level::WARN  => tracing::warn!($($field)*),
            Level::INFO  => tracing::info!($($field)*),
            Level::DEBUG => tracing::debug!($($field)*),
            Level::TRACE => tracing::trace!($($field)*),
        }
    };
}

impl QueryMonitor for TracingMonitor {
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        let sql = self.truncate_sql(&ctx.sql);
        let level = if result.is_error() { Level::WARN } else { self.level };
        emit_at_level!(
            level,
            target: "modelq.sql",
            dialect = %ctx.dialect,
            query_type = ?ctx.query_type,
            sql = %sql,
            params = %ctx.params_display(),
            duration_ms = duration.as_secs_f64() * 1000.0,
            result = %result,
        );
    }

    fn on_slow_query(&self, ctx: &QueryContext, duration: Duration) {
        tracing::warn!(
            target: "modelq.sql",
            sql = %self.truncate_sql(&ctx.sql),
            duration_ms = duration.as_secs_f64() * 1000.0,
            "slow query"
        );
    }
}
