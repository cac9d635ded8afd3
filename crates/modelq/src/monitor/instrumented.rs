use super::monitors::NoopMonitor;
use super::types::{QueryContext, QueryMonitor, QueryResult};
use crate::client::{Connection, ExecResult, GenericClient, RowVisitor, Transaction};
use crate::dialect::Dialect;
use crate::error::OrmResult;
use crate::value::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A client wrapper that reports every statement to a [`QueryMonitor`].
///
/// Transactions opened through it are wrapped as well and share the
/// monitor, so statements inside a batch are reported too.
pub struct InstrumentedClient<C> {
    client: C,
    monitor: Arc<dyn QueryMonitor>,
    slow_query_threshold: Option<Duration>,
}

impl<C: GenericClient> InstrumentedClient<C> {
    /// Wrap `client` with a no-op monitor.
    pub fn new(client: C) -> Self {
        Self {
            client,
            monitor: Arc::new(NoopMonitor),
            slow_query_threshold: None,
        }
    }

    pub fn with_monitor<M: QueryMonitor + 'static>(self, monitor: M) -> Self {
        self.with_monitor_arc(Arc::new(monitor))
    }

    pub fn with_monitor_arc(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    /// Report statements slower than `threshold` via
    /// [`QueryMonitor::on_slow_query`].
    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    pub fn inner(&self) -> &C {
        &self.client
    }

    pub fn into_inner(self) -> C {
        self.client
    }

    fn report<T>(
        &self,
        ctx: &QueryContext,
        started: Instant,
        result: &OrmResult<T>,
        ok: impl FnOnce(&T) -> QueryResult,
    ) {
        let duration = started.elapsed();
        let outcome = match result {
            Ok(value) => ok(value),
            Err(e) => QueryResult::error(e.to_string()),
        };
        self.monitor.on_query_complete(ctx, duration, &outcome);
        if let Some(threshold) = self.slow_query_threshold
            && duration > threshold
        {
            self.monitor.on_slow_query(ctx, duration);
        }
    }
}

impl<C: GenericClient> GenericClient for InstrumentedClient<C> {
    type Statement = C::Statement;

    fn dialect(&self) -> Dialect {
        self.client.dialect()
    }

    async fn prepare(&self, sql: &str) -> OrmResult<C::Statement> {
        self.client.prepare(sql).await
    }

    async fn execute_prepared(&self, stmt: &C::Statement, params: &[Value]) -> OrmResult<ExecResult> {
        self.client.execute_prepared(stmt, params).await
    }

    async fn query_prepared(
        &self,
        stmt: &C::Statement,
        params: &[Value],
        visitor: &mut RowVisitor<'_>,
    ) -> OrmResult<usize> {
        self.client.query_prepared(stmt, params, visitor).await
    }

    async fn execute_write(&self, sql: &str, params: &[Value]) -> OrmResult<ExecResult> {
        let ctx = QueryContext::new(sql, params, self.client.dialect());
        self.monitor.on_query_start(&ctx);
        let started = Instant::now();
        let result = self.client.execute_write(sql, params).await;
        self.report(&ctx, started, &result, |r| QueryResult::Affected(r.rows_affected));
        result
    }

    async fn query_rows(
        &self,
        sql: &str,
        params: &[Value],
        visitor: &mut RowVisitor<'_>,
    ) -> OrmResult<usize> {
        let ctx = QueryContext::new(sql, params, self.client.dialect());
        self.monitor.on_query_start(&ctx);
        let started = Instant::now();
        let result = self.client.query_rows(sql, params, visitor).await;
        self.report(&ctx, started, &result, |n| QueryResult::Rows(*n));
        result
    }
}

impl<C: Connection> Connection for InstrumentedClient<C> {
    type Tx<'a>
        = InstrumentedClient<C::Tx<'a>>
    where
        Self: 'a;

    async fn begin(&self) -> OrmResult<Self::Tx<'_>> {
        let tx = self.client.begin().await?;
        Ok(InstrumentedClient {
            client: tx,
            monitor: Arc::clone(&self.monitor),
            slow_query_threshold: self.slow_query_threshold,
        })
    }
}

impl<T: Transaction> Transaction for InstrumentedClient<T> {
    async fn commit(self) -> OrmResult<()> {
        self.client.commit().await
    }

    async fn rollback(self) -> OrmResult<()> {
        self.client.rollback().await
    }
}
