//! Connection/transaction contract used by query execution.

use crate::dialect::Dialect;
use crate::error::OrmResult;
use crate::value::Value;
use std::future::Future;

/// A result cell rendered as text bytes. SQL NULL is an empty cell.
pub type RawCell = Vec<u8>;

/// Row callback: receives one row's cells, returns `false` to stop.
pub type RowVisitor<'a> = dyn FnMut(&[RawCell]) -> bool + Send + 'a;

/// Outcome of an INSERT/UPDATE/DELETE.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// Generated key, for drivers that report one.
    pub last_insert_id: Option<i64>,
}

/// A handle that can prepare and run statements: a connection, a pool or
/// an open transaction.
///
/// The default [`GenericClient::execute_write`] runs the statement directly,
/// which is what a transaction wants. Bare connections override it to wrap
/// each write in its own transaction (see [`crate::transaction::run_atomic`]).
pub trait GenericClient: Send + Sync {
    /// Prepared statement handle. Only valid on the client that prepared it.
    type Statement: Send + Sync;

    /// Rendering rules for SQL sent to this client.
    fn dialect(&self) -> Dialect;

    fn prepare(&self, sql: &str) -> impl Future<Output = OrmResult<Self::Statement>> + Send;

    fn execute_prepared(
        &self,
        stmt: &Self::Statement,
        params: &[Value],
    ) -> impl Future<Output = OrmResult<ExecResult>> + Send;

    /// Stream rows into `visitor` until it returns `false` or rows run out.
    ///
    /// Returns the number of rows handed to the visitor.
    fn query_prepared(
        &self,
        stmt: &Self::Statement,
        params: &[Value],
        visitor: &mut RowVisitor<'_>,
    ) -> impl Future<Output = OrmResult<usize>> + Send;

    /// Prepare and execute a write statement.
    fn execute_write(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = OrmResult<ExecResult>> + Send {
        async move {
            let stmt = self.prepare(sql).await?;
            self.execute_prepared(&stmt, params).await
        }
    }

    /// Prepare a query and stream its rows into `visitor`.
    fn query_rows(
        &self,
        sql: &str,
        params: &[Value],
        visitor: &mut RowVisitor<'_>,
    ) -> impl Future<Output = OrmResult<usize>> + Send {
        async move {
            let stmt = self.prepare(sql).await?;
            self.query_prepared(&stmt, params, visitor).await
        }
    }
}

/// An open transaction.
pub trait Transaction: GenericClient {
    fn commit(self) -> impl Future<Output = OrmResult<()>> + Send;

    fn rollback(self) -> impl Future<Output = OrmResult<()>> + Send;
}

/// A client that can open transactions.
pub trait Connection: GenericClient {
    type Tx<'a>: Transaction + 'a
    where
        Self: 'a;

    fn begin(&self) -> impl Future<Output = OrmResult<Self::Tx<'_>>> + Send;
}
