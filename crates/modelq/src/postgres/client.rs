use super::types::TextCell;
use crate::client::{Connection, ExecResult, GenericClient, RawCell, RowVisitor, Transaction};
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::transaction::run_atomic;
use crate::value::Value;
use futures_util::TryStreamExt;
use std::pin::pin;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};
use tokio_postgres::{NoTls, Statement};

/// Run a prepared statement and return the affected row count.
pub(super) async fn execute_on(
    client: &tokio_postgres::Client,
    stmt: &Statement,
    params: &[Value],
) -> OrmResult<ExecResult> {
    let rows_affected = client.execute_raw(stmt, params.iter()).await?;
    Ok(ExecResult {
        rows_affected,
        last_insert_id: None,
    })
}

/// Stream rows of a prepared statement into `visitor`, rendering each cell
/// as text.
pub(super) async fn query_on(
    client: &tokio_postgres::Client,
    stmt: &Statement,
    params: &[Value],
    visitor: &mut RowVisitor<'_>,
) -> OrmResult<usize> {
    let mut rows = pin!(client.query_raw(stmt, params.iter()).await?);
    let mut visited = 0;
    while let Some(row) = rows.try_next().await? {
        let cells = (0..row.len())
            .map(|idx| row.try_get::<_, TextCell>(idx).map(|c| c.0))
            .collect::<Result<Vec<RawCell>, _>>()?;
        visited += 1;
        if !visitor(cells.as_slice()) {
            break;
        }
    }
    Ok(visited)
}

/// A single Postgres session.
///
/// Writes issued directly on a `PgClient` run in their own transaction.
/// Clones share the session: an open [`PgTransaction`] holds it exclusively
/// until commit or rollback, and every other call on any clone waits for
/// it. Using the client (rather than the transaction) from the task that
/// holds the transaction therefore never completes; use [`super::PgPool`]
/// for concurrent batches.
#[derive(Clone)]
pub struct PgClient {
    client: Arc<Mutex<tokio_postgres::Client>>,
}

impl PgClient {
    pub fn new(client: tokio_postgres::Client) -> Self {
        Self {
            client: Arc::new(Mutex::new(client)),
        }
    }

    /// Connect without TLS and drive the connection on a background task.
    pub async fn connect(database_url: &str) -> OrmResult<Self> {
        let (client, connection) = tokio_postgres::connect(database_url, NoTls)
            .await
            .map_err(|e| OrmError::Connection(e.to_string()))?;
        tokio::spawn(async move {
            if let Err(_e) = connection.await {
                #[cfg(feature = "tracing")]
                tracing::error!(target: "modelq.sql", error = %_e, "postgres connection closed");
            }
        });
        Ok(Self::new(client))
    }

    /// Borrow the raw session once no transaction holds it.
    pub async fn inner(&self) -> MutexGuard<'_, tokio_postgres::Client> {
        self.client.lock().await
    }
}

impl GenericClient for PgClient {
    type Statement = Statement;

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn prepare(&self, sql: &str) -> OrmResult<Statement> {
        let client = self.client.lock().await;
        Ok(client.prepare(sql).await?)
    }

    async fn execute_prepared(&self, stmt: &Statement, params: &[Value]) -> OrmResult<ExecResult> {
        let client = self.client.lock().await;
        execute_on(&client, stmt, params).await
    }

    async fn query_prepared(
        &self,
        stmt: &Statement,
        params: &[Value],
        visitor: &mut RowVisitor<'_>,
    ) -> OrmResult<usize> {
        let client = self.client.lock().await;
        query_on(&client, stmt, params, visitor).await
    }

    async fn execute_write(&self, sql: &str, params: &[Value]) -> OrmResult<ExecResult> {
        run_atomic(self, sql, params).await
    }
}

impl Connection for PgClient {
    type Tx<'a>
        = PgTransaction
    where
        Self: 'a;

    async fn begin(&self) -> OrmResult<PgTransaction> {
        let client = Arc::clone(&self.client).lock_owned().await;
        client.batch_execute("BEGIN").await?;
        Ok(PgTransaction::new(TxConn::Shared(client)))
    }
}

pub(super) enum TxConn {
    Shared(OwnedMutexGuard<tokio_postgres::Client>),
    #[cfg(feature = "pool")]
    Pooled(deadpool_postgres::Object),
}

impl TxConn {
    fn client(&self) -> &tokio_postgres::Client {
        match self {
            TxConn::Shared(guard) => &**guard,
            #[cfg(feature = "pool")]
            TxConn::Pooled(obj) => &***obj,
        }
    }
}

/// An open transaction on a [`PgClient`] or a pooled connection.
///
/// Dropping it without [`Transaction::commit`] or
/// [`Transaction::rollback`] issues a `ROLLBACK` in the background; the
/// session stays held until that rollback has run.
pub struct PgTransaction {
    conn: Option<TxConn>,
}

impl PgTransaction {
    pub(super) fn new(conn: TxConn) -> Self {
        Self { conn: Some(conn) }
    }

    fn client(&self) -> OrmResult<&tokio_postgres::Client> {
        self.conn
            .as_ref()
            .map(TxConn::client)
            .ok_or_else(|| OrmError::Other("transaction already finished".to_string()))
    }

    async fn finish(mut self, sql: &str) -> OrmResult<()> {
        let conn = self
            .conn
            .take()
            .ok_or_else(|| OrmError::Other("transaction already finished".to_string()))?;
        conn.client().batch_execute(sql).await?;
        Ok(())
    }
}

impl Drop for PgTransaction {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take()
            && let Ok(handle) = tokio::runtime::Handle::try_current()
        {
            handle.spawn(async move {
                let _ = conn.client().batch_execute("ROLLBACK").await;
            });
        }
    }
}

impl GenericClient for PgTransaction {
    type Statement = Statement;

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn prepare(&self, sql: &str) -> OrmResult<Statement> {
        let stmt = match self.conn.as_ref() {
            #[cfg(feature = "pool")]
            Some(TxConn::Pooled(obj)) => obj.prepare_cached(sql).await?,
            _ => self.client()?.prepare(sql).await?,
        };
        Ok(stmt)
    }

    async fn execute_prepared(&self, stmt: &Statement, params: &[Value]) -> OrmResult<ExecResult> {
        execute_on(self.client()?, stmt, params).await
    }

    async fn query_prepared(
        &self,
        stmt: &Statement,
        params: &[Value],
        visitor: &mut RowVisitor<'_>,
    ) -> OrmResult<usize> {
        query_on(self.client()?, stmt, params, visitor).await
    }
}

impl Transaction for PgTransaction {
    async fn commit(self) -> OrmResult<()> {
        self.finish("COMMIT").await
    }

    async fn rollback(self) -> OrmResult<()> {
        self.finish("ROLLBACK").await
    }
}
