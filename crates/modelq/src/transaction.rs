//! Transaction helpers.
//!
//! Writes issued against a bare [`Connection`] run inside their own
//! transaction via [`run_atomic`]. To batch several writes, open a
//! transaction explicitly and pass it wherever a [`GenericClient`] is
//! accepted. The [`transaction!`](crate::transaction!) macro handles
//! commit/rollback.
//!
//! # Example
//!
//! ```ignore
//! use modelq::{Column, Filter, OrmResult};
//!
//! # async fn demo(client: &modelq::postgres::PgClient) -> OrmResult<()> {
//! modelq::transaction!(client, tx, {
//!     ACCOUNT
//!         .update(vec![Column::with_value("balance", 90)])
//!         .filter(Filter::unit("id", "=", 1))
//!         .run(&tx)
//!         .await?;
//!     ACCOUNT
//!         .update(vec![Column::with_value("balance", 110)])
//!         .filter(Filter::unit("id", "=", 2))
//!         .run(&tx)
//!         .await?;
//!     Ok(())
//! })?;
//! # Ok(()) }
//! ```

use crate::client::{Connection, ExecResult, GenericClient, Transaction};
use crate::error::{OrmError, OrmResult};
use crate::value::Value;

/// Runs the given block inside a transaction opened on `$conn`.
///
/// - Begins via [`Connection::begin`].
/// - Commits on `Ok(_)`.
/// - Rolls back on `Err(_)`.
///
/// The block must evaluate to `modelq::OrmResult<T>`.
#[macro_export]
macro_rules! transaction {
    ($conn:expr, $tx:ident, $body:block) => {{
        let $tx = $crate::Connection::begin($conn).await?;
        let __modelq_tx_body_result = async { $body }.await;
        $crate::transaction::finish($tx, __modelq_tx_body_result).await
    }};
}

/// Commit on `Ok`, roll back on `Err`.
///
/// A failed rollback is reported together with the original error.
pub async fn finish<T, X: Transaction>(tx: X, result: OrmResult<T>) -> OrmResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(error) => match tx.rollback().await {
            Ok(()) => Err(error),
            Err(rollback_err) => Err(OrmError::Other(format!(
                "{error} (rollback failed: {rollback_err})"
            ))),
        },
    }
}

/// Execute one write statement in its own transaction.
pub async fn run_atomic<C: Connection>(conn: &C, sql: &str, params: &[Value]) -> OrmResult<ExecResult> {
    let tx = conn.begin().await?;
    let result = tx.execute_write(sql, params).await;
    finish(tx, result).await
}
