//! Running built queries against a [`GenericClient`].

use crate::client::{ExecResult, GenericClient, RawCell};
use crate::error::{OrmError, OrmResult};
use crate::query::{Query, StatementKind};
use crate::table::Column;

#[cfg(test)]
mod tests;

impl Query {
    fn require_select(&self, call: &str) -> OrmResult<()> {
        if self.kind() == StatementKind::Select {
            Ok(())
        } else {
            Err(OrmError::not_supported(format!(
                "{call} on a {} query",
                self.kind().as_str()
            )))
        }
    }

    /// Execute an Insert, Update or Delete.
    ///
    /// On a bare connection the statement runs in its own transaction; on
    /// a transaction it runs directly.
    pub async fn run<C: GenericClient>(&self, client: &C) -> OrmResult<ExecResult> {
        if self.kind() == StatementKind::Select {
            return Err(OrmError::not_supported(
                "run on a Select query; use select_list or select_one",
            ));
        }
        let built = self.build(client.dialect())?;
        client.execute_write(&built.sql, &built.params).await
    }

    /// Stream the rows of a Select into `visitor` (projection, raw cells).
    /// Returning `false` stops the iteration.
    pub async fn select_list<C, F>(&self, client: &C, mut visitor: F) -> OrmResult<usize>
    where
        C: GenericClient,
        F: FnMut(&[Column], &[RawCell]) -> bool + Send,
    {
        self.require_select("select_list")?;
        let built = self.build(client.dialect())?;
        let columns = self.columns();
        client
            .query_rows(&built.sql, &built.params, &mut |cells: &[RawCell]| {
                visitor(columns, cells)
            })
            .await
    }

    /// Like [`Query::select_list`] but requires exactly one row.
    ///
    /// A second row stops the scan with [`OrmError::MultipleRows`] before
    /// the visitor sees it; no rows yields [`OrmError::NoRows`].
    pub async fn select_one<C, F>(&self, client: &C, mut visitor: F) -> OrmResult<()>
    where
        C: GenericClient,
        F: FnMut(&[Column], &[RawCell]) + Send,
    {
        self.require_select("select_one")?;
        let built = self.build(client.dialect())?;
        let columns = self.columns();
        let mut seen = 0usize;
        client
            .query_rows(&built.sql, &built.params, &mut |cells: &[RawCell]| {
                seen += 1;
                if seen > 1 {
                    return false;
                }
                visitor(columns, cells);
                true
            })
            .await?;

        match seen {
            0 => Err(OrmError::NoRows),
            1 => Ok(()),
            _ => Err(OrmError::MultipleRows),
        }
    }
}
