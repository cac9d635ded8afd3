//! In-memory client for unit tests: records every call and replays a
//! fixed result set.

use crate::client::{Connection, ExecResult, GenericClient, RawCell, RowVisitor, Transaction};
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::transaction::run_atomic;
use crate::value::{Value, format_params};
use std::sync::Mutex;

pub(crate) struct ScriptedClient {
    dialect: Dialect,
    rows: Vec<Vec<RawCell>>,
    exec_result: ExecResult,
    fail_exec: bool,
    log: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub(crate) fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            rows: Vec::new(),
            exec_result: ExecResult {
                rows_affected: 1,
                last_insert_id: None,
            },
            fail_exec: false,
            log: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_rows(mut self, rows: &[&[&str]]) -> Self {
        self.rows = rows
            .iter()
            .map(|r| r.iter().map(|c| c.as_bytes().to_vec()).collect())
            .collect();
        self
    }

    pub(crate) fn with_exec_result(mut self, result: ExecResult) -> Self {
        self.exec_result = result;
        self
    }

    pub(crate) fn failing(mut self) -> Self {
        self.fail_exec = true;
        self
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, event: String) {
        self.log.lock().unwrap().push(event);
    }

    async fn do_prepare(&self, sql: &str) -> OrmResult<String> {
        self.record(format!("PREPARE {sql}"));
        Ok(sql.to_string())
    }

    async fn do_execute(&self, stmt: &str, params: &[Value]) -> OrmResult<ExecResult> {
        self.record(format!("EXEC {stmt} {}", format_params(params)));
        if self.fail_exec {
            return Err(OrmError::driver("scripted failure"));
        }
        Ok(self.exec_result)
    }

    async fn do_query(
        &self,
        stmt: &str,
        params: &[Value],
        visitor: &mut RowVisitor<'_>,
    ) -> OrmResult<usize> {
        self.record(format!("QUERY {stmt} {}", format_params(params)));
        let mut visited = 0;
        for row in &self.rows {
            visited += 1;
            if !visitor(row) {
                break;
            }
        }
        self.record(format!("VISITED {visited}"));
        Ok(visited)
    }
}

impl GenericClient for ScriptedClient {
    type Statement = String;

    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn prepare(&self, sql: &str) -> OrmResult<String> {
        self.do_prepare(sql).await
    }

    async fn execute_prepared(&self, stmt: &String, params: &[Value]) -> OrmResult<ExecResult> {
        self.do_execute(stmt, params).await
    }

    async fn query_prepared(
        &self,
        stmt: &String,
        params: &[Value],
        visitor: &mut RowVisitor<'_>,
    ) -> OrmResult<usize> {
        self.do_query(stmt, params, visitor).await
    }

    async fn execute_write(&self, sql: &str, params: &[Value]) -> OrmResult<ExecResult> {
        run_atomic(self, sql, params).await
    }
}

impl Connection for ScriptedClient {
    type Tx<'a> = ScriptedTx<'a>;

    async fn begin(&self) -> OrmResult<ScriptedTx<'_>> {
        self.record("BEGIN".to_string());
        Ok(ScriptedTx { client: self })
    }
}

pub(crate) struct ScriptedTx<'a> {
    client: &'a ScriptedClient,
}

impl GenericClient for ScriptedTx<'_> {
    type Statement = String;

    fn dialect(&self) -> Dialect {
        self.client.dialect
    }

    async fn prepare(&self, sql: &str) -> OrmResult<String> {
        self.client.do_prepare(sql).await
    }

    async fn execute_prepared(&self, stmt: &String, params: &[Value]) -> OrmResult<ExecResult> {
        self.client.do_execute(stmt, params).await
    }

    async fn query_prepared(
        &self,
        stmt: &String,
        params: &[Value],
        visitor: &mut RowVisitor<'_>,
    ) -> OrmResult<usize> {
        self.client.do_query(stmt, params, visitor).await
    }
}

impl Transaction for ScriptedTx<'_> {
    async fn commit(self) -> OrmResult<()> {
        self.client.record("COMMIT".to_string());
        Ok(())
    }

    async fn rollback(self) -> OrmResult<()> {
        self.client.record("ROLLBACK".to_string());
        Ok(())
    }
}
