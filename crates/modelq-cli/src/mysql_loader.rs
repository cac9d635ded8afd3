//! MySQL schema loader over `information_schema.COLUMNS`.
//!
//! The MySQL dialect never qualifies table names, so the loader connects to
//! the `information_schema` database itself and filters on `table_schema`.

use crate::loader::{ColumnInfo, DbSchema, KeyKind, SchemaLoader, scope};
use async_trait::async_trait;
use modelq::row::FromCell;
use modelq::{Model, ModelQuery, MySqlClient, TableModel, Value};
use mysql_async::{Opts, OptsBuilder};

static COLUMNS: TableModel = TableModel::new("information_schema", "COLUMNS").with_columns(&[
    "table_schema",
    "table_name",
    "column_name",
    "ordinal_position",
    "column_default",
    "is_nullable",
    "data_type",
    "column_key",
    "extra",
    "column_comment",
]);

#[derive(Debug, Default)]
struct ColumnRow {
    table_name: String,
    column_name: String,
    ordinal_position: i32,
    column_default: Option<String>,
    is_nullable: String,
    data_type: String,
    column_key: String,
    extra: String,
    column_comment: String,
}

impl Model for ColumnRow {
    const TABLE: &'static TableModel = &COLUMNS;
    const INSERTABLE: &'static [&'static str] = &[];
    const UPDATABLE: &'static [&'static str] = &[];

    fn set_column(&mut self, column: &str, cell: &[u8]) {
        match column {
            "table_name" => self.table_name = FromCell::from_cell(cell),
            "column_name" => self.column_name = FromCell::from_cell(cell),
            "ordinal_position" => self.ordinal_position = FromCell::from_cell(cell),
            // NULL and '' both arrive empty; neither is a usable default.
            "column_default" => {
                self.column_default = (!cell.is_empty()).then(|| FromCell::from_cell(cell))
            }
            "is_nullable" => self.is_nullable = FromCell::from_cell(cell),
            "data_type" => self.data_type = FromCell::from_cell(cell),
            "column_key" => self.column_key = FromCell::from_cell(cell),
            "extra" => self.extra = FromCell::from_cell(cell),
            "column_comment" => self.column_comment = FromCell::from_cell(cell),
            _ => {}
        }
    }

    fn column_value(&self, _column: &str) -> Option<Value> {
        None
    }
}

fn key_kind(column_key: &str) -> KeyKind {
    match column_key.trim().to_ascii_uppercase().as_str() {
        "PRI" => KeyKind::Primary,
        "UNI" => KeyKind::Unique,
        "MUL" => KeyKind::Indexed,
        _ => KeyKind::None,
    }
}

/// Connection options for `conn_str` with the database switched to
/// `information_schema`.
fn information_schema_opts(conn_str: &str) -> anyhow::Result<Opts> {
    let opts = Opts::from_url(conn_str).map_err(|e| anyhow::anyhow!("invalid mysql url: {e}"))?;
    Ok(OptsBuilder::from_opts(opts)
        .db_name(Some("information_schema"))
        .into())
}

pub struct MySqlLoader;

#[async_trait]
impl SchemaLoader for MySqlLoader {
    async fn load(
        &self,
        conn_str: &str,
        schema: &str,
        tables: &[String],
    ) -> anyhow::Result<DbSchema> {
        let client = MySqlClient::from_opts(information_schema_opts(conn_str)?);

        let rows = ModelQuery::<ColumnRow>::select(&[])
            .filter(scope(schema, tables))
            .order_by(&["table_name", "ordinal_position"])
            .list(&client)
            .await;
        client.disconnect().await?;

        Ok(assemble(rows?))
    }
}

fn assemble(rows: Vec<ColumnRow>) -> DbSchema {
    let mut out = DbSchema::new();
    for r in rows {
        out.entry(r.table_name).or_default().push(ColumnInfo {
            name: r.column_name,
            data_type: r.data_type,
            is_nullable: r.is_nullable.eq_ignore_ascii_case("YES"),
            default_value: r.column_default,
            key: key_kind(&r.column_key),
            extra: r.extra,
            comment: r.column_comment,
            position: r.ordinal_position,
        });
    }
    out
}
