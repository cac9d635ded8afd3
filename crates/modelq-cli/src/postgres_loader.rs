//! Postgres schema loader over `information_schema`, queried through the
//! modelq builder itself.

use crate::loader::{ColumnInfo, DbSchema, KeyKind, SchemaLoader, scope};
use async_trait::async_trait;
use modelq::row::FromCell;
use modelq::{Filter, Model, ModelQuery, PgClient, TableModel, Value};
use std::collections::HashMap;

static COLUMNS: TableModel = TableModel::new("information_schema", "columns")
    .with_alias("c")
    .with_columns(&[
        "table_schema",
        "table_name",
        "column_name",
        "ordinal_position",
        "column_default",
        "is_nullable",
        "data_type",
    ]);

static TABLE_CONSTRAINTS: TableModel = TableModel::new("information_schema", "table_constraints")
    .with_alias("tc")
    .with_columns(&["table_schema", "table_name", "constraint_name", "constraint_type"]);

static KEY_COLUMN_USAGE: TableModel = TableModel::new("information_schema", "key_column_usage")
    .with_alias("kcu")
    .with_columns(&["table_schema", "table_name", "constraint_name", "column_name"]);

#[derive(Debug, Default)]
struct ColumnRow {
    table_name: String,
    column_name: String,
    ordinal_position: i32,
    column_default: String,
    is_nullable: String,
    data_type: String,
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
            "column_default" => self.column_default = FromCell::from_cell(cell),
            "is_nullable" => self.is_nullable = FromCell::from_cell(cell),
            "data_type" => self.data_type = FromCell::from_cell(cell),
            _ => {}
        }
    }

    fn column_value(&self, _column: &str) -> Option<Value> {
        None
    }
}

#[derive(Debug, Default)]
struct ConstraintRow {
    table_name: String,
    constraint_name: String,
    constraint_type: String,
}

impl Model for ConstraintRow {
    const TABLE: &'static TableModel = &TABLE_CONSTRAINTS;
    const INSERTABLE: &'static [&'static str] = &[];
    const UPDATABLE: &'static [&'static str] = &[];

    fn set_column(&mut self, column: &str, cell: &[u8]) {
        match column {
            "table_name" => self.table_name = FromCell::from_cell(cell),
            "constraint_name" => self.constraint_name = FromCell::from_cell(cell),
            "constraint_type" => self.constraint_type = FromCell::from_cell(cell),
            _ => {}
        }
    }

    fn column_value(&self, _column: &str) -> Option<Value> {
        None
    }
}

#[derive(Debug, Default)]
struct KeyUsageRow {
    table_name: String,
    constraint_name: String,
    column_name: String,
}

impl Model for KeyUsageRow {
    const TABLE: &'static TableModel = &KEY_COLUMN_USAGE;
    const INSERTABLE: &'static [&'static str] = &[];
    const UPDATABLE: &'static [&'static str] = &[];

    fn set_column(&mut self, column: &str, cell: &[u8]) {
        match column {
            "table_name" => self.table_name = FromCell::from_cell(cell),
            "constraint_name" => self.constraint_name = FromCell::from_cell(cell),
            "column_name" => self.column_name = FromCell::from_cell(cell),
            _ => {}
        }
    }

    fn column_value(&self, _column: &str) -> Option<Value> {
        None
    }
}

pub struct PostgresLoader;

#[async_trait]
impl SchemaLoader for PostgresLoader {
    async fn load(
        &self,
        conn_str: &str,
        schema: &str,
        tables: &[String],
    ) -> anyhow::Result<DbSchema> {
        let client = PgClient::connect(conn_str).await?;
        let filter = scope(schema, tables);

        let columns: Vec<ColumnRow> = ModelQuery::select(&[])
            .filter(filter.clone())
            .order_by(&["table_name", "ordinal_position"])
            .list(&client)
            .await?;

        let constraints: Vec<ConstraintRow> = ModelQuery::select(&[])
            .filter(filter.clone().and(Filter::in_list(
                "constraint_type",
                ["PRIMARY KEY", "UNIQUE"],
            )))
            .list(&client)
            .await?;

        let usages: Vec<KeyUsageRow> = ModelQuery::select(&[])
            .filter(filter)
            .list(&client)
            .await?;

        Ok(assemble(columns, constraints, usages))
    }
}

fn assemble(
    columns: Vec<ColumnRow>,
    constraints: Vec<ConstraintRow>,
    usages: Vec<KeyUsageRow>,
) -> DbSchema {
    let kinds: HashMap<(String, String), KeyKind> = constraints
        .into_iter()
        .map(|c| {
            let kind = if c.constraint_type == "PRIMARY KEY" {
                KeyKind::Primary
            } else {
                KeyKind::Unique
            };
            ((c.table_name, c.constraint_name), kind)
        })
        .collect();

    let mut keys: HashMap<(String, String), KeyKind> = HashMap::new();
    for u in usages {
        let Some(&kind) = kinds.get(&(u.table_name.clone(), u.constraint_name)) else {
            continue;
        };
        let slot = keys.entry((u.table_name, u.column_name)).or_default();
        if *slot != KeyKind::Primary {
            *slot = kind;
        }
    }

    let mut out = DbSchema::new();
    for c in columns {
        let key = keys
            .get(&(c.table_name.clone(), c.column_name.clone()))
            .copied()
            .unwrap_or_default();
        let default_value = (!c.column_default.is_empty()).then_some(c.column_default);
        let extra = if default_value
            .as_deref()
            .is_some_and(|d| d.starts_with("nextval("))
        {
            "auto_increment".to_string()
        } else {
            String::new()
        };

        out.entry(c.table_name).or_default().push(ColumnInfo {
            name: c.column_name,
            data_type: c.data_type,
            is_nullable: c.is_nullable.eq_ignore_ascii_case("YES"),
            default_value,
            key,
            extra,
            comment: String::new(),
            position: c.ordinal_position,
        });
    }
    out
}
