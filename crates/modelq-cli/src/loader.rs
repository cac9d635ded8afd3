//! Schema loading, one loader per driver.

use async_trait::async_trait;
use modelq::{Dialect, Filter};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// How a column participates in a key or index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    #[default]
    None,
    Primary,
    Unique,
    Indexed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub default_value: Option<String>,
    pub key: KeyKind,
    /// Driver-specific extras, e.g. `auto_increment` or
    /// `on update CURRENT_TIMESTAMP`.
    pub extra: String,
    pub comment: String,
    pub position: i32,
}

impl ColumnInfo {
    pub fn is_primary(&self) -> bool {
        self.key == KeyKind::Primary
    }

    pub fn is_auto_increment(&self) -> bool {
        self.extra.to_ascii_lowercase().contains("auto_increment")
    }

    /// The database stamps the column on insert.
    pub fn defaults_to_now(&self) -> bool {
        self.default_value.as_deref().is_some_and(|d| {
            let d = d.trim().to_ascii_lowercase();
            d.starts_with("current_timestamp") || d.starts_with("now()")
        })
    }

    /// The database stamps the column on every update.
    pub fn updates_to_now(&self) -> bool {
        self.extra
            .to_ascii_uppercase()
            .contains("ON UPDATE CURRENT_TIMESTAMP")
    }
}

/// Columns per table, in ordinal order.
pub type DbSchema = BTreeMap<String, Vec<ColumnInfo>>;

/// `table_schema = schema`, narrowed to `tables` when any are named.
///
/// Shared by the `information_schema` loaders.
pub(crate) fn scope(schema: &str, tables: &[String]) -> Filter {
    let in_schema = Filter::unit("table_schema", "=", schema);
    match tables.split_first() {
        Some((first, rest)) => in_schema.and(Filter::from_op(
            "table_name",
            "IN",
            first.clone(),
            rest.iter().cloned(),
        )),
        None => in_schema,
    }
}

#[async_trait]
pub trait SchemaLoader: Send + Sync {
    /// Load `tables` from `schema`, or every table when `tables` is empty.
    async fn load(&self, conn_str: &str, schema: &str, tables: &[String])
    -> anyhow::Result<DbSchema>;
}

pub struct LoaderRegistry {
    loaders: HashMap<Dialect, Box<dyn SchemaLoader>>,
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self {
            loaders: HashMap::new(),
        }
    }

    pub fn with_builtin() -> Self {
        let mut r = Self::new();
        r.register(Dialect::Postgres, crate::postgres_loader::PostgresLoader);
        r.register(Dialect::MySql, crate::mysql_loader::MySqlLoader);
        r
    }

    pub fn register(&mut self, dialect: Dialect, loader: impl SchemaLoader + 'static) {
        self.loaders.insert(dialect, Box::new(loader));
    }

    pub fn get(&self, dialect: Dialect) -> Option<&dyn SchemaLoader> {
        self.loaders.get(&dialect).map(|l| l.as_ref())
    }

    pub async fn load(
        &self,
        dialect: Dialect,
        conn_str: &str,
        schema: &str,
        tables: &[String],
    ) -> anyhow::Result<DbSchema> {
        let Some(loader) = self.get(dialect) else {
            anyhow::bail!("not supported driver {dialect}");
        };
        tracing::info!(driver = %dialect, schema, "loading schema");
        let loaded = loader.load(conn_str, schema, tables).await?;
        tracing::info!(tables = loaded.len(), "schema loaded");
        Ok(loaded)
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
