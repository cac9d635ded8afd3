use crate::query::Query;
use crate::value::Value;

/// Immutable descriptor of a statement's target relation.
///
/// Generated per-table code declares one as a `static`:
///
/// ```rust
/// use modelq::{Dialect, TableModel};
///
/// static USER: TableModel = TableModel::new("public", "user")
///     .with_alias("User")
///     .with_columns(&["id", "name", "age"])
///     .with_primary_key("id");
///
/// let built = USER.select(&["id", "name"]).build(Dialect::Postgres).unwrap();
/// assert_eq!(
///     built.sql,
///     r#"SELECT "User"."id", "User"."name" FROM "public"."user" AS "User""#
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableModel {
    pub schema: &'static str,
    pub table: &'static str,
    pub alias: &'static str,
    /// Known column names. Empty disables column validation.
    pub columns: &'static [&'static str],
    pub primary_key: Option<&'static str>,
}

impl TableModel {
    pub const fn new(schema: &'static str, table: &'static str) -> Self {
        Self {
            schema,
            table,
            alias: "",
            columns: &[],
            primary_key: None,
        }
    }

    pub const fn with_alias(mut self, alias: &'static str) -> Self {
        self.alias = alias;
        self
    }

    pub const fn with_columns(mut self, columns: &'static [&'static str]) -> Self {
        self.columns = columns;
        self
    }

    pub const fn with_primary_key(mut self, column: &'static str) -> Self {
        self.primary_key = Some(column);
        self
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.is_empty() || self.columns.contains(&name)
    }

    /// Projection over every known column.
    pub fn all_columns(&self) -> Vec<Column> {
        self.columns.iter().map(|c| Column::new(*c)).collect()
    }

    pub fn select(&'static self, columns: &[&str]) -> Query {
        let columns = if columns.is_empty() {
            self.all_columns()
        } else {
            columns.iter().map(|c| Column::new(*c)).collect()
        };
        Query::select(self, columns)
    }

    pub fn insert(&'static self, columns: Vec<Column>) -> Query {
        Query::insert(self, columns)
    }

    pub fn update(&'static self, columns: Vec<Column>) -> Query {
        Query::update(self, columns)
    }

    pub fn delete(&'static self) -> Query {
        Query::delete(self)
    }
}

/// A column used either as a projection (no value) or an assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub value: Option<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    pub fn with_value(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_assignment(&self) -> bool {
        self.value.is_some()
    }
}
