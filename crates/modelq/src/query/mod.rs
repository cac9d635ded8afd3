//! Statement values: Select, Insert, Update and Delete sharing one clause
//! model.
//!
//! Every fluent method takes the query by value and returns the next state,
//! so a partially built query can be cloned and reused as a template.
//! Clause methods that a statement kind does not support return the query
//! unchanged; see [`StatementKind::supports`].

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::filter::Filter;
use crate::table::{Column, TableModel};
use crate::value::{Value, format_params};
use std::fmt;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

/// Optional clauses shared by the statement kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Clause {
    Where,
    GroupBy,
    OrderBy,
    Limit,
}

impl StatementKind {
    /// Which clauses this kind renders.
    ///
    /// | Kind   | Where | GroupBy | OrderBy | Limit |
    /// |--------|-------|---------|---------|-------|
    /// | Select | yes   | yes     | yes     | yes   |
    /// | Insert | no    | no      | no      | no    |
    /// | Update | yes   | no      | no      | no    |
    /// | Delete | yes   | no      | no      | no    |
    pub const fn supports(self, clause: Clause) -> bool {
        match self {
            StatementKind::Select => true,
            StatementKind::Insert => false,
            StatementKind::Update | StatementKind::Delete => matches!(clause, Clause::Where),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            StatementKind::Select => "Select",
            StatementKind::Insert => "Insert",
            StatementKind::Update => "Update",
            StatementKind::Delete => "Delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub const fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub order: SortOrder,
}

impl OrderBy {
    /// `-name` sorts descending, `+name` or `name` ascending.
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();
        if let Some(rest) = spec.strip_prefix('-') {
            Self {
                column: rest.to_string(),
                order: SortOrder::Desc,
            }
        } else {
            Self {
                column: spec.strip_prefix('+').unwrap_or(spec).to_string(),
                order: SortOrder::Asc,
            }
        }
    }
}

/// Rendered SQL text and its parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl fmt::Display for BuiltQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}], params={}", self.sql, format_params(&self.params))
    }
}

#[derive(Debug, Clone)]
pub struct Query {
    kind: StatementKind,
    model: &'static TableModel,
    columns: Vec<Column>,
    filter: Option<Filter>,
    order_by: Vec<OrderBy>,
    group_by: Vec<String>,
    limit: Option<(i64, i64)>,
}

impl Query {
    fn new(kind: StatementKind, model: &'static TableModel, columns: Vec<Column>) -> Self {
        Self {
            kind,
            model,
            columns,
            filter: None,
            order_by: Vec::new(),
            group_by: Vec::new(),
            limit: None,
        }
    }

    pub fn select(model: &'static TableModel, columns: Vec<Column>) -> Self {
        Self::new(StatementKind::Select, model, columns)
    }

    pub fn insert(model: &'static TableModel, columns: Vec<Column>) -> Self {
        Self::new(StatementKind::Insert, model, columns)
    }

    pub fn update(model: &'static TableModel, columns: Vec<Column>) -> Self {
        Self::new(StatementKind::Update, model, columns)
    }

    pub fn delete(model: &'static TableModel) -> Self {
        Self::new(StatementKind::Delete, model, Vec::new())
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn model(&self) -> &'static TableModel {
        self.model
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn filter_expr(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn order_by_specs(&self) -> &[OrderBy] {
        &self.order_by
    }

    pub fn group_by_columns(&self) -> &[String] {
        &self.group_by
    }

    /// One-based `(start, size)` pair, if set.
    pub fn limit_range_pair(&self) -> Option<(i64, i64)> {
        self.limit
    }

    /// Set the WHERE filter, replacing any previous one.
    pub fn filter(mut self, filter: Filter) -> Self {
        if !self.kind.supports(Clause::Where) {
            return self;
        }
        self.filter = Some(filter);
        self
    }

    /// AND `filter` onto the current WHERE filter.
    pub fn and_filter(self, filter: Filter) -> Self {
        let combined = match &self.filter {
            Some(existing) => existing.clone().and(filter),
            None => filter,
        };
        self.filter(combined)
    }

    /// Set ORDER BY from `-name` / `+name` / `name` specs.
    pub fn order_by(mut self, specs: &[&str]) -> Self {
        if !self.kind.supports(Clause::OrderBy) {
            return self;
        }
        self.order_by = specs.iter().map(|s| OrderBy::parse(s)).collect();
        self
    }

    pub fn group_by(mut self, columns: &[&str]) -> Self {
        if !self.kind.supports(Clause::GroupBy) {
            return self;
        }
        self.group_by = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// `LIMIT` the first `size` rows; same as `limit_range(1, size)`.
    pub fn limit(self, size: i64) -> Self {
        self.limit_range(1, size)
    }

    /// One-based `start`, at most `size` rows.
    pub fn limit_range(mut self, start: i64, size: i64) -> Self {
        if !self.kind.supports(Clause::Limit) {
            return self;
        }
        self.limit = Some((start, size));
        self
    }

    /// One-based page `number` of `size` rows: start = (number - 1) * size + 1.
    ///
    /// Pages below 1 read the first page; the start saturates at `i64::MAX`.
    pub fn page(self, number: i64, size: i64) -> Self {
        let start = (number.max(1) - 1).saturating_mul(size.max(0)).saturating_add(1);
        self.limit_range(start, size)
    }

    fn assignments(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .filter_map(|c| c.value.as_ref().map(|v| (c.name.as_str(), v)))
    }

    /// First column the table model does not know. Clauses are checked as
    /// projection, then filter, then ORDER BY, then GROUP BY.
    fn unknown_column(&self) -> Option<&str> {
        let filter_names = self.filter.as_ref().map(Filter::column_names).unwrap_or_default();
        self.columns
            .iter()
            .map(|c| c.name.as_str())
            .chain(filter_names)
            .chain(self.order_by.iter().map(|o| o.column.as_str()))
            .chain(self.group_by.iter().map(String::as_str))
            .find(|name| !self.model.has_column(name))
    }

    /// Check build-time invariants without rendering.
    pub fn validate(&self) -> OrmResult<()> {
        if let Some(column) = self.unknown_column() {
            return Err(OrmError::UnknownColumn {
                table: self.model.table.to_string(),
                column: column.to_string(),
            });
        }
        let enough = match self.kind {
            StatementKind::Select => !self.columns.is_empty(),
            StatementKind::Insert | StatementKind::Update => self.assignments().next().is_some(),
            StatementKind::Delete => true,
        };
        if !enough {
            return Err(OrmError::NotEnoughColumns(self.kind.as_str()));
        }
        if let Some(filter) = &self.filter {
            filter.check()?;
        }
        Ok(())
    }

    /// Render the statement for `dialect`.
    ///
    /// Fails before any I/O on the build-time errors listed in
    /// [`Query::validate`].
    pub fn build(&self, dialect: Dialect) -> OrmResult<BuiltQuery> {
        self.validate()?;

        let mut params = Vec::new();
        let mut sql = match self.kind {
            StatementKind::Select => self.select_head(dialect),
            StatementKind::Insert => self.insert_sql(dialect, &mut params),
            StatementKind::Update => self.update_head(dialect, &mut params),
            StatementKind::Delete => format!("DELETE FROM {}", self.table_ref(dialect, "")),
        };

        let alias = match self.kind {
            StatementKind::Select => self.model.alias,
            _ => "",
        };
        let remains = self.remains(dialect, alias, &mut params);
        if !remains.is_empty() {
            sql.push(' ');
            sql.push_str(&remains);
        }

        Ok(BuiltQuery {
            sql: dialect.rebind(&sql),
            params,
        })
    }

    fn table_ref(&self, dialect: Dialect, alias: &str) -> String {
        dialect.table_name(self.model.schema, self.model.table, alias)
    }

    fn select_head(&self, dialect: Dialect) -> String {
        let alias = self.model.alias;
        let fields: Vec<String> = self
            .columns
            .iter()
            .map(|c| dialect.column_name(&c.name, alias))
            .collect();
        format!(
            "SELECT {} FROM {}",
            fields.join(", "),
            self.table_ref(dialect, alias)
        )
    }

    fn insert_sql(&self, dialect: Dialect, params: &mut Vec<Value>) -> String {
        let mut fields = Vec::new();
        for (name, value) in self.assignments() {
            fields.push(dialect.quote_ident(name));
            params.push(value.clone());
        }
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table_ref(dialect, ""),
            fields.join(", "),
            Dialect::placeholders(fields.len())
        )
    }

    fn update_head(&self, dialect: Dialect, params: &mut Vec<Value>) -> String {
        let mut sets = Vec::new();
        for (name, value) in self.assignments() {
            sets.push(format!("{} = ?", dialect.quote_ident(name)));
            params.push(value.clone());
        }
        format!("UPDATE {} SET {}", self.table_ref(dialect, ""), sets.join(", "))
    }

    /// WHERE / GROUP BY / ORDER BY / LIMIT, appended whenever non-empty.
    fn remains(&self, dialect: Dialect, alias: &str, params: &mut Vec<Value>) -> String {
        let mut parts = Vec::new();

        if let Some(filter) = &self.filter {
            parts.push(format!("WHERE {}", filter.render(alias, dialect)));
            params.extend(filter.params());
        }

        if !self.group_by.is_empty() {
            let fields: Vec<String> = self
                .group_by
                .iter()
                .map(|g| dialect.column_name(g, alias))
                .collect();
            parts.push(format!("GROUP BY {}", fields.join(", ")));
        }

        if !self.order_by.is_empty() {
            let fields: Vec<String> = self
                .order_by
                .iter()
                .map(|o| format!("{} {}", dialect.column_name(&o.column, alias), o.order.as_sql()))
                .collect();
            parts.push(format!("ORDER BY {}", fields.join(", ")));
        }

        if let Some((start, size)) = self.limit {
            let (clause, limit_params) = dialect.limit_clause(start, size);
            parts.push(clause);
            params.extend(limit_params);
        }

        parts.join(" ")
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.build(Dialect::Postgres) {
            Ok(built) => write!(f, "{built}"),
            Err(e) => write!(f, "<{} query: {e}>", self.kind.as_str()),
        }
    }
}
