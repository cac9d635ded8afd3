//! Typed per-table access on top of [`Query`].
//!
//! Generated code implements [`Model`] for each table struct; callers then
//! use [`ModelQuery`] for set-based operations and [`ModelExt`] for
//! single-object writes keyed by the primary key.

use crate::client::{ExecResult, GenericClient, RawCell};
use crate::error::{OrmError, OrmResult};
use crate::filter::Filter;
use crate::query::Query;
use crate::table::{Column, TableModel};
use crate::value::Value;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;


/// A struct mapped onto one table.
pub trait Model: Default + Send + Sync + Sized + 'static {
    const TABLE: &'static TableModel;

    /// Columns written by [`ModelQuery::insert`].
    const INSERTABLE: &'static [&'static str];

    /// Columns written by [`ModelQuery::update`] when none are named.
    const UPDATABLE: &'static [&'static str];

    /// Decode one projected column into the matching field. Unknown names
    /// are ignored.
    fn set_column(&mut self, column: &str, cell: &[u8]);

    /// Current value of a column's field.
    fn column_value(&self, column: &str) -> Option<Value>;

    /// Store a generated key after an insert. No-op unless the table has an
    /// auto-increment primary key.
    fn set_insert_id(&mut self, _id: i64) {}

    fn from_row(columns: &[Column], cells: &[RawCell]) -> Self {
        let mut obj = Self::default();
        for (column, cell) in columns.iter().zip(cells) {
            obj.set_column(&column.name, cell);
        }
        obj
    }

    fn assignments(&self, columns: &[&str]) -> Vec<Column> {
        columns
            .iter()
            .filter_map(|c| self.column_value(c).map(|v| Column::with_value(*c, v)))
            .collect()
    }

    fn primary_key_filter(&self) -> OrmResult<Filter> {
        let pk = Self::TABLE
            .primary_key
            .ok_or_else(|| OrmError::NoPrimaryKey(Self::TABLE.table.to_string()))?;
        let value = self
            .column_value(pk)
            .ok_or_else(|| OrmError::NoPrimaryKey(Self::TABLE.table.to_string()))?;
        Ok(Filter::unit(pk, "=", value))
    }
}

/// A [`Query`] whose rows decode into `M`.
pub struct ModelQuery<M> {
    query: Query,
    _model: PhantomData<fn() -> M>,
}

impl<M> Clone for ModelQuery<M> {
    fn clone(&self) -> Self {
        Self {
            query: self.query.clone(),
            _model: PhantomData,
        }
    }
}

impl<M> fmt::Debug for ModelQuery<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelQuery").field("query", &self.query).finish()
    }
}

impl<M> fmt::Display for ModelQuery<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.query, f)
    }
}

impl<M: Model> ModelQuery<M> {
    fn wrap(query: Query) -> Self {
        Self {
            query,
            _model: PhantomData,
        }
    }

    /// Select the named columns, or every column when `columns` is empty.
    pub fn select(columns: &[&str]) -> Self {
        Self::wrap(M::TABLE.select(columns))
    }

    pub fn insert(obj: &M) -> Self {
        Self::wrap(M::TABLE.insert(obj.assignments(M::INSERTABLE)))
    }

    /// Update the named columns, or the updatable set when `columns` is empty.
    pub fn update(obj: &M, columns: &[&str]) -> Self {
        let columns = if columns.is_empty() {
            M::UPDATABLE
        } else {
            columns
        };
        Self::wrap(M::TABLE.update(obj.assignments(columns)))
    }

    pub fn delete() -> Self {
        Self::wrap(M::TABLE.delete())
    }

    pub fn filter(self, filter: Filter) -> Self {
        Self::wrap(self.query.filter(filter))
    }

    pub fn and_filter(self, filter: Filter) -> Self {
        Self::wrap(self.query.and_filter(filter))
    }

    pub fn order_by(self, specs: &[&str]) -> Self {
        Self::wrap(self.query.order_by(specs))
    }

    pub fn group_by(self, columns: &[&str]) -> Self {
        Self::wrap(self.query.group_by(columns))
    }

    pub fn limit(self, size: i64) -> Self {
        Self::wrap(self.query.limit(size))
    }

    pub fn limit_range(self, start: i64, size: i64) -> Self {
        Self::wrap(self.query.limit_range(start, size))
    }

    pub fn page(self, number: i64, size: i64) -> Self {
        Self::wrap(self.query.page(number, size))
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn into_query(self) -> Query {
        self.query
    }

    /// Execute an Insert/Update/Delete.
    pub async fn run<C: GenericClient>(&self, client: &C) -> OrmResult<ExecResult> {
        self.query.run(client).await
    }

    /// Decode rows one by one; `visitor` returns `false` to stop.
    pub async fn iterate<C, F>(&self, client: &C, mut visitor: F) -> OrmResult<usize>
    where
        C: GenericClient,
        F: FnMut(M) -> bool + Send,
    {
        self.query
            .select_list(client, |columns, cells| visitor(M::from_row(columns, cells)))
            .await
    }

    pub async fn list<C: GenericClient>(&self, client: &C) -> OrmResult<Vec<M>> {
        let mut out = Vec::new();
        self.query
            .select_list(client, |columns, cells| {
                out.push(M::from_row(columns, cells));
                true
            })
            .await?;
        Ok(out)
    }

    /// Exactly one row, else [`OrmError::NoRows`] / [`OrmError::MultipleRows`].
    pub async fn one<C: GenericClient>(&self, client: &C) -> OrmResult<M> {
        let mut found = None;
        self.query
            .select_one(client, |columns, cells| {
                found = Some(M::from_row(columns, cells));
            })
            .await?;
        found.ok_or(OrmError::NoRows)
    }
}

/// Single-object writes keyed by the primary key.
pub trait ModelExt: Model {
    /// Insert the object; stores the generated key when the driver reports one.
    fn insert<C: GenericClient>(
        &mut self,
        client: &C,
    ) -> impl Future<Output = OrmResult<ExecResult>> + Send;

    /// Update the updatable columns of the row with this primary key.
    fn update<C: GenericClient>(&self, client: &C) -> impl Future<Output = OrmResult<u64>> + Send;

    /// Delete the row with this primary key.
    fn delete<C: GenericClient>(&self, client: &C) -> impl Future<Output = OrmResult<u64>> + Send;
}

impl<M: Model> ModelExt for M {
    async fn insert<C: GenericClient>(&mut self, client: &C) -> OrmResult<ExecResult> {
        let result = ModelQuery::insert(&*self).run(client).await?;
        if let Some(id) = result.last_insert_id {
            self.set_insert_id(id);
        }
        Ok(result)
    }

    async fn update<C: GenericClient>(&self, client: &C) -> OrmResult<u64> {
        let filter = self.primary_key_filter()?;
        let result = ModelQuery::update(self, &[]).filter(filter).run(client).await?;
        Ok(result.rows_affected)
    }

    async fn delete<C: GenericClient>(&self, client: &C) -> OrmResult<u64> {
        let filter = self.primary_key_filter()?;
        let result = ModelQuery::<M>::delete().filter(filter).run(client).await?;
        Ok(result.rows_affected)
    }
}
