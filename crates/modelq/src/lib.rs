//! # modelq
//!
//! A dialect-aware SQL query builder and data-access runtime for models
//! generated from a live database schema.
//!
//! ## Features
//!
//! - **Composable filters**: `Filter` trees render to parenthesized SQL with
//!   parameters in placeholder order
//! - **One query value per statement**: Select, Insert, Update and Delete share
//!   a fluent builder; clauses a statement does not support are ignored
//! - **Two dialects**: MySQL (`` `ident` ``, `LIMIT ?, ?`) and Postgres
//!   (`"ident"`, `LIMIT $n OFFSET $m`)
//! - **Two backends**: `tokio-postgres` (`PgClient`, and `PgPool` with the
//!   `pool` feature) and `mysql_async` (`MySqlClient`, `mysql` feature)
//! - **Transaction-friendly**: pass a transaction anywhere a `GenericClient` is
//!   expected; bare writes run in their own transaction
//! - **Injected monitoring**: wrap a client in `InstrumentedClient` to trace
//!   every statement
//!
//! ## Example
//!
//! ```ignore
//! use modelq::{Filter, TableModel};
//!
//! static USER: TableModel = TableModel::new("public", "user")
//!     .with_alias("User")
//!     .with_columns(&["id", "name", "age"])
//!     .with_primary_key("id");
//!
//! let mut names = Vec::new();
//! USER.select(&["name"])
//!     .filter(Filter::unit("age", ">", 18).and(Filter::in_list("id", [1, 2, 3])))
//!     .order_by(&["-age"])
//!     .page(2, 20)
//!     .select_list(&client, |_, cells| {
//!         names.push(modelq::row::as_string(&cells[0]));
//!         true
//!     })
//!     .await?;
//! ```

pub mod client;
pub mod dialect;
pub mod error;
pub mod filter;
pub mod model;
pub mod monitor;
#[cfg(feature = "mysql")]
pub mod mysql;
pub mod postgres;
pub mod query;
pub mod row;
pub mod table;
pub mod transaction;
pub mod value;

mod exec;

#[cfg(test)]
mod testing;

pub use client::{Connection, ExecResult, GenericClient, RawCell, RowVisitor, Transaction};
pub use dialect::Dialect;
pub use error::{OrmError, OrmResult};
pub use filter::Filter;
pub use model::{Model, ModelExt, ModelQuery};
pub use monitor::{
    CompositeMonitor, InstrumentedClient, NoopMonitor, QueryContext, QueryMonitor, QueryResult,
    QueryStats, QueryType, StatsMonitor,
};
pub use query::{BuiltQuery, Clause, OrderBy, Query, SortOrder, StatementKind};
pub use row::FromCell;
pub use table::{Column, TableModel};
pub use value::Value;

#[cfg(feature = "tracing")]
pub use monitor::TracingMonitor;

pub use postgres::PgClient;

#[cfg(feature = "pool")]
pub use postgres::{PgPool, create_pool, create_pool_with_config};

#[cfg(feature = "mysql")]
pub use mysql::MySqlClient;
