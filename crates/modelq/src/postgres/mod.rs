//! `tokio-postgres` backend.
//!
//! [`PgClient`] wraps a single session, [`PgPool`] a `deadpool-postgres`
//! pool. Both speak [`Dialect::Postgres`](crate::Dialect::Postgres) and run
//! bare writes in their own transaction.
//!
//! Postgres reports no generated key for plain `INSERT`, so
//! [`ExecResult::last_insert_id`](crate::ExecResult::last_insert_id) is
//! always `None` here.

mod client;
mod types;

#[cfg(feature = "pool")]
mod pool;

pub use client::{PgClient, PgTransaction};
pub use types::TextCell;

#[cfg(feature = "pool")]
pub use pool::{PgPool, create_pool, create_pool_with_config};
