//! `mysql_async` backend.
//!
//! [`MySqlClient`] wraps a `mysql_async` pool and speaks
//! [`Dialect::MySql`](crate::Dialect::MySql). Every statement checks out a
//! connection for its own duration; a transaction pins one connection until
//! commit or rollback. Bare writes run in their own transaction.
//!
//! MySQL reports the generated key of an `AUTO_INCREMENT` insert, so
//! [`ExecResult::last_insert_id`](crate::ExecResult::last_insert_id) is set
//! when the server sends a non-zero id.

mod client;
mod types;

pub use client::{MySqlClient, MySqlTransaction};
