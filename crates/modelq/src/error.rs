//! Error types for modelq

use thiserror::Error;

/// Result type alias for modelq operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for query building and execution
#[derive(Debug, Error)]
pub enum OrmError {
    /// The operation needs a primary key but the table defines none
    #[error("No primary key defined for table '{0}'")]
    NoPrimaryKey(String),

    /// The statement kind does not support this operation
    #[error("Not supported call: {0}")]
    NotSupportedCall(String),

    /// Select without projection, or Insert/Update without assignments
    #[error("Not enough columns data for {0}")]
    NotEnoughColumns(&'static str),

    /// A column name that the table does not know about
    #[error("Unknown column '{column}' for table '{table}'")]
    UnknownColumn { table: String, column: String },

    /// IN filter built from an empty value list
    #[error("Empty IN list for column '{0}'")]
    EmptyInList(String),

    /// AND/OR group without children
    #[error("Empty {0} filter group")]
    EmptyFilterGroup(&'static str),

    /// Zero rows where exactly one was required
    #[error("No rows returned, expected exactly one")]
    NoRows,

    /// More than one row where exactly one was required
    #[error("Multiple rows returned, expected exactly one")]
    MultipleRows,

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Failure reported by a non-Postgres backend
    #[error("Driver error: {0}")]
    Driver(String),

    /// Row decode error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported-call error
    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::NotSupportedCall(message.into())
    }

    /// Create a driver error
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver(message.into())
    }

    /// Check if this is a "no rows" error
    pub fn is_no_rows(&self) -> bool {
        matches!(self, Self::NoRows)
    }

    /// Check if this is a "multiple rows" error
    pub fn is_multiple_rows(&self) -> bool {
        matches!(self, Self::MultipleRows)
    }

    /// Check if this error was raised while building SQL, before any I/O.
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            Self::NoPrimaryKey(_)
                | Self::NotSupportedCall(_)
                | Self::NotEnoughColumns(_)
                | Self::UnknownColumn { .. }
                | Self::EmptyInList(_)
                | Self::EmptyFilterGroup(_)
        )
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for OrmError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

#[cfg(feature = "mysql")]
impl From<mysql_async::Error> for OrmError {
    fn from(err: mysql_async::Error) -> Self {
        Self::Driver(err.to_string())
    }
}
