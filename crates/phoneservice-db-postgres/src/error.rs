//! Error types for the PostgreSQL entity store.

use phoneservice_storage::StorageError;
use sqlx_core::error::Error as SqlxError;

/// PostgreSQL error code for a value too long for its column (22001).
pub const PG_STRING_DATA_RIGHT_TRUNCATION: &str = "22001";

/// PostgreSQL error code for a numeric value outside its column's precision (22003).
pub const PG_NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

/// Checks if a sqlx error has a specific PostgreSQL error code.
pub fn has_pg_error_code(err: &SqlxError, code: &str) -> bool {
    if let SqlxError::Database(db_err) = err {
        db_err.code().as_deref() == Some(code)
    } else {
        false
    }
}

/// Checks if the database rejected a value because the column cannot hold it.
pub fn is_value_rejected(err: &SqlxError) -> bool {
    has_pg_error_code(err, PG_STRING_DATA_RIGHT_TRUNCATION)
        || has_pg_error_code(err, PG_NUMERIC_VALUE_OUT_OF_RANGE)
}

/// Errors specific to the PostgreSQL entity store.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    /// Database connection error.
    #[error("Database connection error: {0}")]
    Connection(#[from] SqlxError),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(String),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl PostgresError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<PostgresError> for StorageError {
    fn from(err: PostgresError) -> Self {
        match err {
            PostgresError::Connection(e) => StorageError::connection_error(e.to_string()),
            PostgresError::Migration(e) => StorageError::internal(format!("Migration error: {e}")),
            PostgresError::Config { message } => {
                StorageError::internal(format!("Configuration error: {message}"))
            }
        }
    }
}

/// Maps a failed statement to a storage error.
pub(crate) fn query_error(context: &str, err: SqlxError) -> StorageError {
    if is_value_rejected(&err) {
        return StorageError::invalid_entity(format!("{context}: {err}"));
    }
    match err {
        SqlxError::PoolTimedOut | SqlxError::PoolClosed | SqlxError::Io(_) | SqlxError::Tls(_) => {
            StorageError::connection_error(format!("{context}: {err}"))
        }
        other => StorageError::internal(format!("{context}: {other}")),
    }
}

/// Result type alias for PostgreSQL operations.
pub type Result<T> = std::result::Result<T, PostgresError>;
