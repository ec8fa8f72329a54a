//! Storage error types for the entity store and search index abstractions.

use std::fmt;

/// Errors that can occur during entity store or search index operations.
///
/// A missing entity is not an error: lookups return `Ok(None)` and deletes of
/// unknown ids succeed.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The search query could not be interpreted by the index.
    #[error("Invalid query: {message}")]
    InvalidQuery {
        /// Description of why the query is invalid.
        message: String,
    },

    /// The entity was rejected by the backend.
    #[error("Invalid entity: {message}")]
    InvalidEntity {
        /// Description of why the entity is invalid.
        message: String,
    },

    /// Failed to reach the storage backend.
    #[error("Connection error: {message}")]
    ConnectionError {
        /// Description of the connection error.
        message: String,
    },

    /// An internal storage error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `InvalidQuery` error.
    #[must_use]
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidEntity` error.
    #[must_use]
    pub fn invalid_entity(message: impl Into<String>) -> Self {
        Self::InvalidEntity {
            message: message.into(),
        }
    }

    /// Creates a new `ConnectionError` error.
    #[must_use]
    pub fn connection_error(message: impl Into<String>) -> Self {
        Self::ConnectionError {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if the caller supplied a query the backend cannot run.
    #[must_use]
    pub fn is_invalid_query(&self) -> bool {
        matches!(self, Self::InvalidQuery { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidQuery { .. } => ErrorCategory::Validation,
            Self::InvalidEntity { .. } => ErrorCategory::Validation,
            Self::ConnectionError { .. } => ErrorCategory::Infrastructure,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of storage errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Validation error.
    Validation,
    /// Infrastructure/connection error.
    Infrastructure,
    /// Internal error.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::invalid_query("unbalanced parenthesis");
        assert_eq!(err.to_string(), "Invalid query: unbalanced parenthesis");

        let err = StorageError::connection_error("refused");
        assert_eq!(err.to_string(), "Connection error: refused");
    }

    #[test]
    fn test_error_predicates() {
        assert!(StorageError::invalid_query("x").is_invalid_query());
        assert!(!StorageError::internal("x").is_invalid_query());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            StorageError::invalid_query("x").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            StorageError::invalid_entity("x").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            StorageError::connection_error("x").category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(StorageError::internal("x").category(), ErrorCategory::Internal);
        assert_eq!(ErrorCategory::Infrastructure.to_string(), "infrastructure");
    }
}
