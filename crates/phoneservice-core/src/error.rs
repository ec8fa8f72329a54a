use thiserror::Error;

/// Core error types for phone service operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Unknown phone field: {0}")]
    UnknownField(String),

    #[error("Invalid value '{value}' for field {field}: {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid decimal: {0}")]
    InvalidDecimal(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a new UnknownField error
    pub fn unknown_field(name: impl Into<String>) -> Self {
        Self::UnknownField(name.into())
    }

    /// Create a new InvalidValue error
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a new InvalidDecimal error
    pub fn invalid_decimal(value: impl Into<String>) -> Self {
        Self::InvalidDecimal(value.into())
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
