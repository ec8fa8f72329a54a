//! Elasticsearch backend error types.

use phoneservice_storage::StorageError;

/// Errors raised while talking to Elasticsearch.
#[derive(Debug, thiserror::Error)]
pub enum ElasticsearchError {
    /// The configured base URL cannot address documents.
    #[error("Invalid Elasticsearch URL: {0}")]
    InvalidUrl(String),

    /// The request never produced a response.
    #[error("Elasticsearch transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Elasticsearch rejected a query.
    #[error("Elasticsearch rejected the query: {0}")]
    BadQuery(String),

    /// Elasticsearch answered with an unexpected status.
    #[error("Elasticsearch returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("Failed to decode Elasticsearch response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<ElasticsearchError> for StorageError {
    fn from(err: ElasticsearchError) -> Self {
        match &err {
            ElasticsearchError::BadQuery(reason) => StorageError::invalid_query(reason.clone()),
            ElasticsearchError::Transport(_) => StorageError::connection_error(err.to_string()),
            _ => StorageError::internal(err.to_string()),
        }
    }
}
