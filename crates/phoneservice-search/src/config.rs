//! Configuration types for the Elasticsearch search backend.

use serde::{Deserialize, Serialize};

/// Configuration for the Elasticsearch search backend.
///
/// Missing keys take their [`Default`] values when deserialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ElasticsearchConfig {
    /// Base URL of the cluster: `http://host:9200`
    pub url: String,

    /// Name of the index holding phone documents.
    pub index: String,

    /// Request timeout in milliseconds.
    pub timeout_ms: u64,

    /// Whether writes wait for the index to refresh before returning.
    pub refresh: bool,
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".into(),
            index: "phone".into(),
            timeout_ms: 5000,
            refresh: false,
        }
    }
}

impl ElasticsearchConfig {
    /// Creates a new configuration with the given base URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the index name.
    #[must_use]
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout_ms(mut self, timeout: u64) -> Self {
        self.timeout_ms = timeout;
        self
    }

    /// Sets whether writes request an immediate refresh.
    #[must_use]
    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }
}
