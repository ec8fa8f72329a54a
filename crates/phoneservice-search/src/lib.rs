//! # phoneservice-search
//!
//! Implementations of the `SearchIndex` trait from `phoneservice-storage`:
//!
//! - [`InMemorySearchIndex`]: documents in a lock-free map, queries evaluated
//!   by the bundled [`query_string`] engine
//! - [`ElasticsearchIndex`]: documents in an Elasticsearch index, queries
//!   forwarded as `query_string` searches
//!
//! Both order hits by ascending id unless the page request says otherwise.

pub mod config;
pub mod elastic;
pub mod error;
pub mod memory;
pub mod query_string;

pub use config::ElasticsearchConfig;
pub use elastic::ElasticsearchIndex;
pub use error::ElasticsearchError;
pub use memory::InMemorySearchIndex;
pub use query_string::{Query, parse_query};
