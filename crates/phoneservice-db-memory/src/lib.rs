//! In-memory entity store backend for the phone service.
//!
//! This crate provides an implementation of the `EntityStore` trait from
//! `phoneservice-storage`, using a papaya lock-free HashMap for concurrent access.
//!
//! # Example
//!
//! ```ignore
//! use phoneservice_db_memory::InMemoryEntityStore;
//! use phoneservice_storage::EntityStore;
//!
//! let store = InMemoryEntityStore::new();
//! let saved = store.insert_or_replace(Phone::new("Pixel", "Google", 499)).await?;
//! assert_eq!(saved.id, Some(1));
//! ```

pub mod store;

pub use phoneservice_storage::{EntityStore, StorageError};
pub use store::InMemoryEntityStore;

/// Creates a new shareable in-memory entity store.
pub fn create_entity_store() -> phoneservice_storage::DynEntityStore {
    std::sync::Arc::new(InMemoryEntityStore::new())
}
