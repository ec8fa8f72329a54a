//! Storage traits for the phone entity store and its search index.
//!
//! Implementations must be thread-safe (`Send + Sync`); the server shares a
//! single instance of each across all request handlers.

use async_trait::async_trait;
use phoneservice_core::{Phone, PhoneId};

use crate::error::StorageError;
use crate::page::{Page, PageRequest};
use crate::predicate::Predicate;

/// The authoritative store for phones.
///
/// # Example
///
/// ```ignore
/// use phoneservice_storage::{EntityStore, Predicate, StorageError};
///
/// async fn count(store: &dyn EntityStore) -> Result<u64, StorageError> {
///     Ok(store.find_all(&Predicate::all(), None).await?.total_elements)
/// }
/// ```
#[async_trait]
pub trait EntityStore: Send + Sync {
    // ==================== Writes ====================

    /// Persists a phone and returns it as stored.
    ///
    /// A phone without an id receives a fresh one from the store's sequence.
    /// A phone whose id is known replaces the stored row. A phone whose id is
    /// unknown is inserted under a fresh id; ids are never chosen by callers.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidEntity` if the backend rejects the values.
    async fn insert_or_replace(&self, phone: Phone) -> Result<Phone, StorageError>;

    /// Removes a phone. Removing an unknown id succeeds.
    async fn delete_by_id(&self, id: PhoneId) -> Result<(), StorageError>;

    // ==================== Reads ====================

    /// Reads a phone by id. Returns `None` if it does not exist.
    async fn find_by_id(&self, id: PhoneId) -> Result<Option<Phone>, StorageError>;

    /// Returns the phones matching `predicate`.
    ///
    /// With a page request the result is sorted by its keys (ties by id) and
    /// sliced; without one the full result is returned ordered by id.
    async fn find_all(
        &self,
        predicate: &Predicate,
        page: Option<&PageRequest>,
    ) -> Result<Page<Phone>, StorageError>;

    /// Counts the phones matching `predicate`.
    async fn count(&self, predicate: &Predicate) -> Result<u64, StorageError> {
        Ok(self.find_all(predicate, None).await?.total_elements)
    }

    /// Verifies the backend can serve requests.
    async fn health_check(&self) -> Result<(), StorageError> {
        Ok(())
    }

    /// Short backend identifier for logs.
    fn backend_name(&self) -> &'static str;
}

/// A denormalized, query-string searchable copy of the stored phones.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Indexes a phone under its id, replacing any previous document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidEntity` if the phone has no id.
    async fn upsert(&self, phone: &Phone) -> Result<(), StorageError>;

    /// Removes the document for `id`. Removing an unknown id succeeds.
    async fn delete_by_id(&self, id: PhoneId) -> Result<(), StorageError>;

    async fn exists_by_id(&self, id: PhoneId) -> Result<bool, StorageError>;

    async fn find_by_id(&self, id: PhoneId) -> Result<Option<Phone>, StorageError>;

    /// Runs a query string and returns one page of matching documents.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidQuery` if the query cannot be parsed.
    async fn search(
        &self,
        query: &str,
        page: Option<&PageRequest>,
    ) -> Result<Page<Phone>, StorageError>;

    /// Drops every document.
    async fn delete_all(&self) -> Result<(), StorageError>;

    fn backend_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test that EntityStore is object-safe
    fn _assert_entity_store_object_safe(_: &dyn EntityStore) {}

    // Compile-time test that SearchIndex is object-safe
    fn _assert_search_index_object_safe(_: &dyn SearchIndex) {}
}
