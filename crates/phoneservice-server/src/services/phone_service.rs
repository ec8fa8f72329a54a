//! Mutations and simple reads over phones.
//!
//! Every write goes to the entity store first and is then mirrored into the
//! search index. The mirror is best effort: an index failure is logged and
//! the entity store result is returned unchanged.

use phoneservice_core::{PhoneDto, PhoneId, mapper};
use phoneservice_storage::{
    DynEntityStore, DynSearchIndex, Page, PageRequest, Predicate, StorageResult,
};
use tracing::{debug, warn};

#[derive(Clone)]
pub struct PhoneService {
    store: DynEntityStore,
    index: DynSearchIndex,
}

impl PhoneService {
    pub fn new(store: DynEntityStore, index: DynSearchIndex) -> Self {
        Self { store, index }
    }

    /// Stores a phone and mirrors the stored row into the search index.
    ///
    /// # Errors
    ///
    /// Returns the entity store error; the index is not touched in that case.
    pub async fn save(&self, dto: PhoneDto) -> StorageResult<PhoneDto> {
        debug!(phone = ?dto, "Request to save Phone");
        let stored = self.store.insert_or_replace(mapper::to_entity(&dto)).await?;
        let result = mapper::to_dto(&stored);
        if let Err(e) = self.index.upsert(&stored).await {
            warn!(
                phone.id = ?stored.id,
                index = self.index.backend_name(),
                error = %e,
                "Failed to index saved Phone"
            );
        }
        Ok(result)
    }

    pub async fn find_all(&self, page: Option<&PageRequest>) -> StorageResult<Page<PhoneDto>> {
        debug!(?page, "Request to get all Phones");
        let phones = self.store.find_all(&Predicate::all(), page).await?;
        Ok(phones.map(PhoneDto::from))
    }

    /// Returns `None` when no phone has this id.
    pub async fn find_one(&self, id: PhoneId) -> StorageResult<Option<PhoneDto>> {
        debug!(id, "Request to get Phone");
        Ok(self.store.find_by_id(id).await?.map(PhoneDto::from))
    }

    /// Deletes from the entity store, then from the search index.
    pub async fn delete(&self, id: PhoneId) -> StorageResult<()> {
        debug!(id, "Request to delete Phone");
        self.store.delete_by_id(id).await?;
        if let Err(e) = self.index.delete_by_id(id).await {
            warn!(
                phone.id = id,
                index = self.index.backend_name(),
                error = %e,
                "Failed to remove deleted Phone from the search index"
            );
        }
        Ok(())
    }

    /// Runs a query string against the search index only.
    pub async fn search(
        &self,
        query: &str,
        page: Option<&PageRequest>,
    ) -> StorageResult<Page<PhoneDto>> {
        debug!(query, ?page, "Request to search for a page of Phones");
        let phones = self.index.search(query, page).await?;
        Ok(phones.map(PhoneDto::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use phoneservice_core::{BigDecimal, Phone};
    use phoneservice_db_memory::InMemoryEntityStore;
    use phoneservice_search::InMemorySearchIndex;
    use phoneservice_storage::{SearchIndex, StorageError};
    use std::sync::Arc;

    /// Index whose writes always fail.
    struct BrokenIndex;

    #[async_trait]
    impl SearchIndex for BrokenIndex {
        async fn upsert(&self, _phone: &Phone) -> Result<(), StorageError> {
            Err(StorageError::connection_error("index down"))
        }
        async fn delete_by_id(&self, _id: PhoneId) -> Result<(), StorageError> {
            Err(StorageError::connection_error("index down"))
        }
        async fn exists_by_id(&self, _id: PhoneId) -> Result<bool, StorageError> {
            Err(StorageError::connection_error("index down"))
        }
        async fn find_by_id(&self, _id: PhoneId) -> Result<Option<Phone>, StorageError> {
            Err(StorageError::connection_error("index down"))
        }
        async fn search(
            &self,
            _query: &str,
            _page: Option<&PageRequest>,
        ) -> Result<Page<Phone>, StorageError> {
            Err(StorageError::connection_error("index down"))
        }
        async fn delete_all(&self) -> Result<(), StorageError> {
            Ok(())
        }
        fn backend_name(&self) -> &'static str {
            "broken"
        }
    }

    fn service() -> (PhoneService, Arc<InMemorySearchIndex>) {
        let index = Arc::new(InMemorySearchIndex::new());
        let service = PhoneService::new(Arc::new(InMemoryEntityStore::new()), index.clone());
        (service, index)
    }

    fn dto(name: &str, brand: &str, price: i64) -> PhoneDto {
        PhoneDto {
            id: None,
            name: Some(name.into()),
            brand: Some(brand.into()),
            price: Some(BigDecimal::from(price)),
        }
    }

    #[tokio::test]
    async fn save_assigns_id_and_mirrors_into_index() {
        let (service, index) = service();
        let saved = service.save(dto("AAAAAAAAAA", "AAAAAAAAAA", 1)).await.unwrap();
        let id = saved.id.unwrap();

        assert_eq!(service.find_one(id).await.unwrap(), Some(saved.clone()));
        let indexed = index.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(PhoneDto::from(indexed), saved);
    }

    #[tokio::test]
    async fn update_replaces_fields_in_both_stores() {
        let (service, index) = service();
        let saved = service.save(dto("AAAAAAAAAA", "AAAAAAAAAA", 1)).await.unwrap();
        let id = saved.id.unwrap();

        let updated = service
            .save(PhoneDto {
                id: Some(id),
                ..dto("BBBBBBBBBB", "BBBBBBBBBB", 2)
            })
            .await
            .unwrap();
        assert_eq!(updated.id, Some(id));
        assert_eq!(updated.price, Some(BigDecimal::from(2)));
        let indexed = index.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(indexed.name.as_deref(), Some("BBBBBBBBBB"));
    }

    #[tokio::test]
    async fn delete_removes_from_both_stores() {
        let (service, index) = service();
        let id = service
            .save(dto("AAAAAAAAAA", "AAAAAAAAAA", 1))
            .await
            .unwrap()
            .id
            .unwrap();

        service.delete(id).await.unwrap();
        assert_eq!(service.find_one(id).await.unwrap(), None);
        assert!(!index.exists_by_id(id).await.unwrap());

        // Deleting again is a no-op
        service.delete(id).await.unwrap();
    }

    #[tokio::test]
    async fn index_failures_do_not_fail_writes() {
        let service = PhoneService::new(
            Arc::new(InMemoryEntityStore::new()),
            Arc::new(BrokenIndex),
        );
        let saved = service.save(dto("X", "Y", 3)).await.unwrap();
        let id = saved.id.unwrap();
        assert_eq!(service.find_one(id).await.unwrap(), Some(saved));

        service.delete(id).await.unwrap();
        assert_eq!(service.find_one(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn search_failures_surface() {
        let service = PhoneService::new(
            Arc::new(InMemoryEntityStore::new()),
            Arc::new(BrokenIndex),
        );
        let err = service.search("*", None).await.unwrap_err();
        assert!(matches!(err, StorageError::ConnectionError { .. }));

        let (service, _) = self::service();
        let err = service.search("name:(", None).await.unwrap_err();
        assert!(err.is_invalid_query());
    }

    #[tokio::test]
    async fn search_reads_index_only() {
        let (service, index) = service();
        let saved = service.save(dto("Pixel", "Google", 5)).await.unwrap();
        service.save(dto("Galaxy", "Samsung", 6)).await.unwrap();

        let page = service
            .search("brand:google", Some(&PageRequest::new(0, 20)))
            .await
            .unwrap();
        assert_eq!(page.content, vec![saved.clone()]);

        // A row known only to the index is still found
        index
            .upsert(&Phone::new("Ghost", "Google", 1).with_id(99))
            .await
            .unwrap();
        let page = service.search("brand:google", None).await.unwrap();
        assert_eq!(page.total_elements, 2);
        assert_eq!(service.find_one(99).await.unwrap(), None);
    }

    #[tokio::test]
    async fn find_all_pages_through_store() {
        let (service, _) = service();
        for i in 0..5 {
            service.save(dto(&format!("P{i}"), "B", i)).await.unwrap();
        }
        let page = service
            .find_all(Some(&PageRequest::new(1, 2)))
            .await
            .unwrap();
        assert_eq!(page.total_elements, 5);
        assert_eq!(page.content.len(), 2);
        assert_eq!(page.content[0].name.as_deref(), Some("P2"));
    }
}
