//! In-memory search index.

use async_trait::async_trait;
use papaya::HashMap as PapayaHashMap;
use phoneservice_core::{Phone, PhoneId};
use phoneservice_storage::{Page, PageRequest, SearchIndex, StorageError, paginate};

use crate::query_string::parse_query;

/// Search index holding documents in a papaya lock-free HashMap and
/// evaluating query strings in process.
#[derive(Debug, Default)]
pub struct InMemorySearchIndex {
    documents: PapayaHashMap<PhoneId, Phone>,
}

impl InMemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.pin().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SearchIndex for InMemorySearchIndex {
    async fn upsert(&self, phone: &Phone) -> Result<(), StorageError> {
        let id = phone
            .id
            .ok_or_else(|| StorageError::invalid_entity("Cannot index a phone without an id"))?;
        self.documents.pin().insert(id, phone.clone());
        tracing::debug!(id, "indexed phone");
        Ok(())
    }

    async fn delete_by_id(&self, id: PhoneId) -> Result<(), StorageError> {
        self.documents.pin().remove(&id);
        Ok(())
    }

    async fn exists_by_id(&self, id: PhoneId) -> Result<bool, StorageError> {
        Ok(self.documents.pin().contains_key(&id))
    }

    async fn find_by_id(&self, id: PhoneId) -> Result<Option<Phone>, StorageError> {
        Ok(self.documents.pin().get(&id).cloned())
    }

    async fn search(
        &self,
        query: &str,
        page: Option<&PageRequest>,
    ) -> Result<Page<Phone>, StorageError> {
        let query = parse_query(query)?;
        let hits: Vec<Phone> = {
            let guard = self.documents.pin();
            guard
                .values()
                .filter(|phone| query.matches(phone))
                .cloned()
                .collect()
        };
        tracing::debug!(hits = hits.len(), "in-memory search");
        Ok(paginate(hits, page))
    }

    async fn delete_all(&self) -> Result<(), StorageError> {
        self.documents.pin().clear();
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "in-memory"
    }
}
