use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use papaya::HashMap as PapayaHashMap;
use phoneservice_core::{Phone, PhoneId};
use phoneservice_storage::{EntityStore, Page, PageRequest, Predicate, StorageError, paginate};

/// In-memory phone store using a papaya lock-free HashMap.
///
/// Ids come from an atomic sequence starting at 1 and are never reused.
#[derive(Debug)]
pub struct InMemoryEntityStore {
    data: PapayaHashMap<PhoneId, Phone>,
    sequence: AtomicI64,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self {
            data: PapayaHashMap::new(),
            sequence: AtomicI64::new(1),
        }
    }

    fn next_id(&self) -> PhoneId {
        self.sequence.fetch_add(1, Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.data.pin().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryEntityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn insert_or_replace(&self, phone: Phone) -> Result<Phone, StorageError> {
        let guard = self.data.pin();

        if let Some(id) = phone.id {
            let replacement = phone.clone();
            if guard.update(id, move |_| replacement.clone()).is_some() {
                tracing::debug!(id, "replaced phone");
                return Ok(phone);
            }
        }

        let stored = Phone {
            id: Some(self.next_id()),
            ..phone
        };
        if let Some(id) = stored.id {
            guard.insert(id, stored.clone());
            tracing::debug!(id, "inserted phone");
        }
        Ok(stored)
    }

    async fn delete_by_id(&self, id: PhoneId) -> Result<(), StorageError> {
        let guard = self.data.pin();
        if guard.remove(&id).is_some() {
            tracing::debug!(id, "deleted phone");
        }
        Ok(())
    }

    async fn find_by_id(&self, id: PhoneId) -> Result<Option<Phone>, StorageError> {
        let guard = self.data.pin();
        Ok(guard.get(&id).cloned())
    }

    async fn find_all(
        &self,
        predicate: &Predicate,
        page: Option<&PageRequest>,
    ) -> Result<Page<Phone>, StorageError> {
        let matching: Vec<Phone> = {
            let guard = self.data.pin();
            guard
                .values()
                .filter(|phone| predicate.matches(phone))
                .cloned()
                .collect()
        };
        Ok(paginate(matching, page))
    }

    async fn count(&self, predicate: &Predicate) -> Result<u64, StorageError> {
        let guard = self.data.pin();
        Ok(guard.values().filter(|p| predicate.matches(p)).count() as u64)
    }

    fn backend_name(&self) -> &'static str {
        "in-memory-papaya"
    }
}

#[cfg(test)]
mod tests {
    use phoneservice_core::{BigDecimal, PhoneField};
    use phoneservice_storage::{Condition, Order};

    use super::*;

    fn default_phone() -> Phone {
        Phone::new("AAAAAAAAAA", "AAAAAAAAAA", 1)
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let store = InMemoryEntityStore::new();
        let first = store.insert_or_replace(default_phone()).await.unwrap();
        let second = store.insert_or_replace(default_phone()).await.unwrap();
        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn replace_keeps_id() {
        let store = InMemoryEntityStore::new();
        let saved = store.insert_or_replace(default_phone()).await.unwrap();
        let updated = saved.clone().with_name("BBBBBBBBBB").with_price(2);
        let replaced = store.insert_or_replace(updated.clone()).await.unwrap();

        assert_eq!(replaced, updated);
        assert_eq!(store.len(), 1);
        let found = store.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(found.name.as_deref(), Some("BBBBBBBBBB"));
        assert_eq!(found.price, Some(BigDecimal::from(2)));
    }

    #[tokio::test]
    async fn unknown_id_gets_a_fresh_one() {
        let store = InMemoryEntityStore::new();
        let saved = store
            .insert_or_replace(default_phone().with_id(42))
            .await
            .unwrap();
        assert_eq!(saved.id, Some(1));
        assert!(store.find_by_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = InMemoryEntityStore::new();
        let saved = store.insert_or_replace(default_phone()).await.unwrap();
        let id = saved.id.unwrap();

        store.delete_by_id(id).await.unwrap();
        store.delete_by_id(id).await.unwrap();
        assert!(store.find_by_id(id).await.unwrap().is_none());
        assert!(store.is_empty());

        // Ids are not reused after deletion.
        let next = store.insert_or_replace(default_phone()).await.unwrap();
        assert_eq!(next.id, Some(2));
    }

    #[tokio::test]
    async fn find_all_filters_sorts_and_pages() {
        let store = InMemoryEntityStore::new();
        for (name, price) in [("c", 3), ("a", 1), ("b", 2), ("d", 4)] {
            store
                .insert_or_replace(Phone::new(name, "Acme", price))
                .await
                .unwrap();
        }

        let predicate =
            Predicate::all().and(PhoneField::Price, Condition::greater_than(BigDecimal::from(1)));
        let request = PageRequest::new(0, 2).with_sort(Order::asc(PhoneField::Name));
        let page = store.find_all(&predicate, Some(&request)).await.unwrap();

        let names: Vec<_> = page.content.iter().filter_map(|p| p.name.as_deref()).collect();
        assert_eq!(names, vec!["b", "c"]);
        assert_eq!(page.total_elements, 3);
        assert!(page.has_next());
        assert_eq!(store.count(&predicate).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn find_all_without_page_returns_everything_by_id() {
        let store = InMemoryEntityStore::new();
        for _ in 0..3 {
            store.insert_or_replace(default_phone()).await.unwrap();
        }
        let page = store.find_all(&Predicate::all(), None).await.unwrap();
        let ids: Vec<_> = page.content.iter().filter_map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn backend_name() {
        assert_eq!(InMemoryEntityStore::new().backend_name(), "in-memory-papaya");
    }
}
