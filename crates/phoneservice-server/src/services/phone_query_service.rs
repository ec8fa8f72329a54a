//! Read-only filtered queries over the entity store.

use phoneservice_core::PhoneDto;
use phoneservice_storage::{
    DynEntityStore, Page, PageRequest, PhoneCriteria, StorageResult, create_predicate,
};
use tracing::debug;

#[derive(Clone)]
pub struct PhoneQueryService {
    store: DynEntityStore,
}

impl PhoneQueryService {
    pub fn new(store: DynEntityStore) -> Self {
        Self { store }
    }

    /// Returns the phones matching `criteria`; everything when it is `None`.
    ///
    /// Without a page request the whole matching set comes back unpaged.
    pub async fn find_by_criteria(
        &self,
        criteria: Option<&PhoneCriteria>,
        page: Option<&PageRequest>,
    ) -> StorageResult<Page<PhoneDto>> {
        debug!(?criteria, ?page, "find by criteria");
        let predicate = create_predicate(criteria);
        let phones = self.store.find_all(&predicate, page).await?;
        Ok(phones.map(PhoneDto::from))
    }

    pub async fn count_by_criteria(&self, criteria: Option<&PhoneCriteria>) -> StorageResult<u64> {
        debug!(?criteria, "count by criteria");
        self.store.count(&create_predicate(criteria)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phoneservice_core::{BigDecimal, Phone};
    use phoneservice_db_memory::InMemoryEntityStore;
    use phoneservice_storage::{EntityStore, Filter, Order, RangeFilter, StringFilter};
    use std::sync::Arc;

    async fn seeded() -> PhoneQueryService {
        let store = Arc::new(InMemoryEntityStore::new());
        for (name, brand, price) in [
            ("AAAAAAAAAA", "Acme", 1),
            ("BBBBBBBBBB", "Acme", 2),
            ("CCCCCCCCCC", "Other", 3),
        ] {
            store
                .insert_or_replace(Phone::new(name, brand, price))
                .await
                .unwrap();
        }
        store
            .insert_or_replace(Phone {
                name: Some("NoPrice".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        PhoneQueryService::new(store)
    }

    fn names(page: &Page<PhoneDto>) -> Vec<&str> {
        page.content
            .iter()
            .filter_map(|p| p.name.as_deref())
            .collect()
    }

    #[tokio::test]
    async fn empty_criteria_return_everything() {
        let service = seeded().await;
        let all = service.find_by_criteria(None, None).await.unwrap();
        assert_eq!(all.total_elements, 4);
        let paged = service
            .find_by_criteria(Some(&PhoneCriteria::default()), Some(&PageRequest::new(0, 2)))
            .await
            .unwrap();
        assert_eq!(paged.total_elements, 4);
        assert_eq!(paged.content.len(), 2);
    }

    #[tokio::test]
    async fn name_equals_selects_exact_match() {
        let service = seeded().await;
        let criteria = PhoneCriteria {
            name: Some(StringFilter::equals("AAAAAAAAAA")),
            ..Default::default()
        };
        let page = service.find_by_criteria(Some(&criteria), None).await.unwrap();
        assert_eq!(names(&page), vec!["AAAAAAAAAA"]);

        let criteria = PhoneCriteria {
            name: Some(StringFilter::equals("aaaaaaaaaa")),
            ..Default::default()
        };
        let page = service.find_by_criteria(Some(&criteria), None).await.unwrap();
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn price_in_selects_listed_prices() {
        let service = seeded().await;
        let criteria = PhoneCriteria {
            price: Some(RangeFilter {
                filter: Filter {
                    in_list: Some(vec![BigDecimal::from(1), BigDecimal::from(2)]),
                    ..Default::default()
                },
                ..Default::default()
            }),
            ..Default::default()
        };
        let page = service.find_by_criteria(Some(&criteria), None).await.unwrap();
        assert_eq!(names(&page), vec!["AAAAAAAAAA", "BBBBBBBBBB"]);
        assert_eq!(service.count_by_criteria(Some(&criteria)).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn price_unspecified_and_sorted_page() {
        let service = seeded().await;
        let criteria = PhoneCriteria {
            price: Some(RangeFilter {
                filter: Filter {
                    specified: Some(false),
                    ..Default::default()
                },
                ..Default::default()
            }),
            ..Default::default()
        };
        let page = service.find_by_criteria(Some(&criteria), None).await.unwrap();
        assert_eq!(names(&page), vec!["NoPrice"]);

        let request =
            PageRequest::new(0, 10).with_sort(Order::desc(phoneservice_core::PhoneField::Price));
        let page = service.find_by_criteria(None, Some(&request)).await.unwrap();
        assert_eq!(
            names(&page),
            vec!["NoPrice", "CCCCCCCCCC", "BBBBBBBBBB", "AAAAAAAAAA"]
        );
    }
}
