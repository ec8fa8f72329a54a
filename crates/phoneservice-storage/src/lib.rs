//! # phoneservice-storage
//!
//! Storage abstraction layer for the phone service.
//!
//! This crate defines the traits and types that the entity store and the
//! search index must implement, plus the backend-neutral query model shared
//! by both. Implementations live in separate crates.
//!
//! ## Overview
//!
//! - [`EntityStore`]: the authoritative record of phones
//! - [`SearchIndex`]: a query-string searchable copy of the same phones
//! - [`PhoneCriteria`] → [`Predicate`]: structured filtering
//! - [`PageRequest`] / [`Page`]: paging and sorting
//!
//! ## Example
//!
//! ```ignore
//! use phoneservice_storage::{EntityStore, PageRequest, PhoneCriteria, StringFilter};
//!
//! async fn by_brand(store: &dyn EntityStore, brand: &str) -> StorageResult<Page<Phone>> {
//!     let criteria = PhoneCriteria {
//!         brand: Some(StringFilter::equals(brand)),
//!         ..PhoneCriteria::default()
//!     };
//!     store
//!         .find_all(&criteria.to_predicate(), Some(&PageRequest::new(0, 20)))
//!         .await
//! }
//! ```

pub mod criteria;
mod error;
pub mod page;
pub mod predicate;
mod traits;

pub use criteria::{Filter, PhoneCriteria, RangeFilter, StringFilter, create_predicate};
pub use error::{ErrorCategory, StorageError};
pub use page::{Direction, Order, Page, PageRequest, compare_phones, paginate};
pub use predicate::{Clause, Condition, FieldValue, Predicate};
pub use traits::{EntityStore, SearchIndex};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Shared entity store trait object.
pub type DynEntityStore = std::sync::Arc<dyn EntityStore>;

/// Shared search index trait object.
pub type DynSearchIndex = std::sync::Arc<dyn SearchIndex>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use phoneservice_storage::prelude::*;
/// ```
pub mod prelude {
    pub use crate::criteria::{Filter, PhoneCriteria, RangeFilter, StringFilter};
    pub use crate::error::{ErrorCategory, StorageError};
    pub use crate::page::{Direction, Order, Page, PageRequest};
    pub use crate::predicate::{Clause, Condition, FieldValue, Predicate};
    pub use crate::traits::{EntityStore, SearchIndex};
    pub use crate::{DynEntityStore, DynSearchIndex, StorageResult};
}
