//! Application services wired over the entity store and the search index.

pub mod phone_query_service;
pub mod phone_service;

pub use phone_query_service::PhoneQueryService;
pub use phone_service::PhoneService;
