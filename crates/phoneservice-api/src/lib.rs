//! # phoneservice-api
//!
//! Transport-level types shared by the phone service handlers:
//!
//! - [`ApiError`]: errors rendered as `application/problem+json`
//! - [`AlertHeaders`]: `X-{app}-alert` / `X-{app}-error` notification headers
//! - [`pagination`]: `X-Total-Count` and `Link` headers for paged results
//! - [`ApiResponse`]: a JSON body with a status and extra headers

pub mod alert;
pub mod error;
pub mod pagination;
pub mod response;

pub use alert::AlertHeaders;
pub use error::{ApiError, PROBLEM_CONTENT_TYPE, Problem};
pub use pagination::{pagination_headers, search_pagination_headers};
pub use response::ApiResponse;

/// Header list attached to a response.
pub type Headers = Vec<(axum::http::HeaderName, axum::http::HeaderValue)>;
