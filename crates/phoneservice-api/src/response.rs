//! JSON response wrapper carrying a status and extra headers.

use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::Headers;

#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    /// `None` renders an empty body without a content type.
    pub value: Option<T>,
    pub status: StatusCode,
    pub headers: Headers,
}

impl<T> ApiResponse<T> {
    pub fn new(value: T, status: StatusCode) -> Self {
        Self {
            value: Some(value),
            status,
            headers: Vec::new(),
        }
    }

    pub fn ok(value: T) -> Self {
        Self::new(value, StatusCode::OK)
    }

    pub fn created(value: T, location: &str) -> Self {
        let response = Self::new(value, StatusCode::CREATED);
        match HeaderValue::from_str(location) {
            Ok(v) => response.with_header(header::LOCATION, v),
            Err(_) => response,
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers.extend(headers);
        self
    }
}

impl ApiResponse<()> {
    pub fn empty(status: StatusCode) -> Self {
        Self {
            value: None,
            status,
            headers: Vec::new(),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let mut builder = axum::http::Response::builder().status(self.status);
        let body = match &self.value {
            Some(value) => {
                builder = builder.header(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
                serde_json::to_vec(value).unwrap_or_else(|_| b"{}".to_vec())
            }
            None => Vec::new(),
        };
        for (n, v) in self.headers {
            builder = builder.header(n, v);
        }
        builder
            .body(axum::body::Body::from(body))
            .unwrap_or_else(|_| {
                axum::http::Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .header(
                        header::CONTENT_TYPE,
                        HeaderValue::from_static("application/json"),
                    )
                    .body(axum::body::Body::from("{}"))
                    .expect("build fallback response")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::json;

    #[tokio::test]
    async fn created_sets_location_and_body() {
        let resp = ApiResponse::created(json!({"id": 4}), "/api/phones/4")
            .with_header(
                HeaderName::from_static("x-extra"),
                HeaderValue::from_static("1"),
            )
            .into_response();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/api/phones/4");
        assert_eq!(resp.headers().get("x-extra").unwrap(), "1");
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], br#"{"id":4}"#);
    }

    #[tokio::test]
    async fn empty_response_has_no_body() {
        let resp = ApiResponse::empty(StatusCode::OK).into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get(header::CONTENT_TYPE).is_none());
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }
}
