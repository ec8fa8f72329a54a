//! API errors and their `application/problem+json` rendering.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use phoneservice_storage::StorageError;
use serde::Serialize;
use thiserror::Error;

use crate::Headers;
use crate::alert::AlertHeaders;

pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// Problem type carried by every problem document this service emits.
pub const PROBLEM_TYPE: &str = "https://www.jhipster.tech/problem/problem-with-message";

/// Problem details document (RFC 7807) with the service's extension members.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_key: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<String>,
}

impl Problem {
    fn generic(status: StatusCode, detail: Option<String>) -> Self {
        Self {
            problem_type: PROBLEM_TYPE.to_string(),
            title: status.canonical_reason().unwrap_or("Error").to_string(),
            status: status.as_u16(),
            detail,
            entity_name: None,
            error_key: None,
            message: format!("error.http.{}", status.as_u16()),
            params: None,
        }
    }
}

/// High-level API errors mapped to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A request the client must fix, reported with failure alert headers.
    #[error("{title}")]
    BadRequestAlert {
        title: String,
        entity_name: String,
        error_key: String,
        headers: Headers,
    },
    #[error("Bad request: {0}")]
    BadRequest(String),
    /// Rendered with an empty body.
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request_alert(
        alerts: &AlertHeaders,
        title: impl Into<String>,
        entity_name: impl Into<String>,
        error_key: impl Into<String>,
    ) -> Self {
        let entity_name = entity_name.into();
        let error_key = error_key.into();
        Self::BadRequestAlert {
            title: title.into(),
            headers: alerts.failure(&entity_name, &error_key),
            entity_name,
            error_key,
        }
    }
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequestAlert { .. } | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The problem document for this error, `None` for errors without a body.
    pub fn to_problem(&self) -> Option<Problem> {
        let status = self.status_code();
        match self {
            ApiError::BadRequestAlert {
                title,
                entity_name,
                error_key,
                ..
            } => Some(Problem {
                problem_type: PROBLEM_TYPE.to_string(),
                title: title.clone(),
                status: status.as_u16(),
                detail: None,
                entity_name: Some(entity_name.clone()),
                error_key: Some(error_key.clone()),
                message: format!("error.{error_key}"),
                params: Some(entity_name.clone()),
            }),
            ApiError::BadRequest(msg) => Some(Problem::generic(status, Some(msg.clone()))),
            ApiError::NotFound(_) => None,
            // Backend details stay in the logs.
            ApiError::Internal(_) => Some(Problem::generic(status, None)),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidQuery { message } | StorageError::InvalidEntity { message } => {
                ApiError::BadRequest(message)
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let problem = self.to_problem();
        let extra = match self {
            ApiError::BadRequestAlert { headers, .. } => headers,
            _ => Vec::new(),
        };

        let mut builder = axum::http::Response::builder().status(status);
        for (n, v) in extra {
            builder = builder.header(n, v);
        }

        let body = match problem {
            Some(problem) => {
                builder = builder.header(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static(PROBLEM_CONTENT_TYPE),
                );
                serde_json::to_vec(&problem).unwrap_or_else(|_| b"{}".to_vec())
            }
            None => Vec::new(),
        };

        builder
            .body(axum::body::Body::from(body))
            .unwrap_or_else(|_| {
                axum::http::Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .header(
                        header::CONTENT_TYPE,
                        HeaderValue::from_static(PROBLEM_CONTENT_TYPE),
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

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn id_exists_problem_with_failure_headers() {
        let alerts = AlertHeaders::new("phoneserviceApp").unwrap();
        let err = ApiError::bad_request_alert(
            &alerts,
            "A new phone cannot already have an ID",
            "phone",
            "idexists",
        );
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            PROBLEM_CONTENT_TYPE
        );
        assert_eq!(
            resp.headers().get("x-phoneserviceapp-error").unwrap(),
            "error.idexists"
        );
        assert_eq!(
            resp.headers().get("x-phoneserviceapp-params").unwrap(),
            "phone"
        );

        let body = body_json(resp).await;
        assert_eq!(body["title"], "A new phone cannot already have an ID");
        assert_eq!(body["status"], 400);
        assert_eq!(body["entityName"], "phone");
        assert_eq!(body["errorKey"], "idexists");
        assert_eq!(body["message"], "error.idexists");
        assert_eq!(body["params"], "phone");
        assert!(body.get("detail").is_none());
    }

    #[tokio::test]
    async fn not_found_has_empty_body() {
        let resp = ApiError::not_found("phone 9").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(resp.headers().get(header::CONTENT_TYPE).is_none());
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn internal_hides_detail() {
        let resp = ApiError::internal("pool timed out").into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(resp).await;
        assert_eq!(body["message"], "error.http.500");
        assert!(body.get("detail").is_none());
    }

    #[test]
    fn storage_errors_map_to_status() {
        let cases = vec![
            (StorageError::invalid_query("x"), StatusCode::BAD_REQUEST),
            (StorageError::invalid_entity("x"), StatusCode::BAD_REQUEST),
            (
                StorageError::connection_error("x"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (StorageError::internal("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn bad_request_problem_carries_detail() {
        let problem = ApiError::bad_request("unknown sort field: color")
            .to_problem()
            .unwrap();
        assert_eq!(problem.status, 400);
        assert_eq!(problem.title, "Bad Request");
        assert_eq!(problem.detail.as_deref(), Some("unknown sort field: color"));
        assert_eq!(problem.message, "error.http.400");
    }
}
