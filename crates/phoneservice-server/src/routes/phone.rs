//! REST resource for phones.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::{JsonRejection, PathRejection, QueryRejection}},
    http::StatusCode,
    routing::get,
};
use phoneservice_api::{
    ApiError, ApiResponse, pagination_headers, search_pagination_headers,
};
use phoneservice_core::{ENTITY_NAME, PhoneDto, PhoneId};
use tracing::debug;

use super::storage_error;
use crate::params::{self, QueryPairs};
use crate::server::AppState;

type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/phones",
            get(get_all_phones).post(create_phone).put(update_phone),
        )
        .route("/phones/count", get(count_phones))
        .route("/phones/{id}", get(get_phone).delete(delete_phone))
        .route("/_search/phones", get(search_phones))
}

fn body(payload: Result<Json<PhoneDto>, JsonRejection>) -> Result<PhoneDto, ApiError> {
    payload
        .map(|Json(dto)| dto)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

fn path_id(id: Result<Path<PhoneId>, PathRejection>) -> Result<PhoneId, ApiError> {
    id.map(|Path(id)| id)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

fn query_pairs(query: Result<Query<QueryPairs>, QueryRejection>) -> Result<QueryPairs, ApiError> {
    query
        .map(|Query(pairs)| pairs)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

async fn save_new(state: &AppState, dto: PhoneDto) -> ApiResult<PhoneDto> {
    let result = state.phone_service.save(dto).await.map_err(storage_error)?;
    let id = result.id.map(|id| id.to_string()).unwrap_or_default();
    let location = format!("{}/phones/{id}", state.base_path);
    Ok(ApiResponse::created(result, &location)
        .with_headers(state.alerts.entity_created(ENTITY_NAME, &id)))
}

/// `POST /phones`: creates a phone; the body must not carry an id.
pub async fn create_phone(
    State(state): State<AppState>,
    payload: Result<Json<PhoneDto>, JsonRejection>,
) -> ApiResult<PhoneDto> {
    let dto = body(payload)?;
    debug!(phone = ?dto, "REST request to save Phone");
    if dto.id.is_some() {
        return Err(ApiError::bad_request_alert(
            &state.alerts,
            "A new phone cannot already have an ID",
            ENTITY_NAME,
            "idexists",
        ));
    }
    save_new(&state, dto).await
}

/// `PUT /phones`: replaces a phone, or creates it when the body has no id.
pub async fn update_phone(
    State(state): State<AppState>,
    payload: Result<Json<PhoneDto>, JsonRejection>,
) -> ApiResult<PhoneDto> {
    let dto = body(payload)?;
    debug!(phone = ?dto, "REST request to update Phone");
    if dto.id.is_none() {
        return save_new(&state, dto).await;
    }
    let result = state.phone_service.save(dto).await.map_err(storage_error)?;
    let id = result.id.map(|id| id.to_string()).unwrap_or_default();
    Ok(ApiResponse::ok(result).with_headers(state.alerts.entity_updated(ENTITY_NAME, &id)))
}

/// `GET /phones`: one page of phones matching the criteria parameters.
pub async fn get_all_phones(
    State(state): State<AppState>,
    query: Result<Query<QueryPairs>, QueryRejection>,
) -> ApiResult<Vec<PhoneDto>> {
    let pairs = query_pairs(query)?;
    let criteria = params::parse_criteria(&pairs)?;
    let page = params::parse_page(&pairs, &state.paging)?;
    debug!(?criteria, "REST request to get Phones by criteria");
    let result = state
        .phone_query_service
        .find_by_criteria(Some(&criteria), Some(&page))
        .await
        .map_err(storage_error)?;
    let headers = pagination_headers(&result, &format!("{}/phones", state.base_path));
    Ok(ApiResponse::ok(result.content).with_headers(headers))
}

/// `GET /phones/count`: number of phones matching the criteria parameters.
pub async fn count_phones(
    State(state): State<AppState>,
    query: Result<Query<QueryPairs>, QueryRejection>,
) -> ApiResult<u64> {
    let pairs = query_pairs(query)?;
    let criteria = params::parse_criteria(&pairs)?;
    debug!(?criteria, "REST request to count Phones by criteria");
    let count = state
        .phone_query_service
        .count_by_criteria(Some(&criteria))
        .await
        .map_err(storage_error)?;
    Ok(ApiResponse::ok(count))
}

/// `GET /phones/{id}`: 404 with an empty body when absent.
pub async fn get_phone(
    State(state): State<AppState>,
    id: Result<Path<PhoneId>, PathRejection>,
) -> ApiResult<PhoneDto> {
    let id = path_id(id)?;
    debug!(id, "REST request to get Phone");
    match state.phone_service.find_one(id).await.map_err(storage_error)? {
        Some(dto) => Ok(ApiResponse::ok(dto)),
        None => Err(ApiError::not_found(format!("{ENTITY_NAME} {id}"))),
    }
}

/// `DELETE /phones/{id}`: succeeds whether or not the phone exists.
pub async fn delete_phone(
    State(state): State<AppState>,
    id: Result<Path<PhoneId>, PathRejection>,
) -> ApiResult<()> {
    let id = path_id(id)?;
    debug!(id, "REST request to delete Phone");
    state.phone_service.delete(id).await.map_err(storage_error)?;
    Ok(ApiResponse::empty(StatusCode::OK)
        .with_headers(state.alerts.entity_deleted(ENTITY_NAME, &id.to_string())))
}

/// `GET /_search/phones?query=`: one page of search index hits.
pub async fn search_phones(
    State(state): State<AppState>,
    query: Result<Query<QueryPairs>, QueryRejection>,
) -> ApiResult<Vec<PhoneDto>> {
    let pairs = query_pairs(query)?;
    let text = params::required(&pairs, "query")?;
    let page = params::parse_page(&pairs, &state.paging)?;
    debug!(query = text, "REST request to search for a page of Phones");
    let result = state
        .phone_service
        .search(text, Some(&page))
        .await
        .map_err(storage_error)?;
    let headers = search_pagination_headers(
        text,
        &result,
        &format!("{}/_search/phones", state.base_path),
    );
    Ok(ApiResponse::ok(result.content).with_headers(headers))
}
