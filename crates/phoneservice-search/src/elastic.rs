//! Elasticsearch search backend over the REST API.

use std::time::Duration;

use async_trait::async_trait;
use phoneservice_core::{Phone, PhoneField, PhoneId};
use phoneservice_storage::{Direction, Page, PageRequest, SearchIndex, StorageError};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;
use url::Url;

use crate::config::ElasticsearchConfig;
use crate::error::ElasticsearchError;

/// Largest window Elasticsearch serves from a single search by default.
const MAX_RESULT_WINDOW: u64 = 10_000;

/// Longest response body kept in error messages.
const MAX_ERROR_BODY: usize = 2048;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Hits,
}

#[derive(Debug, Deserialize)]
struct Hits {
    total: Total,
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Total {
    value: u64,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: Phone,
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    found: bool,
    #[serde(rename = "_source")]
    source: Option<Phone>,
}

/// Search index stored in an Elasticsearch cluster.
#[derive(Debug, Clone)]
pub struct ElasticsearchIndex {
    client: Client,
    base_url: Url,
    index: String,
    refresh: bool,
}

impl ElasticsearchIndex {
    /// Creates a client for the configured cluster. No request is sent.
    ///
    /// # Errors
    ///
    /// Returns `ElasticsearchError::InvalidUrl` if the URL cannot address
    /// documents, or a transport error if the HTTP client cannot be built.
    pub fn new(config: &ElasticsearchConfig) -> Result<Self, ElasticsearchError> {
        let base_url = Url::parse(&config.url)
            .map_err(|e| ElasticsearchError::InvalidUrl(format!("{}: {e}", config.url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ElasticsearchError::InvalidUrl(config.url.clone()));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url,
            index: config.index.clone(),
            refresh: config.refresh,
        })
    }

    pub fn index_name(&self) -> &str {
        &self.index
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ElasticsearchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ElasticsearchError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn document_url(&self, id: PhoneId) -> Result<Url, ElasticsearchError> {
        self.endpoint(&[&self.index, "_doc", &id.to_string()])
    }

    fn with_refresh(&self, mut url: Url) -> Url {
        if self.refresh {
            url.query_pairs_mut().append_pair("refresh", "true");
        }
        url
    }

    /// Creates the index with explicit mappings when it does not exist yet.
    #[instrument(skip(self), fields(index = %self.index))]
    pub async fn ensure_index(&self) -> Result<(), ElasticsearchError> {
        let url = self.endpoint(&[&self.index])?;
        let response = self.client.head(url.clone()).send().await?;
        match response.status() {
            status if status.is_success() => return Ok(()),
            StatusCode::NOT_FOUND => {}
            _ => {
                error_for_status(response).await?;
            }
        }

        let response = self.client.put(url).json(&index_definition()).send().await?;
        if response.status() == StatusCode::BAD_REQUEST {
            let body = response.text().await?;
            // Another instance created it between the HEAD and the PUT.
            if body.contains("resource_already_exists_exception") {
                return Ok(());
            }
            return Err(ElasticsearchError::Status {
                status: StatusCode::BAD_REQUEST.as_u16(),
                body: truncate(body),
            });
        }
        error_for_status(response).await?;
        tracing::info!(index = %self.index, "created search index");
        Ok(())
    }

    async fn put_document(&self, id: PhoneId, phone: &Phone) -> Result<(), ElasticsearchError> {
        let url = self.with_refresh(self.document_url(id)?);
        let response = self.client.put(url).json(phone).send().await?;
        error_for_status(response).await?;
        Ok(())
    }

    async fn delete_document(&self, id: PhoneId) -> Result<(), ElasticsearchError> {
        let url = self.with_refresh(self.document_url(id)?);
        let response = self.client.delete(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        error_for_status(response).await?;
        Ok(())
    }

    async fn head_document(&self, id: PhoneId) -> Result<bool, ElasticsearchError> {
        let response = self.client.head(self.document_url(id)?).send().await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => error_for_status(response).await.map(|_| false),
        }
    }

    async fn get_document(&self, id: PhoneId) -> Result<Option<Phone>, ElasticsearchError> {
        let response = self.client.get(self.document_url(id)?).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = error_for_status(response).await?;
        let body: GetResponse = serde_json::from_slice(&response.bytes().await?)?;
        Ok(body.source.filter(|_| body.found))
    }

    async fn run_search(
        &self,
        query: &str,
        page: Option<&PageRequest>,
    ) -> Result<Page<Phone>, ElasticsearchError> {
        let url = self.endpoint(&[&self.index, "_search"])?;
        let response = self
            .client
            .post(url)
            .json(&search_body(query, page))
            .send()
            .await?;

        if response.status() == StatusCode::BAD_REQUEST {
            let body = response.text().await?;
            return Err(ElasticsearchError::BadQuery(error_reason(&body)));
        }
        let response = error_for_status(response).await?;
        let parsed: SearchResponse = serde_json::from_slice(&response.bytes().await?)?;

        let content: Vec<Phone> = parsed.hits.hits.into_iter().map(|h| h.source).collect();
        let total = parsed.hits.total.value;
        Ok(match page {
            Some(request) => Page::new(content, request, total),
            None => Page {
                total_elements: total,
                ..Page::unpaged(content)
            },
        })
    }

    async fn delete_by_query_all(&self) -> Result<(), ElasticsearchError> {
        let mut url = self.endpoint(&[&self.index, "_delete_by_query"])?;
        url.query_pairs_mut().append_pair("conflicts", "proceed");
        let url = self.with_refresh(url);
        let response = self
            .client
            .post(url)
            .json(&json!({ "query": { "match_all": {} } }))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        error_for_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl SearchIndex for ElasticsearchIndex {
    #[instrument(skip(self, phone), fields(id = ?phone.id))]
    async fn upsert(&self, phone: &Phone) -> Result<(), StorageError> {
        let id = phone
            .id
            .ok_or_else(|| StorageError::invalid_entity("Cannot index a phone without an id"))?;
        Ok(self.put_document(id, phone).await?)
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: PhoneId) -> Result<(), StorageError> {
        Ok(self.delete_document(id).await?)
    }

    async fn exists_by_id(&self, id: PhoneId) -> Result<bool, StorageError> {
        Ok(self.head_document(id).await?)
    }

    async fn find_by_id(&self, id: PhoneId) -> Result<Option<Phone>, StorageError> {
        Ok(self.get_document(id).await?)
    }

    #[instrument(skip(self, page))]
    async fn search(
        &self,
        query: &str,
        page: Option<&PageRequest>,
    ) -> Result<Page<Phone>, StorageError> {
        if query.trim().is_empty() {
            return Err(StorageError::invalid_query("Query must not be empty"));
        }
        Ok(self.run_search(query, page).await?)
    }

    async fn delete_all(&self) -> Result<(), StorageError> {
        Ok(self.delete_by_query_all().await?)
    }

    fn backend_name(&self) -> &'static str {
        "elasticsearch"
    }
}

async fn error_for_status(response: Response) -> Result<Response, ElasticsearchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ElasticsearchError::Status {
        status: status.as_u16(),
        body: truncate(body),
    })
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

/// Extracts the most specific reason from an Elasticsearch error body.
fn error_reason(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return truncate(body.to_string());
    };
    let error = &value["error"];
    error["root_cause"][0]["reason"]
        .as_str()
        .or_else(|| error["reason"].as_str())
        .or_else(|| error.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| truncate(body.to_string()))
}

fn sort_field(field: PhoneField) -> &'static str {
    match field {
        PhoneField::Id => "id",
        PhoneField::Name => "name.keyword",
        PhoneField::Brand => "brand.keyword",
        PhoneField::Price => "price",
    }
}

fn search_body(query: &str, page: Option<&PageRequest>) -> Value {
    let mut sort: Vec<Value> = page
        .map(|p| p.sort.as_slice())
        .unwrap_or_default()
        .iter()
        .map(|order| {
            let missing = match order.direction {
                Direction::Asc => "_last",
                Direction::Desc => "_first",
            };
            json!({
                sort_field(order.field): { "order": order.direction.as_str(), "missing": missing }
            })
        })
        .collect();
    sort.push(json!({ "id": { "order": "asc" } }));

    let (from, size) = match page {
        Some(p) => (p.offset(), u64::from(p.size)),
        None => (0, MAX_RESULT_WINDOW),
    };

    json!({
        "query": { "query_string": { "query": query } },
        "from": from,
        "size": size,
        "sort": sort,
        "track_total_hits": true,
    })
}

fn index_definition() -> Value {
    let text_with_keyword = json!({
        "type": "text",
        "fields": { "keyword": { "type": "keyword", "ignore_above": 256 } }
    });
    json!({
        "mappings": {
            "properties": {
                "id": { "type": "long" },
                "name": text_with_keyword,
                "brand": text_with_keyword,
                "price": { "type": "scaled_float", "scaling_factor": 100 }
            }
        }
    })
}
