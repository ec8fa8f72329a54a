use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{Router, middleware, routing::get};
use phoneservice_api::AlertHeaders;
use phoneservice_db_postgres::PostgresEntityStore;
use phoneservice_search::{ElasticsearchIndex, InMemorySearchIndex};
use phoneservice_storage::{DynEntityStore, DynSearchIndex};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::config::{AppConfig, PagingConfig, SearchBackend, StorageBackend};
use crate::services::{PhoneQueryService, PhoneService};
use crate::{handlers, middleware as app_middleware, routes};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: DynEntityStore,
    pub index: DynSearchIndex,
    pub phone_service: PhoneService,
    pub phone_query_service: PhoneQueryService,
    pub alerts: AlertHeaders,
    pub paging: PagingConfig,
    pub base_path: String,
}

impl AppState {
    /// Wires the services over already constructed backends.
    pub fn new(
        store: DynEntityStore,
        index: DynSearchIndex,
        cfg: &AppConfig,
    ) -> anyhow::Result<Self> {
        let alerts = AlertHeaders::new(cfg.app.name.clone()).with_context(|| {
            format!("app.name '{}' cannot be used in header names", cfg.app.name)
        })?;
        Ok(Self {
            phone_service: PhoneService::new(store.clone(), index.clone()),
            phone_query_service: PhoneQueryService::new(store.clone()),
            store,
            index,
            alerts,
            paging: cfg.paging.clone(),
            base_path: cfg.server.base_path.trim_end_matches('/').to_string(),
        })
    }

    /// Connects the configured backends.
    pub async fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let store = create_entity_store(cfg).await?;
        let index = create_search_index(cfg).await?;
        tracing::info!(
            store = store.backend_name(),
            index = index.backend_name(),
            "Backends initialized"
        );
        Self::new(store, index, cfg)
    }
}

async fn create_entity_store(cfg: &AppConfig) -> anyhow::Result<DynEntityStore> {
    match cfg.storage.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory entity store");
            Ok(phoneservice_db_memory::create_entity_store())
        }
        StorageBackend::Postgres => {
            tracing::info!("Connecting PostgreSQL entity store");
            let store = PostgresEntityStore::new(cfg.storage.postgres.to_store_config())
                .await
                .context("PostgreSQL entity store initialization failed")?;
            Ok(Arc::new(store))
        }
    }
}

async fn create_search_index(cfg: &AppConfig) -> anyhow::Result<DynSearchIndex> {
    match cfg.search.backend {
        SearchBackend::Memory => {
            tracing::info!("Using in-memory search index");
            Ok(Arc::new(InMemorySearchIndex::new()))
        }
        SearchBackend::Elasticsearch => {
            let es = &cfg.search.elasticsearch;
            tracing::info!(
                url = %es.url,
                index = %es.index,
                "Connecting Elasticsearch search index"
            );
            let index = ElasticsearchIndex::new(es).context("Elasticsearch client setup failed")?;
            index
                .ensure_index()
                .await
                .context("Elasticsearch index initialization failed")?;
            Ok(Arc::new(index))
        }
    }
}

pub struct PhoneServer {
    addr: SocketAddr,
    app: Router,
}

/// Builds the application with the backends named in `cfg`.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let state = AppState::from_config(cfg).await?;
    Ok(build_router(state, cfg))
}

pub fn build_router(state: AppState, cfg: &AppConfig) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    let api = routes::phone::router();
    let api = if state.base_path.is_empty() {
        api
    } else {
        Router::new().nest(&state.base_path, api)
    };
    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .merge(api)
        .with_state(state)
        // Innermost first: cors, compression, trace, request id, body limit
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<app_middleware::RequestId>()
                        .map(app_middleware::RequestId::as_str)
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: Duration, span: &tracing::Span| {
                        let status = res.status().as_u16();
                        span.record("http.status_code", tracing::field::display(status));
                        tracing::info!(
                            http.status = %status,
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(app_middleware::request_id))
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub async fn build(self) -> anyhow::Result<PhoneServer> {
        let app = build_app(&self.config).await?;
        Ok(PhoneServer {
            addr: self.addr,
            app,
        })
    }
}

impl PhoneServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
