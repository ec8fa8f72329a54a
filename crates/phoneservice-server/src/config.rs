use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use phoneservice_db_postgres::PostgresConfig;
use phoneservice_search::ElasticsearchConfig;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub paging: PagingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if !self.server.base_path.starts_with('/') {
            return Err("server.base_path must start with '/'".into());
        }
        // Paging validations
        if self.paging.default_size == 0 {
            return Err("paging.default_size must be > 0".into());
        }
        if self.paging.default_size > self.paging.max_size {
            return Err("paging.default_size must be <= paging.max_size".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        // Alert header names are built from the app name
        if self.app.name.is_empty()
            || !self
                .app
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err("app.name must be non-empty ASCII letters, digits, '-' or '_'".into());
        }
        // Storage validation
        if self.storage.backend == StorageBackend::Postgres {
            let pg = &self.storage.postgres;
            if pg.url.is_none() && pg.host.is_empty() {
                return Err("storage.postgres requires either 'url' or 'host' to be set".into());
            }
            if pg.url.is_none() && pg.database.is_empty() {
                return Err("storage.postgres.database must not be empty".into());
            }
            if pg.pool_size == 0 {
                return Err("storage.postgres.pool_size must be > 0".into());
            }
        }
        // Search validation
        if self.search.backend == SearchBackend::Elasticsearch {
            let es = &self.search.elasticsearch;
            if es.url.is_empty() {
                return Err("search.elasticsearch.url must not be empty".into());
            }
            if es.index.is_empty() {
                return Err("search.elasticsearch.index must not be empty".into());
            }
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
    /// Prefix of the phone endpoints.
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8081
}
fn default_body_limit() -> usize {
    1024 * 1024
}
fn default_base_path() -> String {
    "/api".into()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
            base_path: default_base_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Application name used in `X-{name}-alert` headers.
    #[serde(default = "default_app_name")]
    pub name: String,
}

fn default_app_name() -> String {
    "phoneserviceApp".into()
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: default_app_name(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default)]
    pub postgres: PostgresStorageConfig,
}

/// Where the PostgreSQL entity store lives.
///
/// A full `url` wins; otherwise one is assembled from `host`, `port`,
/// `user`, `password` and `database`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostgresStorageConfig {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
    pub pool_size: u32,
    pub connect_timeout_ms: u64,
    pub idle_timeout_ms: Option<u64>,
    pub run_migrations: bool,
}

impl PostgresStorageConfig {
    /// Returns `url` when set, otherwise a URL built from the separate options.
    pub fn connection_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        let credentials = match &self.password {
            Some(password) => format!("{}:{password}", self.user),
            None => self.user.clone(),
        };
        format!(
            "postgres://{credentials}@{}:{}/{}",
            self.host, self.port, self.database
        )
    }

    pub fn to_store_config(&self) -> PostgresConfig {
        PostgresConfig::new(self.connection_url())
            .with_pool_size(self.pool_size)
            .with_connect_timeout_ms(self.connect_timeout_ms)
            .with_idle_timeout_ms(self.idle_timeout_ms)
            .with_run_migrations(self.run_migrations)
    }
}

impl Default for PostgresStorageConfig {
    fn default() -> Self {
        let store = PostgresConfig::default();
        Self {
            url: None,
            host: "localhost".into(),
            port: 5432,
            user: "postgres".into(),
            password: None,
            database: "phoneservice".into(),
            pool_size: store.pool_size,
            connect_timeout_ms: store.connect_timeout_ms,
            idle_timeout_ms: store.idle_timeout_ms,
            run_migrations: store.run_migrations,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchBackend {
    #[default]
    Memory,
    Elasticsearch,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SearchConfig {
    #[serde(default)]
    pub backend: SearchBackend,
    #[serde(default)]
    pub elasticsearch: ElasticsearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagingConfig {
    #[serde(default = "default_page_size")]
    pub default_size: u32,
    #[serde(default = "default_max_page_size")]
    pub max_size: u32,
}
fn default_page_size() -> u32 {
    20
}
fn default_max_page_size() -> u32 {
    2000
}
impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_size: default_page_size(),
            max_size: default_max_page_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::{Path, PathBuf};

    pub const DEFAULT_CONFIG_PATH: &str = "phoneservice.toml";

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_PATH));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., PHONESERVICE__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("PHONESERVICE")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }

    pub fn load_config_with_default_path<P: AsRef<Path>>(
        path: Option<P>,
    ) -> Result<AppConfig, String> {
        let p = path
            .as_ref()
            .map(|p| p.as_ref().to_string_lossy().to_string());
        load_config(p.as_deref())
    }
}
