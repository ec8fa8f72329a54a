pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod params;
pub mod routes;
pub mod server;
pub mod services;

pub use config::{AppConfig, PagingConfig, SearchBackend, ServerConfig, StorageBackend};
pub use observability::init_tracing;
pub use server::{AppState, PhoneServer, ServerBuilder, build_app, build_router};
pub use services::{PhoneQueryService, PhoneService};
