//! Connection pool for the PostgreSQL entity store.

use sqlx_core::pool::PoolOptions;
use sqlx_postgres::{PgPool, Postgres};
use tracing::{debug, info, instrument};

use crate::config::PostgresConfig;
use crate::error::{PostgresError, Result};

/// Opens a pool sized and timed by `config`.
#[instrument(skip(config), fields(url = %mask_password(&config.url)))]
pub async fn create_pool(config: &PostgresConfig) -> Result<PgPool> {
    config.validate()?;

    info!(
        pool_size = config.pool_size,
        min_connections = config.min_connections(),
        connect_timeout_ms = config.connect_timeout_ms,
        "Opening PostgreSQL pool"
    );

    let pool = PoolOptions::<Postgres>::new()
        .max_connections(config.pool_size)
        .min_connections(config.min_connections())
        .acquire_timeout(config.connect_timeout())
        .idle_timeout(config.idle_timeout())
        .connect(&config.url)
        .await?;

    debug!(size = pool.size(), "PostgreSQL pool ready");
    Ok(pool)
}

/// Round-trips a trivial statement; used by the readiness probe.
#[instrument(skip(pool))]
pub async fn test_connection(pool: &PgPool) -> Result<()> {
    sqlx_core::query::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(PostgresError::from)?;
    Ok(())
}

/// Replaces the password of a connection URL with `****` for logs.
pub fn mask_password(url: &str) -> String {
    let authority_start = url.find("://").map_or(0, |p| p + 3);
    let Some(at) = url.rfind('@').filter(|&at| at > authority_start) else {
        return url.to_string();
    };
    match url[authority_start..at].find(':') {
        Some(colon) => {
            let colon = authority_start + colon;
            format!("{}:****{}", &url[..colon], &url[at..])
        }
        None => url.to_string(),
    }
}
