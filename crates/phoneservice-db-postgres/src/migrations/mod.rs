//! Schema migrations for the `phone` table.
//!
//! The SQL files are compiled into the binary; applied versions are recorded
//! in `_sqlx_migrations`.

use sqlx_core::migrate::{Migration, MigrationType};
use sqlx_postgres::PgPool;
use std::borrow::Cow;
use tracing::{info, instrument};

use crate::error::{PostgresError, Result};

/// `(version, description, sql)`, oldest first.
const MIGRATIONS: &[(i64, &str, &str)] = &[(
    20240101000001,
    "create_phone",
    include_str!("../../migrations/20240101000001_create_phone.sql"),
)];

fn build_migrations() -> Vec<Migration> {
    MIGRATIONS
        .iter()
        .map(|&(version, description, sql)| Migration {
            version,
            description: Cow::Borrowed(description),
            migration_type: MigrationType::Simple,
            sql: Cow::Borrowed(sql),
            checksum: Cow::Borrowed(&[]),
            no_tx: false,
        })
        .collect()
}

/// Number of migrations compiled into the binary.
pub fn embedded_count() -> usize {
    build_migrations().len()
}

/// Runs all pending database migrations.
///
/// # Errors
///
/// Returns an error if a migration fails to execute.
#[instrument(skip(pool))]
pub async fn run(pool: &PgPool) -> Result<()> {
    let migrations = build_migrations();
    info!(count = migrations.len(), "Applying phone schema migrations");

    let migrator = sqlx_core::migrate::Migrator {
        migrations: Cow::Owned(migrations),
        ignore_missing: false,
        locking: true,
        no_tx: false,
    };

    migrator
        .run(pool)
        .await
        .map_err(|e| PostgresError::Migration(e.to_string()))?;
    info!("phone schema is up to date");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_ordered_and_non_empty() {
        let migrations = build_migrations();
        assert_eq!(migrations.len(), embedded_count());
        assert!(
            migrations
                .windows(2)
                .all(|w| w[0].version < w[1].version)
        );
        assert!(migrations.iter().all(|m| !m.sql.trim().is_empty()));
        assert!(migrations[0].sql.contains("CREATE TABLE IF NOT EXISTS phone"));
    }
}
