//! PostgreSQL implementation of the `EntityStore` trait.

use async_trait::async_trait;
use phoneservice_core::{Phone, PhoneId};
use phoneservice_storage::{EntityStore, Page, PageRequest, Predicate, StorageError};
use sqlx_postgres::PgPool;
use tracing::instrument;

use crate::config::PostgresConfig;
use crate::migrations;
use crate::pool;
use crate::queries::crud;

/// PostgreSQL entity store for phones.
#[derive(Debug, Clone)]
pub struct PostgresEntityStore {
    pool: PgPool,
}

impl PostgresEntityStore {
    /// Creates a new `PostgresEntityStore` with the given configuration.
    ///
    /// This will:
    /// 1. Create a connection pool
    /// 2. Run migrations (if configured)
    ///
    /// # Errors
    ///
    /// Returns an error if the connection pool cannot be created
    /// or if migrations fail.
    pub async fn new(config: PostgresConfig) -> Result<Self, StorageError> {
        let pool = pool::create_pool(&config).await?;

        if config.run_migrations {
            migrations::run(&pool).await?;
        }

        Ok(Self { pool })
    }

    /// Creates a new `PostgresEntityStore` from an existing connection pool.
    ///
    /// Migrations are not run automatically when using this constructor.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl EntityStore for PostgresEntityStore {
    #[instrument(skip(self, phone), fields(id = ?phone.id))]
    async fn insert_or_replace(&self, phone: Phone) -> Result<Phone, StorageError> {
        if let Some(id) = phone.id
            && let Some(updated) = crud::update(&self.pool, id, &phone).await?
        {
            return Ok(updated);
        }
        crud::insert(&self.pool, &phone).await
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: PhoneId) -> Result<(), StorageError> {
        let removed = crud::delete_by_id(&self.pool, id).await?;
        tracing::debug!(removed, "deleted phone rows");
        Ok(())
    }

    async fn find_by_id(&self, id: PhoneId) -> Result<Option<Phone>, StorageError> {
        crud::find_by_id(&self.pool, id).await
    }

    async fn find_all(
        &self,
        predicate: &Predicate,
        page: Option<&PageRequest>,
    ) -> Result<Page<Phone>, StorageError> {
        crud::find_all(&self.pool, predicate, page).await
    }

    async fn count(&self, predicate: &Predicate) -> Result<u64, StorageError> {
        crud::count(&self.pool, predicate).await
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        Ok(pool::test_connection(&self.pool).await?)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
