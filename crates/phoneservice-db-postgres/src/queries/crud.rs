//! Statements for reading and writing phones.

use phoneservice_core::{BigDecimal, Phone, PhoneId};
use phoneservice_storage::{Page, PageRequest, Predicate, StorageError};
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_core::query_scalar::query_scalar;
use sqlx_postgres::{PgPool, Postgres};

use super::filter::{BindAllArgs, WhereClause, order_by_sql};
use crate::error::query_error;

/// Row shape of the `phone` table.
type PhoneRow = (i64, Option<String>, Option<String>, Option<BigDecimal>);

const COLUMNS: &str = "id, name, brand, price";

fn into_phone((id, name, brand, price): PhoneRow) -> Phone {
    Phone {
        id: Some(id),
        name,
        brand,
        price,
    }
}

/// Inserts a phone under a fresh id from the `phone_id_seq` sequence.
pub async fn insert(pool: &PgPool, phone: &Phone) -> Result<Phone, StorageError> {
    let sql = format!(
        "INSERT INTO phone (name, brand, price) VALUES ($1, $2, $3) RETURNING {COLUMNS}"
    );
    let row: PhoneRow = query_as(&sql)
        .bind(phone.name.as_deref())
        .bind(phone.brand.as_deref())
        .bind(phone.price.clone())
        .fetch_one(pool)
        .await
        .map_err(|e| query_error("Failed to insert phone", e))?;

    Ok(into_phone(row))
}

/// Replaces the row for `id`. Returns `None` if no such row exists.
pub async fn update(
    pool: &PgPool,
    id: PhoneId,
    phone: &Phone,
) -> Result<Option<Phone>, StorageError> {
    let sql = format!(
        "UPDATE phone SET name = $2, brand = $3, price = $4 WHERE id = $1 RETURNING {COLUMNS}"
    );
    let row: Option<PhoneRow> = query_as(&sql)
        .bind(id)
        .bind(phone.name.as_deref())
        .bind(phone.brand.as_deref())
        .bind(phone.price.clone())
        .fetch_optional(pool)
        .await
        .map_err(|e| query_error("Failed to update phone", e))?;

    Ok(row.map(into_phone))
}

pub async fn find_by_id(pool: &PgPool, id: PhoneId) -> Result<Option<Phone>, StorageError> {
    let sql = format!("SELECT {COLUMNS} FROM phone WHERE id = $1");
    let row: Option<PhoneRow> = query_as(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| query_error("Failed to load phone", e))?;

    Ok(row.map(into_phone))
}

/// Deletes the row for `id` and returns the number of rows removed.
pub async fn delete_by_id(pool: &PgPool, id: PhoneId) -> Result<u64, StorageError> {
    let result = query("DELETE FROM phone WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| query_error("Failed to delete phone", e))?;

    Ok(result.rows_affected())
}

pub async fn count(pool: &PgPool, predicate: &Predicate) -> Result<u64, StorageError> {
    let clause = WhereClause::from_predicate(predicate);
    let sql = format!("SELECT COUNT(*) FROM phone{}", clause.sql());
    let count: i64 = query_scalar::<Postgres, i64>(&sql)
        .bind_all_args(clause.args())
        .fetch_one(pool)
        .await
        .map_err(|e| query_error("Failed to count phones", e))?;

    Ok(u64::try_from(count).unwrap_or_default())
}

/// Selects the phones matching `predicate`, one page at a time when a page
/// request is given.
pub async fn find_all(
    pool: &PgPool,
    predicate: &Predicate,
    page: Option<&PageRequest>,
) -> Result<Page<Phone>, StorageError> {
    let clause = WhereClause::from_predicate(predicate);
    let orders = page.map(|p| p.sort.as_slice()).unwrap_or_default();
    let mut sql = format!(
        "SELECT {COLUMNS} FROM phone{}{}",
        clause.sql(),
        order_by_sql(orders)
    );
    if page.is_some() {
        let limit = clause.next_placeholder();
        sql.push_str(&format!(" LIMIT ${limit} OFFSET ${}", limit + 1));
    }

    tracing::debug!(sql = %sql, params_count = clause.args().len(), "Executing phone query");

    let mut select = query_as::<Postgres, PhoneRow>(&sql).bind_all_args(clause.args());
    if let Some(request) = page {
        select = select
            .bind(i64::from(request.size))
            .bind(i64::try_from(request.offset()).unwrap_or(i64::MAX));
    }
    let rows = select
        .fetch_all(pool)
        .await
        .map_err(|e| query_error("Failed to list phones", e))?;
    let content: Vec<Phone> = rows.into_iter().map(into_phone).collect();

    let Some(request) = page else {
        return Ok(Page::unpaged(content));
    };

    // A short first page already tells the total.
    let total = if request.page == 0 && content.len() < request.size as usize {
        content.len() as u64
    } else {
        count(pool, predicate).await?
    };
    Ok(Page::new(content, request, total))
}
