//! # Discount Repository
//!
//! Promocodes. Lookup by code is an exact, case-sensitive match on the
//! trimmed code; whether the discount is usable is decided by
//! `meridian_core::discount::resolve`, not here.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use meridian_core::Discount;

const DISCOUNT_COLUMNS: &str =
    "id, promocode, kind, value, is_active, expires_at, created_at, updated_at";

/// Repository for discount database operations.
#[derive(Debug, Clone)]
pub struct DiscountRepository {
    pool: SqlitePool,
}

impl DiscountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DiscountRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<Discount>> {
        let sql = format!("SELECT {DISCOUNT_COLUMNS} FROM discounts ORDER BY created_at DESC, id");
        let discounts = sqlx::query_as::<_, Discount>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(discounts)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Discount>> {
        let sql = format!("SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE id = ?1");
        let discount = sqlx::query_as::<_, Discount>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(discount)
    }

    /// Finds a discount by promocode regardless of whether it is active.
    pub async fn find_by_code(&self, code: &str) -> DbResult<Option<Discount>> {
        let sql = format!("SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE promocode = ?1");
        let discount = sqlx::query_as::<_, Discount>(&sql)
            .bind(code.trim())
            .fetch_optional(&self.pool)
            .await?;

        debug!(code = %code.trim(), found = discount.is_some(), "Promocode lookup");
        Ok(discount)
    }

    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - promocode already exists
    pub async fn insert(&self, discount: &Discount) -> DbResult<()> {
        debug!(id = %discount.id, code = %discount.promocode, "Inserting discount");

        sqlx::query(
            r#"
            INSERT INTO discounts (
                id, promocode, kind, value, is_active, expires_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&discount.id)
        .bind(&discount.promocode)
        .bind(discount.kind)
        .bind(discount.value)
        .bind(discount.is_active)
        .bind(discount.expires_at)
        .bind(discount.created_at)
        .bind(discount.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_code(e, &discount.promocode))?;

        Ok(())
    }

    pub async fn update(&self, discount: &Discount) -> DbResult<()> {
        debug!(id = %discount.id, "Updating discount");

        let result = sqlx::query(
            r#"
            UPDATE discounts SET
                promocode = ?2,
                kind = ?3,
                value = ?4,
                is_active = ?5,
                expires_at = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&discount.id)
        .bind(&discount.promocode)
        .bind(discount.kind)
        .bind(discount.value)
        .bind(discount.is_active)
        .bind(discount.expires_at)
        .bind(discount.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_code(e, &discount.promocode))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Discount", &discount.id));
        }

        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting discount");

        let result = sqlx::query("DELETE FROM discounts WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Discount", id));
        }

        Ok(())
    }
}

fn duplicate_code(err: sqlx::Error, code: &str) -> DbError {
    match DbError::from(err) {
        e if e.is_unique_violation_on("discounts.promocode") => DbError::duplicate("promocode", code),
        e => e,
    }
}
