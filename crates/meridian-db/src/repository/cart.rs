//! # Cart Repository
//!
//! One cart per user, created lazily on first access.
//!
//! ## Save Model
//! ```text
//! load  ──► Cart (core) ──► mutate in memory ──► save()
//!                                                  │
//!                              BEGIN ──────────────┘
//!                              DELETE cart_lines
//!                              INSERT cart_lines (position order)
//!                              UPDATE carts total, updated_at
//!                              COMMIT
//! ```
//!
//! Concurrent saves for the same user are last-write-wins.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use meridian_core::{Cart, CartLine};

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: String,
    user_id: String,
    total_price_cents: i64,
    updated_at: DateTime<Utc>,
}

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Returns the user's cart, creating an empty one if none exists.
    pub async fn get_or_create(&self, user_id: &str, now: DateTime<Utc>) -> DbResult<Cart> {
        sqlx::query(
            r#"
            INSERT INTO carts (id, user_id, total_price_cents, created_at, updated_at)
            VALUES (?1, ?2, 0, ?3, ?3)
            ON CONFLICT(user_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, CartRow>(
            "SELECT id, user_id, total_price_cents, updated_at FROM carts WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let lines = sqlx::query_as::<_, (String, i64)>(
            "SELECT product_id, quantity FROM cart_lines WHERE cart_id = ?1 ORDER BY position",
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|(product_id, quantity)| CartLine::new(product_id, quantity))
        .collect();

        Ok(Cart {
            id: row.id,
            user_id: row.user_id,
            lines,
            total_price_cents: row.total_price_cents,
            updated_at: row.updated_at,
        })
    }

    /// Replaces the stored lines and total with those of `cart`.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - the cart row is gone
    /// * `Err(DbError::ForeignKeyViolation)` - a line names a deleted product
    pub async fn save(&self, cart: &Cart) -> DbResult<()> {
        debug!(cart_id = %cart.id, lines = cart.lines.len(), "Saving cart");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let result = sqlx::query("UPDATE carts SET total_price_cents = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(&cart.id)
            .bind(cart.total_price_cents)
            .bind(cart.updated_at)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart", &cart.id));
        }

        sqlx::query("DELETE FROM cart_lines WHERE cart_id = ?1")
            .bind(&cart.id)
            .execute(&mut *tx)
            .await?;

        for (position, line) in cart.lines.iter().enumerate() {
            sqlx::query(
                "INSERT INTO cart_lines (cart_id, product_id, quantity, position) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(&cart.id)
            .bind(&line.product_id)
            .bind(line.quantity)
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Empties the user's cart if they have one.
    pub async fn clear(&self, user_id: &str, now: DateTime<Utc>) -> DbResult<()> {
        debug!(user_id = %user_id, "Clearing cart");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query("DELETE FROM cart_lines WHERE cart_id IN (SELECT id FROM carts WHERE user_id = ?1)")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE carts SET total_price_cents = 0, updated_at = ?2 WHERE user_id = ?1")
            .bind(user_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }
}
