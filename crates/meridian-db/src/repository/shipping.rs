//! # Shipping Rate Repository
//!
//! One flat rate per (country, region). Destinations without a row fall
//! back to the default rate in `meridian_core::shipping::quote`.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use meridian_core::shipping::destination_key;
use meridian_core::ShippingRate;

/// Repository for shipping rate database operations.
#[derive(Debug, Clone)]
pub struct ShippingRateRepository {
    pool: SqlitePool,
}

impl ShippingRateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ShippingRateRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<ShippingRate>> {
        let rates = sqlx::query_as::<_, ShippingRate>(
            "SELECT id, country, region, rate_cents, created_at FROM shipping_rates ORDER BY country, region",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rates)
    }

    /// Exact lookup on the trimmed country and region.
    pub async fn find_by_destination(&self, country: &str, region: &str) -> DbResult<Option<ShippingRate>> {
        let (country, region) = destination_key(country, region);

        let rate = sqlx::query_as::<_, ShippingRate>(
            "SELECT id, country, region, rate_cents, created_at FROM shipping_rates WHERE country = ?1 AND region = ?2",
        )
        .bind(country)
        .bind(region)
        .fetch_optional(&self.pool)
        .await?;

        debug!(country = %country, region = %region, found = rate.is_some(), "Shipping rate lookup");
        Ok(rate)
    }

    /// Stores the destination trimmed, the same key lookups use.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - the destination already has a rate
    pub async fn insert(&self, rate: &ShippingRate) -> DbResult<()> {
        let (country, region) = destination_key(&rate.country, &rate.region);
        debug!(id = %rate.id, country = %country, region = %region, "Inserting shipping rate");

        sqlx::query(
            "INSERT INTO shipping_rates (id, country, region, rate_cents, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&rate.id)
        .bind(country)
        .bind(region)
        .bind(rate.rate_cents)
        .bind(rate.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            err if err.is_unique_violation_on("shipping_rates.country") => {
                DbError::duplicate("destination", format!("{country}/{region}"))
            }
            err => err,
        })?;

        Ok(())
    }

    pub async fn update_rate(&self, id: &str, rate_cents: i64) -> DbResult<()> {
        debug!(id = %id, rate_cents = rate_cents, "Updating shipping rate");

        let result = sqlx::query("UPDATE shipping_rates SET rate_cents = ?2 WHERE id = ?1")
            .bind(id)
            .bind(rate_cents)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("ShippingRate", id));
        }

        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM shipping_rates WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("ShippingRate", id));
        }

        Ok(())
    }
}
