//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD operations
//! - Filtered, sorted, paginated listing
//! - Batch lookup for checkout (`get_many`)
//! - Restocking
//!
//! Stock is only ever *decreased* inside the payment transaction in
//! [`OrderRepository::complete_payment`](crate::OrderRepository::complete_payment).

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use meridian_core::{PageRequest, Product, ValidationError};

const PRODUCT_COLUMNS: &str = "id, vendor_id, category_id, sku, title, description, image_url, \
     price_cents, count_in_stock, created_at, updated_at";

// =============================================================================
// Listing Filters
// =============================================================================

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

impl ProductSort {
    fn order_by(&self) -> &'static str {
        match self {
            ProductSort::Newest => " ORDER BY created_at DESC, id",
            ProductSort::PriceAsc => " ORDER BY price_cents ASC, id",
            ProductSort::PriceDesc => " ORDER BY price_cents DESC, id",
        }
    }
}

impl FromStr for ProductSort {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "newest" => Ok(ProductSort::Newest),
            "price_asc" => Ok(ProductSort::PriceAsc),
            "price_desc" => Ok(ProductSort::PriceDesc),
            _ => Err(ValidationError::NotAllowed {
                field: "sort".to_string(),
                allowed: vec!["newest".into(), "price_asc".into(), "price_desc".into()],
            }),
        }
    }
}

/// Optional filters for [`ProductRepository::list`].
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<String>,
    /// Case-insensitive substring of the title.
    pub search: Option<String>,
    pub vendor_id: Option<String>,
    pub sort: ProductSort,
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ProductFilter) {
    qb.push(" WHERE 1 = 1");
    if let Some(category_id) = &filter.category_id {
        qb.push(" AND category_id = ").push_bind(category_id.clone());
    }
    if let Some(vendor_id) = &filter.vendor_id {
        qb.push(" AND vendor_id = ").push_bind(vendor_id.clone());
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND title LIKE ").push_bind(format!("%{search}%"));
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let lamp = repo.get_by_id("uuid-here").await?;
/// let (page, total) = repo.list(&ProductFilter::default(), PageRequest::new(None, None, 20)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Loads every product in `ids` that exists, keyed by id.
    ///
    /// Missing ids are simply absent from the map; the caller decides
    /// whether that is an error.
    pub async fn get_many(&self, ids: &[String]) -> DbResult<HashMap<String, Product>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id IN ("
        ));
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(")");

        let products = qb.build_query_as::<Product>().fetch_all(&self.pool).await?;
        debug!(requested = ids.len(), found = products.len(), "Loaded products by id");

        Ok(products.into_iter().map(|p| (p.id.clone(), p)).collect())
    }

    /// Lists products matching `filter`, one page at a time.
    ///
    /// ## Returns
    /// The page of products and the total number of matches.
    pub async fn list(&self, filter: &ProductFilter, page: PageRequest) -> DbResult<(Vec<Product>, i64)> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM products");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {PRODUCT_COLUMNS} FROM products"));
        push_filters(&mut qb, filter);
        qb.push(filter.sort.order_by());
        qb.push(" LIMIT ").push_bind(page.limit);
        qb.push(" OFFSET ").push_bind(page.offset());

        let products = qb.build_query_as::<Product>().fetch_all(&self.pool).await?;
        debug!(total = total, returned = products.len(), "Listed products");

        Ok((products, total))
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The inserted product
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    /// * `Err(DbError::ForeignKeyViolation)` - unknown category or vendor
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, title = %product.title, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, vendor_id, category_id, sku, title, description, image_url,
                price_cents, count_in_stock, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&product.id)
        .bind(&product.vendor_id)
        .bind(&product.category_id)
        .bind(&product.sku)
        .bind(&product.title)
        .bind(&product.description)
        .bind(&product.image_url)
        .bind(product.price_cents)
        .bind(product.count_in_stock)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            err if err.is_unique_violation_on("products.sku") => {
                DbError::duplicate("sku", product.sku.clone().unwrap_or_default())
            }
            err => err,
        })?;

        Ok(product.clone())
    }

    /// Updates the editable fields of a product. Stock is not touched here.
    ///
    /// ## Returns
    /// * `Ok(())` - Update successful
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                category_id = ?2,
                sku = ?3,
                title = ?4,
                description = ?5,
                image_url = ?6,
                price_cents = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.category_id)
        .bind(&product.sku)
        .bind(&product.title)
        .bind(&product.description)
        .bind(&product.image_url)
        .bind(product.price_cents)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Adds `quantity` units to stock and returns the new count.
    ///
    /// Uses a delta update so concurrent restocks and payments compose.
    pub async fn restock(&self, id: &str, quantity: i64, now: DateTime<Utc>) -> DbResult<i64> {
        debug!(id = %id, quantity = quantity, "Restocking product");

        let new_count: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET count_in_stock = count_in_stock + ?2, updated_at = ?3
            WHERE id = ?1
            RETURNING count_in_stock
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        new_count.ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product. Cart lines referencing it cascade; order lines
    /// keep their snapshot.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts total products (for diagnostics and the seed binary).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{product, test_db};

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let lamp = product("Desk Lamp", 2500, 4);
        db.products().insert(&lamp).await.unwrap();

        let found = db.products().get_by_id(&lamp.id).await.unwrap().unwrap();
        assert_eq!(found.title, "Desk Lamp");
        assert_eq!(found.price_cents, 2500);
        assert_eq!(found.count_in_stock, 4);

        assert!(db.products().get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_sku_is_reported_by_field() {
        let db = test_db().await;
        let mut a = product("A", 100, 1);
        a.sku = Some("SKU-1".to_string());
        let mut b = product("B", 100, 1);
        b.sku = Some("SKU-1".to_string());

        db.products().insert(&a).await.unwrap();
        let err = db.products().insert(&b).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "sku"));
    }

    #[tokio::test]
    async fn test_get_many_skips_missing() {
        let db = test_db().await;
        let a = product("A", 100, 1);
        let b = product("B", 200, 1);
        db.products().insert(&a).await.unwrap();
        db.products().insert(&b).await.unwrap();

        let found = db
            .products()
            .get_many(&[a.id.clone(), "ghost".to_string(), b.id.clone()])
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[&b.id].price_cents, 200);
        assert!(db.products().get_many(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_filters_and_sorts() {
        let db = test_db().await;
        for (title, price) in [("Brass Lamp", 900), ("Oak Table", 15000), ("Paper Lamp", 300)] {
            db.products().insert(&product(title, price, 1)).await.unwrap();
        }

        let filter = ProductFilter {
            search: Some("lamp".to_string()),
            sort: ProductSort::PriceAsc,
            ..Default::default()
        };
        let (items, total) = db
            .products()
            .list(&filter, PageRequest::new(Some(1), Some(10), 10))
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(items[0].title, "Paper Lamp");
        assert_eq!(items[1].title, "Brass Lamp");

        let (page2, total) = db
            .products()
            .list(
                &ProductFilter { sort: ProductSort::PriceDesc, ..Default::default() },
                PageRequest::new(Some(2), Some(2), 10),
            )
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(page2.len(), 1);
        assert_eq!(page2[0].title, "Paper Lamp");
    }

    #[tokio::test]
    async fn test_restock_and_delete() {
        let db = test_db().await;
        let lamp = product("Lamp", 100, 2);
        db.products().insert(&lamp).await.unwrap();

        assert_eq!(db.products().restock(&lamp.id, 5, Utc::now()).await.unwrap(), 7);
        assert!(matches!(
            db.products().restock("missing", 1, Utc::now()).await,
            Err(DbError::NotFound { .. })
        ));

        db.products().delete(&lamp.id).await.unwrap();
        assert_eq!(db.products().count().await.unwrap(), 0);
        assert!(matches!(
            db.products().delete(&lamp.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!("price_desc".parse::<ProductSort>().unwrap(), ProductSort::PriceDesc);
        assert_eq!("".parse::<ProductSort>().unwrap(), ProductSort::Newest);
        assert!("cheapest".parse::<ProductSort>().is_err());
    }
}
