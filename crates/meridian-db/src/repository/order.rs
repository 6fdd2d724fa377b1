//! # Order Repository
//!
//! Orders with their snapshot lines, and the payment transaction.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   insert()                complete_payment()         update_status()    │
//! │      │                           │                         │            │
//! │      ▼                           ▼                         ▼            │
//! │  ┌──────────┐  conditional  ┌──────────┐   admin    ┌──────────────┐    │
//! │  │ not_paid │ ────────────► │ pending  │ ─────────► │ processing / │    │
//! │  └──────────┘   UPDATE      └──────────┘            │ shipped /    │    │
//! │                 + stock                              │ delivered /  │    │
//! │                 + cart                               │ cancelled    │    │
//! │                                                      └──────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Costing and lines are written once by `insert` and never updated.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use meridian_core::{Address, Costing, Order, OrderLine, OrderStatus, PageRequest, PaymentConfirmation};

const ORDER_COLUMNS: &str = "id, user_id, address_line1, address_line2, address_city, \
     address_country, address_region, sub_total_cents, discount_amount_cents, \
     amount_after_discount_cents, shipping_cost_cents, grand_total_cents, discount_applied, \
     promocode, shipping_id, status, payment_details, created_at, updated_at, paid_at";

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    user_id: String,
    address_line1: String,
    address_line2: Option<String>,
    address_city: String,
    address_country: String,
    address_region: String,
    sub_total_cents: i64,
    discount_amount_cents: i64,
    amount_after_discount_cents: i64,
    shipping_cost_cents: i64,
    grand_total_cents: i64,
    discount_applied: bool,
    promocode: Option<String>,
    shipping_id: Option<String>,
    status: OrderStatus,
    payment_details: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
}

impl OrderRow {
    fn into_order(self, lines: Vec<OrderLine>) -> DbResult<Order> {
        let payment_details = self
            .payment_details
            .as_deref()
            .map(serde_json::from_str::<Value>)
            .transpose()
            .map_err(|e| DbError::Internal(format!("corrupt payment_details on {}: {e}", self.id)))?;

        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            address: Address {
                line1: self.address_line1,
                line2: self.address_line2,
                city: self.address_city,
                country: self.address_country,
                region: self.address_region,
            },
            lines,
            costing: Costing {
                sub_total_cents: self.sub_total_cents,
                discount_amount_cents: self.discount_amount_cents,
                amount_after_discount_cents: self.amount_after_discount_cents,
                shipping_cost_cents: self.shipping_cost_cents,
                grand_total_cents: self.grand_total_cents,
                discount_applied: self.discount_applied,
                promocode: self.promocode,
                shipping_id: self.shipping_id,
            },
            status: self.status,
            payment_details,
            created_at: self.created_at,
            updated_at: self.updated_at,
            paid_at: self.paid_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    order_id: String,
    product_id: String,
    title_snapshot: String,
    unit_price_cents: i64,
    quantity: i64,
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        OrderLine {
            product_id: row.product_id,
            title: row.title_snapshot,
            unit_price_cents: row.unit_price_cents,
            quantity: row.quantity,
        }
    }
}

// =============================================================================
// Listing Filters
// =============================================================================

/// Optional filters for [`OrderRepository::list`]. Each bound applies on
/// its own; `from` and `to` are inclusive.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub user_id: Option<String>,
    pub status: Option<OrderStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &OrderFilter) {
    qb.push(" WHERE 1 = 1");
    if let Some(user_id) = &filter.user_id {
        qb.push(" AND user_id = ").push_bind(user_id.clone());
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(from) = filter.from {
        qb.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND created_at <= ").push_bind(to);
    }
}

// =============================================================================
// Payment Outcome
// =============================================================================

/// Outcome of [`OrderRepository::complete_payment`].
///
/// Every variant except `Completed` means the transaction was rolled back
/// and nothing changed. Infrastructure failures come back as `DbError`
/// instead.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentCompletion {
    Completed(PaymentConfirmation),
    OrderMissing,
    /// The order belongs to someone else.
    NotOwner,
    /// The order already left `not_paid`.
    AlreadyProcessed(OrderStatus),
    StockShortfall {
        product_id: String,
        title: String,
        available: i64,
        requested: i64,
    },
    /// A product on the order was deleted after the order was placed.
    ProductMissing(String),
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Writes an order and its lines in one transaction.
    pub async fn insert(&self, order: &Order) -> DbResult<()> {
        debug!(
            id = %order.id,
            user_id = %order.user_id,
            lines = order.lines.len(),
            grand_total = order.costing.grand_total_cents,
            "Inserting order"
        );

        let payment_details = order
            .payment_details
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| DbError::Internal(e.to_string()))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id,
                address_line1, address_line2, address_city, address_country, address_region,
                sub_total_cents, discount_amount_cents, amount_after_discount_cents,
                shipping_cost_cents, grand_total_cents, discount_applied, promocode, shipping_id,
                status, payment_details, created_at, updated_at, paid_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20
            )
            "#,
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(&order.address.line1)
        .bind(&order.address.line2)
        .bind(&order.address.city)
        .bind(&order.address.country)
        .bind(&order.address.region)
        .bind(order.costing.sub_total_cents)
        .bind(order.costing.discount_amount_cents)
        .bind(order.costing.amount_after_discount_cents)
        .bind(order.costing.shipping_cost_cents)
        .bind(order.costing.grand_total_cents)
        .bind(order.costing.discount_applied)
        .bind(&order.costing.promocode)
        .bind(&order.costing.shipping_id)
        .bind(order.status)
        .bind(payment_details)
        .bind(order.created_at)
        .bind(order.updated_at)
        .bind(order.paid_at)
        .execute(&mut *tx)
        .await?;

        for (position, line) in order.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_lines (
                    order_id, position, product_id, title_snapshot, unit_price_cents, quantity
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&order.id)
            .bind(position as i64)
            .bind(&line.product_id)
            .bind(&line.title)
            .bind(line.unit_price_cents)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
        let Some(row) = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, OrderLineRow>(
            r#"
            SELECT order_id, product_id, title_snapshot, unit_price_cents, quantity
            FROM order_lines WHERE order_id = ?1 ORDER BY position
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(OrderLine::from)
        .collect();

        row.into_order(lines).map(Some)
    }

    /// Lists orders newest first, one page at a time.
    ///
    /// ## Returns
    /// The page of orders (with lines) and the total number of matches.
    pub async fn list(&self, filter: &OrderFilter, page: PageRequest) -> DbResult<(Vec<Order>, i64)> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM orders");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {ORDER_COLUMNS} FROM orders"));
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, id");
        qb.push(" LIMIT ").push_bind(page.limit);
        qb.push(" OFFSET ").push_bind(page.offset());

        let rows = qb.build_query_as::<OrderRow>().fetch_all(&self.pool).await?;
        let mut lines = self.lines_for(rows.iter().map(|r| r.id.as_str())).await?;

        let orders = rows
            .into_iter()
            .map(|row| {
                let order_lines = lines.remove(&row.id).unwrap_or_default();
                row.into_order(order_lines)
            })
            .collect::<DbResult<Vec<_>>>()?;

        debug!(total = total, returned = orders.len(), "Listed orders");
        Ok((orders, total))
    }

    async fn lines_for<'a>(
        &self,
        order_ids: impl Iterator<Item = &'a str>,
    ) -> DbResult<HashMap<String, Vec<OrderLine>>> {
        let ids: Vec<String> = order_ids.map(str::to_string).collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT order_id, product_id, title_snapshot, unit_price_cents, quantity \
             FROM order_lines WHERE order_id IN (",
        );
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(") ORDER BY order_id, position");

        let rows = qb.build_query_as::<OrderLineRow>().fetch_all(&self.pool).await?;

        let mut grouped: HashMap<String, Vec<OrderLine>> = HashMap::new();
        for row in rows {
            grouped.entry(row.order_id.clone()).or_default().push(row.into());
        }
        Ok(grouped)
    }

    /// Moves an order from `from` to `to`.
    ///
    /// The update is conditional on the current status still being `from`.
    ///
    /// ## Returns
    /// * `Ok(true)` - status changed
    /// * `Ok(false)` - the order is missing or its status moved in between
    pub async fn update_status(
        &self,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(id = %id, from = %from, to = %to, "Updating order status");

        let result = sqlx::query("UPDATE orders SET status = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?2")
            .bind(id)
            .bind(from)
            .bind(to)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Marks an unpaid order as paid, decrements stock and clears the
    /// owner's cart, all in one transaction.
    ///
    /// ## What This Does
    /// 1. `not_paid → pending` conditional on id, owner and status
    /// 2. Per line: `count_in_stock -= quantity` (conditional on enough
    ///    stock when `enforce_stock_floor`)
    /// 3. Empties the owner's cart
    /// 4. Commits, or rolls back on the first failed step
    ///
    /// Two concurrent calls for the same order cannot both pass step 1.
    pub async fn complete_payment(
        &self,
        order_id: &str,
        user_id: &str,
        payment_details: Option<&Value>,
        enforce_stock_floor: bool,
        now: DateTime<Utc>,
    ) -> DbResult<PaymentCompletion> {
        debug!(order_id = %order_id, user_id = %user_id, "Completing payment");

        let payment_details = payment_details
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| DbError::Internal(e.to_string()))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let grand_total: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE orders
            SET status = 'pending', payment_details = ?3, paid_at = ?4, updated_at = ?4
            WHERE id = ?1 AND user_id = ?2 AND status = 'not_paid'
            RETURNING grand_total_cents
            "#,
        )
        .bind(order_id)
        .bind(user_id)
        .bind(payment_details)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(grand_total_cents) = grand_total else {
            let outcome = classify_unpaid_miss(&mut tx, order_id, user_id).await?;
            tx.rollback()
                .await
                .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
            return Ok(outcome);
        };

        let lines = sqlx::query_as::<_, (String, i64)>(
            "SELECT product_id, quantity FROM order_lines WHERE order_id = ?1 ORDER BY position",
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;

        for (product_id, quantity) in &lines {
            let sql = if enforce_stock_floor {
                "UPDATE products SET count_in_stock = count_in_stock - ?1, updated_at = ?3 \
                 WHERE id = ?2 AND count_in_stock >= ?1"
            } else {
                "UPDATE products SET count_in_stock = count_in_stock - ?1, updated_at = ?3 WHERE id = ?2"
            };

            let result = sqlx::query(sql)
                .bind(quantity)
                .bind(product_id)
                .bind(now)
                .execute(&mut *tx)
                .await?;

            if result.rows_affected() == 0 {
                let outcome = classify_stock_miss(&mut tx, product_id, *quantity).await?;
                tx.rollback()
                    .await
                    .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
                warn!(order_id = %order_id, product_id = %product_id, "Payment rolled back on stock");
                return Ok(outcome);
            }
        }

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

        info!(order_id = %order_id, grand_total = grand_total_cents, "Payment completed");

        Ok(PaymentCompletion::Completed(PaymentConfirmation {
            order_id: order_id.to_string(),
            status: OrderStatus::Pending,
            paid_at: now,
            grand_total_cents,
        }))
    }
}

async fn classify_unpaid_miss(
    conn: &mut SqliteConnection,
    order_id: &str,
    user_id: &str,
) -> DbResult<PaymentCompletion> {
    let row = sqlx::query_as::<_, (String, OrderStatus)>("SELECT user_id, status FROM orders WHERE id = ?1")
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(match row {
        None => PaymentCompletion::OrderMissing,
        Some((owner, _)) if owner != user_id => PaymentCompletion::NotOwner,
        Some((_, status)) => PaymentCompletion::AlreadyProcessed(status),
    })
}

async fn classify_stock_miss(
    conn: &mut SqliteConnection,
    product_id: &str,
    requested: i64,
) -> DbResult<PaymentCompletion> {
    let row = sqlx::query_as::<_, (String, i64)>("SELECT title, count_in_stock FROM products WHERE id = ?1")
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(match row {
        None => PaymentCompletion::ProductMissing(product_id.to_string()),
        Some((title, available)) => PaymentCompletion::StockShortfall {
            product_id: product_id.to_string(),
            title,
            available,
            requested,
        },
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
