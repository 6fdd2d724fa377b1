//! # Domain Types
//!
//! Core domain types used throughout Meridian.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Catalog (read by checkout)          Orders (written by checkout)       │
//! │  ┌─────────────────┐                 ┌─────────────────────────────┐    │
//! │  │    Product      │──price/title──► │ Order                       │    │
//! │  │  count_in_stock │   snapshot      │  ├── Address (snapshot)     │    │
//! │  └─────────────────┘                 │  ├── OrderLine[] (snapshot) │    │
//! │  ┌─────────────────┐                 │  ├── Costing (immutable)    │    │
//! │  │    Discount     │──amount───────► │  └── OrderStatus (mutable)  │    │
//! │  └─────────────────┘                 └─────────────────────────────┘    │
//! │  ┌─────────────────┐                                                    │
//! │  │  ShippingRate   │──shipping_cost──► Costing                          │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Money fields are stored as `*_cents: i64` with `Money` accessors.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Vendor account that listed the product, if any.
    pub vendor_id: Option<String>,

    pub category_id: Option<String>,

    /// Stock Keeping Unit - business identifier.
    pub sku: Option<String>,

    /// Display name, frozen into order lines at checkout.
    pub title: String,

    pub description: Option<String>,

    pub image_url: Option<String>,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Units available. Only payment completion and restock change it.
    pub count_in_stock: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks if `quantity` units can be taken from current stock.
    #[inline]
    pub fn has_stock_for(&self, quantity: i64) -> bool {
        self.count_in_stock >= quantity
    }
}

// =============================================================================
// Category
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Discount
// =============================================================================

/// How a discount's `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// `value` is basis points of the subtotal (2000 = 20%).
    Percentage,
    /// `value` is a flat amount in cents, capped at the subtotal.
    Fixed,
}

impl DiscountKind {
    pub const ALL: [&'static str; 2] = ["percentage", "fixed"];
}

impl FromStr for DiscountKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "percentage" => Ok(DiscountKind::Percentage),
            "fixed" => Ok(DiscountKind::Fixed),
            _ => Err(ValidationError::NotAllowed {
                field: "type".to_string(),
                allowed: DiscountKind::ALL.iter().map(|s| s.to_string()).collect(),
            }),
        }
    }
}

/// A promocode redeemable for a discount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Discount {
    pub id: String,

    /// Unique, matched exactly at checkout.
    pub promocode: String,

    #[serde(rename = "type")]
    pub kind: DiscountKind,

    /// Basis points for `Percentage`, cents for `Fixed`.
    pub value: i64,

    pub is_active: bool,

    #[ts(as = "String")]
    pub expires_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Discount {
    /// Active and not yet expired at `now`.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now < self.expires_at
    }
}

// =============================================================================
// Shipping Rate
// =============================================================================

/// Flat shipping rate for a (country, region) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ShippingRate {
    pub id: String,
    pub country: String,
    pub region: String,
    pub rate_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl ShippingRate {
    #[inline]
    pub fn rate(&self) -> Money {
        Money::from_cents(self.rate_cents)
    }
}

// =============================================================================
// Address
// =============================================================================

/// Shipping address. Copied into the order at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Address {
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub country: String,
    pub region: String,
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle stage of an order.
///
/// ```text
/// not_paid ──complete_payment──► pending ──admin──► processing ─► shipped ─► delivered
///     │                              │
///     └──────────admin───────────────┴──────────► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created at checkout, awaiting payment confirmation.
    NotPaid,
    /// Paid; inventory has been taken.
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::NotPaid,
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::NotPaid => "not_paid",
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::NotPaid
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the canonical snake_case names. `"not paid"` and `"not-paid"`
/// are accepted for older clients; anything else is rejected.
impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: OrderStatus::ALL.iter().map(|s| s.to_string()).collect(),
            })
    }
}

// =============================================================================
// Order Line
// =============================================================================

/// A line item in an order.
/// Uses snapshot pattern to freeze product data at time of checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLine {
    pub product_id: String,
    /// Product title at checkout (frozen).
    pub title: String,
    /// Unit price in cents at checkout (frozen).
    pub unit_price_cents: i64,
    pub quantity: i64,
}

impl OrderLine {
    /// `None` when the line total overflows.
    #[inline]
    pub fn line_total(&self) -> Option<Money> {
        Money::from_cents(self.unit_price_cents).checked_mul_quantity(self.quantity)
    }
}

// =============================================================================
// Costing
// =============================================================================

/// Immutable price breakdown of an order.
///
/// ## Invariants
/// - `grand_total_cents == amount_after_discount_cents + shipping_cost_cents`
/// - `amount_after_discount_cents == sub_total_cents - discount_amount_cents`
/// - `0 <= discount_amount_cents <= sub_total_cents`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Costing {
    pub sub_total_cents: i64,
    pub discount_amount_cents: i64,
    pub amount_after_discount_cents: i64,
    pub shipping_cost_cents: i64,
    pub grand_total_cents: i64,
    pub discount_applied: bool,
    /// Promocode that produced the discount, when one was applied.
    pub promocode: Option<String>,
    /// Shipping rate used; `None` when the default rate was charged.
    pub shipping_id: Option<String>,
}

impl Costing {
    #[inline]
    pub fn grand_total(&self) -> Money {
        Money::from_cents(self.grand_total_cents)
    }

    /// Checks the arithmetic invariants.
    pub fn is_consistent(&self) -> bool {
        self.amount_after_discount_cents.checked_add(self.shipping_cost_cents) == Some(self.grand_total_cents)
            && self.sub_total_cents.checked_sub(self.discount_amount_cents)
                == Some(self.amount_after_discount_cents)
            && self.discount_amount_cents >= 0
            && self.discount_amount_cents <= self.sub_total_cents
            && self.amount_after_discount_cents >= 0
    }
}

// =============================================================================
// Order
// =============================================================================

/// An order created at checkout.
///
/// Costing and lines never change after creation; `status`,
/// `payment_details` and `paid_at` are the only mutable fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub address: Address,
    pub lines: Vec<OrderLine>,
    pub costing: Costing,
    pub status: OrderStatus,
    /// Opaque confirmation payload from the payment provider.
    #[ts(type = "unknown")]
    pub payment_details: Option<serde_json::Value>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// Result of a successful payment completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentConfirmation {
    pub order_id: String,
    pub status: OrderStatus,
    #[ts(as = "String")]
    pub paid_at: DateTime<Utc>,
    pub grand_total_cents: i64,
}

// =============================================================================
// Pagination
// =============================================================================

/// Page metadata returned alongside every list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Pagination {
    pub total: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub limit: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        let limit = limit.max(1);
        let total_pages = (total + limit - 1) / limit;
        Self {
            total,
            total_pages,
            current_page: page,
            limit,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }
}

/// A page of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// Normalized page request: `page >= 1`, `1 <= limit <= MAX_PAGE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(default_limit)
                .clamp(1, crate::MAX_PAGE_SIZE),
        }
    }

    #[inline]
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
