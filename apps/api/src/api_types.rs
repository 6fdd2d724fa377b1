//! Request and response bodies for the HTTP surface.
//!
//! Domain records (`Order`, `Product`, `Cart`, ...) are returned as-is;
//! only shapes that exist purely for the wire live here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use meridian_core::{Account, AccountProfile, Address, CartLine, DiscountKind, Role};

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub full_name: String,
    /// `user` (default) or `vendor`
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub store_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub account: Account,
    pub tokens: TokenPair,
}

// =============================================================================
// Accounts
// =============================================================================

/// Omitted fields keep their value. `store_name` only applies to vendors;
/// an empty string clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAccountRequest {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub store_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VendorListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Public view of a vendor: no email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorProfile {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub store_name: Option<String>,
}

impl VendorProfile {
    /// `None` unless `account` is a vendor.
    pub fn from_account(account: Account) -> Option<Self> {
        match account.profile {
            AccountProfile::Vendor { store_name } => Some(VendorProfile {
                id: account.id,
                username: account.username,
                full_name: account.full_name,
                store_name,
            }),
            _ => None,
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: String,
    #[serde(default = "one")]
    pub quantity: i64,
}

fn one() -> i64 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCartLineRequest {
    /// 0 removes the line
    pub quantity: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CartCountResponse {
    pub count: i64,
}

// =============================================================================
// Orders
// =============================================================================

/// Body of `POST /orders`. Without `lines` the stored cart is used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub lines: Option<Vec<CartLine>>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub promocode: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PayOrderRequest {
    /// Opaque provider metadata, stored with the order.
    #[serde(default)]
    pub payment_details: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
}

/// Dates accept RFC 3339 timestamps or plain `YYYY-MM-DD` days.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AllOrdersQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub category_id: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub count_in_stock: i64,
}

/// Partial update; absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub sku: Option<String>,
    pub category_id: Option<String>,
    pub price_cents: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestockRequest {
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscountRequest {
    pub promocode: String,
    #[serde(rename = "type")]
    pub kind: DiscountKind,
    /// Basis points for `percentage`, cents for `fixed`
    pub value: i64,
    #[serde(default = "active")]
    pub is_active: bool,
    pub expires_at: DateTime<Utc>,
}

fn active() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShippingRateRequest {
    pub country: String,
    pub region: String,
    pub rate_cents: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateShippingRateRequest {
    pub rate_cents: i64,
}

// =============================================================================
// Health
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: bool,
    pub version: String,
    pub server_time: DateTime<Utc>,
}
