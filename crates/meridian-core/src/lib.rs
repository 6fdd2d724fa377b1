//! # meridian-core: Pure Business Logic for Meridian Commerce
//!
//! This crate holds the checkout pipeline's rules as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Meridian Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                apps/api (axum HTTP server)                      │   │
//! │  │    handlers ──► services (checkout, payment, cart, catalog)    │   │
//! │  └───────────────┬──────────────────────────────┬──────────────────┘   │
//! │                  │                              │                       │
//! │  ┌───────────────▼──────────────────┐  ┌────────▼──────────────────┐   │
//! │  │  ★ meridian-core (THIS CRATE) ★  │  │  meridian-db (SQLite)     │   │
//! │  │                                  │  │  repositories,            │   │
//! │  │  pricing   stock   discount      │  │  payment transaction      │   │
//! │  │  shipping  order   permissions   │  └───────────────────────────┘   │
//! │  │  cart      money   validation    │                                   │
//! │  │                                  │                                   │
//! │  │  NO I/O • NO DATABASE • NO CLOCK │                                   │
//! │  └──────────────────────────────────┘                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`pricing`] - Costing calculator
//! - [`stock`] - Stock validator
//! - [`discount`] - Promocode usability
//! - [`shipping`] - Shipping quote with default fallback
//! - [`order`] - Address resolution, order snapshot, status rules
//! - [`cart`] - Cart mutations
//! - [`permissions`] - Role checks per operation
//! - [`account`] - Account tagged union and roles
//! - [`types`] - Domain records
//! - [`money`] - Integer money
//! - [`validation`] - Input rules
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use meridian_core::{pricing, shipping, OrderLine};
//!
//! let lines = vec![OrderLine {
//!     product_id: "p1".into(),
//!     title: "Lamp".into(),
//!     unit_price_cents: 2500,
//!     quantity: 2,
//! }];
//! let costing = pricing::calculate(&lines, &shipping::quote(None), None, Utc::now()).unwrap();
//! assert_eq!(costing.grand_total_cents, 6000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod account;
pub mod cart;
pub mod discount;
pub mod error;
pub mod money;
pub mod order;
pub mod permissions;
pub mod pricing;
pub mod shipping;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use account::{Account, AccountProfile, AdminLevel, Role};
pub use cart::{Cart, CartLine};
pub use error::{CoreError, CoreResult, ValidationError, ValidationErrors};
pub use money::Money;
pub use permissions::{authorize, Action, AuthContext};
pub use shipping::ShippingQuote;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines in a cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Upper bound for any list page size.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Upper bound for a single price, shipping rate or fixed discount
/// (10,000,000.00). Keeps every costing of a full cart well inside `i64`.
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000;

/// Upper bound for `count_in_stock`.
pub const MAX_STOCK_COUNT: i64 = 1_000_000_000;
