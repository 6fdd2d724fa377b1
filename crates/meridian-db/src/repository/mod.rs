//! # Repository Module
//!
//! One repository per aggregate, each holding its own pool handle.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Service (apps/api)                                                     │
//! │       │                                                                 │
//! │       │  db.orders().complete_payment(&id, &user, None, true, now)      │
//! │       ▼                                                                 │
//! │  OrderRepository                                                        │
//! │  ├── insert(&self, order)                                               │
//! │  ├── get_by_id(&self, id)                                               │
//! │  ├── list(&self, filter, page)                                          │
//! │  ├── update_status(&self, id, from, to, now)                            │
//! │  └── complete_payment(&self, ...)   ◄── single transaction              │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`AccountRepository`](account::AccountRepository) - Accounts and credentials
//! - [`ProductRepository`](product::ProductRepository) - Catalog and restocking
//! - [`CategoryRepository`](category::CategoryRepository) - Product categories
//! - [`DiscountRepository`](discount::DiscountRepository) - Promocodes
//! - [`ShippingRateRepository`](shipping::ShippingRateRepository) - Per-destination rates
//! - [`CartRepository`](cart::CartRepository) - One cart per user
//! - [`OrderRepository`](order::OrderRepository) - Orders and payment completion

pub mod account;
pub mod cart;
pub mod category;
pub mod discount;
pub mod order;
pub mod product;
pub mod shipping;
