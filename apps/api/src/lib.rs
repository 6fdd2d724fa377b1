//! # Meridian API
//!
//! HTTP server for the storefront: accounts, catalog, carts and the
//! checkout pipeline.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           API Services                                  │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  AuthService   │  │  CartService   │  │  OrderService              ││
//! │  │                │  │                │  │                            ││
//! │  │ • register     │  │ • get / count  │  │ • create_order             ││
//! │  │ • login        │  │ • add / update │  │ • complete_payment         ││
//! │  │ • refresh, me  │  │ • remove/clear │  │ • get / list / set status  ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────┐            │
//! │  │ CatalogService │  │DiscountService │  │ShippingService │            │
//! │  │ products,      │  │ promocodes     │  │ rates per      │            │
//! │  │ categories     │  │                │  │ destination    │            │
//! │  └────────────────┘  └────────────────┘  └────────────────┘            │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Infrastructure                               │  │
//! │  │  SQLite (meridian-db)   JWT (HS256)   meridian-core rules         │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ApiConfig`]; every key can be set via `MERIDIAN_<KEY>`.

pub mod api_types;
pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod services;

// Re-exports
pub use auth::{AuthUser, JwtManager};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::build_router;

use meridian_db::Database;

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    pub db: Database,
    pub config: ApiConfig,
    pub jwt: JwtManager,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let jwt = JwtManager::new(
            &config.jwt_secret,
            config.access_token_ttl_secs,
            config.refresh_token_ttl_secs,
        );
        AppState { db, config, jwt }
    }
}
