//! # HTTP Routes
//!
//! Thin handlers: extract, call a service, wrap the result in JSON.
//!
//! ```text
//! /api/v1
//! ├── /health                       public
//! ├── /auth/...                     register / login / refresh public, rest bearer
//! ├── /accounts/...                 bearer; list admin, others self or admin
//! ├── /vendors/...                  public
//! ├── /cart, /cart/items/...        bearer
//! ├── /orders/...                   bearer; /all and /{id}/status admin
//! ├── /products, /categories        reads public, writes by role
//! ├── /discounts                    admin
//! └── /shipping-rates               list public, writes admin
//! ```
//!
//! Middleware (tracing, CORS) is attached in `main`.

mod accounts;
mod auth;
mod cart;
mod catalog;
mod orders;
mod pricing_admin;

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::api_types::HealthResponse;
use crate::error::ApiResult;
use crate::services::HealthService;
use crate::AppState;

/// Builds the API router. All paths live under `/api/v1`.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        // Accounts
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/me", get(auth::me).delete(accounts::delete_me))
        .route("/auth/me/address", put(auth::update_address))
        .route("/accounts", get(accounts::list_accounts))
        .route(
            "/accounts/{id}",
            get(accounts::get_account)
                .patch(accounts::update_account)
                .delete(accounts::delete_account),
        )
        .route("/vendors", get(accounts::list_vendors))
        .route("/vendors/{id}", get(accounts::get_vendor))
        // Cart
        .route("/cart", get(cart::get_cart).delete(cart::clear_cart))
        .route("/cart/count", get(cart::cart_count))
        .route("/cart/items", post(cart::add_item))
        .route(
            "/cart/items/{product_id}",
            put(cart::update_item).delete(cart::remove_item),
        )
        // Orders
        .route("/orders", post(orders::create_order).get(orders::list_my_orders))
        .route("/orders/all", get(orders::list_all_orders))
        .route("/orders/{id}", get(orders::get_order))
        .route("/orders/{id}/pay", post(orders::pay_order))
        .route("/orders/{id}/status", put(orders::update_status))
        // Catalog
        .route("/products", get(catalog::list_products).post(catalog::create_product))
        .route(
            "/products/{id}",
            get(catalog::get_product)
                .put(catalog::update_product)
                .delete(catalog::delete_product),
        )
        .route("/products/{id}/restock", post(catalog::restock_product))
        .route(
            "/categories",
            get(catalog::list_categories).post(catalog::create_category),
        )
        .route(
            "/categories/{id}",
            get(catalog::get_category)
                .put(catalog::update_category)
                .delete(catalog::delete_category),
        )
        // Discounts and shipping
        .route(
            "/discounts",
            get(pricing_admin::list_discounts).post(pricing_admin::create_discount),
        )
        .route(
            "/discounts/{id}",
            get(pricing_admin::get_discount)
                .put(pricing_admin::update_discount)
                .delete(pricing_admin::delete_discount),
        )
        .route(
            "/shipping-rates",
            get(pricing_admin::list_shipping_rates).post(pricing_admin::create_shipping_rate),
        )
        .route(
            "/shipping-rates/{id}",
            put(pricing_admin::update_shipping_rate).delete(pricing_admin::delete_shipping_rate),
        );

    Router::new().nest("/api/v1", api).with_state(state)
}

// -----------------------------------------------------------------------------
// GET /api/v1/health
// -----------------------------------------------------------------------------

async fn health(State(st): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthService::new(st).check().await)
}

// -----------------------------------------------------------------------------
// Extractor helpers
// -----------------------------------------------------------------------------

/// Unwraps a JSON body, turning axum's rejection into our error shape.
pub(crate) fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload.map(|Json(value)| value).map_err(Into::into)
}

pub(crate) fn query<T>(params: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    params.map(|Query(value)| value).map_err(Into::into)
}
