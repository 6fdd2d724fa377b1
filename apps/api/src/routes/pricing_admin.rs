//! Discounts and shipping rates: the admin-managed inputs to costing.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::body;
use crate::api_types::{DiscountRequest, ShippingRateRequest, UpdateShippingRateRequest};
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::{DiscountService, ShippingService};
use crate::AppState;
use meridian_core::{Discount, ShippingRate};

// -----------------------------------------------------------------------------
// Discounts
// -----------------------------------------------------------------------------

pub(super) async fn list_discounts(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
) -> ApiResult<Json<Vec<Discount>>> {
    Ok(Json(DiscountService::new(st).list(&auth).await?))
}

pub(super) async fn get_discount(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Discount>> {
    Ok(Json(DiscountService::new(st).get(&auth, &id).await?))
}

pub(super) async fn create_discount(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
    payload: Result<Json<DiscountRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Discount>)> {
    let discount = DiscountService::new(st).create(&auth, body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(discount)))
}

pub(super) async fn update_discount(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<DiscountRequest>, JsonRejection>,
) -> ApiResult<Json<Discount>> {
    Ok(Json(DiscountService::new(st).update(&auth, &id, body(payload)?).await?))
}

pub(super) async fn delete_discount(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    DiscountService::new(st).delete(&auth, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -----------------------------------------------------------------------------
// Shipping rates
// -----------------------------------------------------------------------------

pub(super) async fn list_shipping_rates(State(st): State<Arc<AppState>>) -> ApiResult<Json<Vec<ShippingRate>>> {
    Ok(Json(ShippingService::new(st).list().await?))
}

pub(super) async fn create_shipping_rate(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
    payload: Result<Json<ShippingRateRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ShippingRate>)> {
    let rate = ShippingService::new(st).create(&auth, body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(rate)))
}

pub(super) async fn update_shipping_rate(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateShippingRateRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let req = body(payload)?;
    ShippingService::new(st).update_rate(&auth, &id, req.rate_cents).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn delete_shipping_rate(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    ShippingService::new(st).delete(&auth, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
