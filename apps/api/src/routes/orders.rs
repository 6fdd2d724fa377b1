use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use super::{body, query};
use crate::api_types::{
    AllOrdersQuery, CreateOrderRequest, OrderListQuery, PayOrderRequest, UpdateOrderStatusRequest,
};
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::OrderService;
use crate::AppState;
use meridian_core::{Order, Page, PaymentConfirmation};

// POST /orders
pub(super) async fn create_order(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let order = OrderService::new(st).create_order(&auth, body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

// GET /orders
pub(super) async fn list_my_orders(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
    params: Result<Query<OrderListQuery>, QueryRejection>,
) -> ApiResult<Json<Page<Order>>> {
    let page = OrderService::new(st)
        .list_orders_for_user(&auth, query(params)?)
        .await?;
    Ok(Json(page))
}

// GET /orders/all
pub(super) async fn list_all_orders(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
    params: Result<Query<AllOrdersQuery>, QueryRejection>,
) -> ApiResult<Json<Page<Order>>> {
    Ok(Json(OrderService::new(st).list_all_orders(&auth, query(params)?).await?))
}

// GET /orders/{id}
pub(super) async fn get_order(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Order>> {
    Ok(Json(OrderService::new(st).get_order(&auth, &id).await?))
}

// POST /orders/{id}/pay
//
// The body is optional; an empty request pays without provider metadata.
pub(super) async fn pay_order(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<PayOrderRequest>, JsonRejection>,
) -> ApiResult<Json<PaymentConfirmation>> {
    let req = match payload {
        Err(JsonRejection::MissingJsonContentType(_)) => PayOrderRequest::default(),
        other => body(other)?,
    };
    Ok(Json(OrderService::new(st).complete_payment(&auth, &id, req).await?))
}

// PUT /orders/{id}/status
pub(super) async fn update_status(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateOrderStatusRequest>, JsonRejection>,
) -> ApiResult<Json<Order>> {
    let req = body(payload)?;
    let order = OrderService::new(st)
        .update_order_status(&auth, &id, &req.status)
        .await?;
    Ok(Json(order))
}
