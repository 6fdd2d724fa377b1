use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;

use super::body;
use crate::api_types::{AddToCartRequest, CartCountResponse, UpdateCartLineRequest};
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::CartService;
use crate::AppState;
use meridian_core::Cart;

// GET /cart
pub(super) async fn get_cart(State(st): State<Arc<AppState>>, AuthUser(auth): AuthUser) -> ApiResult<Json<Cart>> {
    Ok(Json(CartService::new(st).get_cart(&auth).await?))
}

// GET /cart/count
pub(super) async fn cart_count(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
) -> ApiResult<Json<CartCountResponse>> {
    Ok(Json(CartService::new(st).cart_count(&auth).await?))
}

// POST /cart/items
pub(super) async fn add_item(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
    payload: Result<Json<AddToCartRequest>, JsonRejection>,
) -> ApiResult<Json<Cart>> {
    Ok(Json(CartService::new(st).add_to_cart(&auth, body(payload)?).await?))
}

// PUT /cart/items/{product_id}
pub(super) async fn update_item(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
    Path(product_id): Path<String>,
    payload: Result<Json<UpdateCartLineRequest>, JsonRejection>,
) -> ApiResult<Json<Cart>> {
    let req = body(payload)?;
    let cart = CartService::new(st)
        .update_cart_line(&auth, &product_id, req.quantity)
        .await?;
    Ok(Json(cart))
}

// DELETE /cart/items/{product_id}
pub(super) async fn remove_item(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
    Path(product_id): Path<String>,
) -> ApiResult<Json<Cart>> {
    Ok(Json(CartService::new(st).remove_cart_line(&auth, &product_id).await?))
}

// DELETE /cart
pub(super) async fn clear_cart(State(st): State<Arc<AppState>>, AuthUser(auth): AuthUser) -> ApiResult<Json<Cart>> {
    Ok(Json(CartService::new(st).clear_cart(&auth).await?))
}
