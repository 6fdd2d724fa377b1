use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::body;
use crate::api_types::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, TokenPair};
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::AuthService;
use crate::AppState;
use meridian_core::{Account, Address};

// POST /auth/register
pub(super) async fn register(
    State(st): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let response = AuthService::new(st).register(body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

// POST /auth/login
pub(super) async fn login(
    State(st): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    Ok(Json(AuthService::new(st).login(body(payload)?).await?))
}

// POST /auth/refresh
pub(super) async fn refresh(
    State(st): State<Arc<AppState>>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> ApiResult<Json<TokenPair>> {
    Ok(Json(AuthService::new(st).refresh(body(payload)?).await?))
}

// GET /auth/me
pub(super) async fn me(State(st): State<Arc<AppState>>, AuthUser(auth): AuthUser) -> ApiResult<Json<Account>> {
    Ok(Json(AuthService::new(st).me(&auth).await?))
}

// PUT /auth/me/address
pub(super) async fn update_address(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
    payload: Result<Json<Address>, JsonRejection>,
) -> ApiResult<Json<Account>> {
    let account = AuthService::new(st)
        .update_default_address(&auth, body(payload)?)
        .await?;
    Ok(Json(account))
}
