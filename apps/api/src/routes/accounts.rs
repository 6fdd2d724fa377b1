use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use super::{body, query};
use crate::api_types::{AccountListQuery, UpdateAccountRequest, VendorListQuery, VendorProfile};
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::AccountService;
use crate::AppState;
use meridian_core::{Account, Page};

// DELETE /auth/me
pub(super) async fn delete_me(State(st): State<Arc<AppState>>, AuthUser(auth): AuthUser) -> ApiResult<StatusCode> {
    AccountService::new(st).delete_account(&auth, &auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -----------------------------------------------------------------------------
// Accounts
// -----------------------------------------------------------------------------

pub(super) async fn list_accounts(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
    params: Result<Query<AccountListQuery>, QueryRejection>,
) -> ApiResult<Json<Page<Account>>> {
    Ok(Json(AccountService::new(st).list_accounts(&auth, query(params)?).await?))
}

pub(super) async fn get_account(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Account>> {
    Ok(Json(AccountService::new(st).get_account(&auth, &id).await?))
}

pub(super) async fn update_account(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateAccountRequest>, JsonRejection>,
) -> ApiResult<Json<Account>> {
    let account = AccountService::new(st)
        .update_account(&auth, &id, body(payload)?)
        .await?;
    Ok(Json(account))
}

pub(super) async fn delete_account(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    AccountService::new(st).delete_account(&auth, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -----------------------------------------------------------------------------
// Vendors
// -----------------------------------------------------------------------------

pub(super) async fn list_vendors(
    State(st): State<Arc<AppState>>,
    params: Result<Query<VendorListQuery>, QueryRejection>,
) -> ApiResult<Json<Page<VendorProfile>>> {
    Ok(Json(AccountService::new(st).list_vendors(query(params)?).await?))
}

pub(super) async fn get_vendor(State(st): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult<Json<VendorProfile>> {
    Ok(Json(AccountService::new(st).get_vendor(&id).await?))
}
