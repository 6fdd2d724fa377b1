use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use super::{body, query};
use crate::api_types::{
    CategoryRequest, CreateProductRequest, ProductListQuery, RestockRequest, UpdateProductRequest,
};
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::CatalogService;
use crate::AppState;
use meridian_core::{Category, Page, Product};

// -----------------------------------------------------------------------------
// Products
// -----------------------------------------------------------------------------

pub(super) async fn list_products(
    State(st): State<Arc<AppState>>,
    params: Result<Query<ProductListQuery>, QueryRejection>,
) -> ApiResult<Json<Page<Product>>> {
    Ok(Json(CatalogService::new(st).list_products(query(params)?).await?))
}

pub(super) async fn get_product(State(st): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult<Json<Product>> {
    Ok(Json(CatalogService::new(st).get_product(&id).await?))
}

pub(super) async fn create_product(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = CatalogService::new(st).create_product(&auth, body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub(super) async fn update_product(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> ApiResult<Json<Product>> {
    let product = CatalogService::new(st)
        .update_product(&auth, &id, body(payload)?)
        .await?;
    Ok(Json(product))
}

pub(super) async fn restock_product(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<RestockRequest>, JsonRejection>,
) -> ApiResult<Json<Product>> {
    let req = body(payload)?;
    Ok(Json(CatalogService::new(st).restock(&auth, &id, req.quantity).await?))
}

pub(super) async fn delete_product(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    CatalogService::new(st).delete_product(&auth, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -----------------------------------------------------------------------------
// Categories
// -----------------------------------------------------------------------------

pub(super) async fn list_categories(State(st): State<Arc<AppState>>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(CatalogService::new(st).list_categories().await?))
}

pub(super) async fn get_category(State(st): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult<Json<Category>> {
    Ok(Json(CatalogService::new(st).get_category(&id).await?))
}

pub(super) async fn create_category(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let category = CatalogService::new(st).create_category(&auth, body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub(super) async fn update_category(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
) -> ApiResult<Json<Category>> {
    let category = CatalogService::new(st)
        .update_category(&auth, &id, body(payload)?)
        .await?;
    Ok(Json(category))
}

pub(super) async fn delete_category(
    State(st): State<Arc<AppState>>,
    AuthUser(auth): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    CatalogService::new(st).delete_category(&auth, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
