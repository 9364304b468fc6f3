//! Product route handlers.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use succulent_shop_core::requests::{ProductRequest, ProductSearch};
use succulent_shop_core::{Page, PageRequest, ProductId};

use crate::error::{AppError, Result};
use crate::models::{BulkImportResponse, ProductView};
use crate::routes::read_multipart;
use crate::services::products::ProductService;
use crate::state::AppState;

/// Multipart part carrying the product JSON.
const PRODUCT_PART: &str = "product";

fn service(state: &AppState) -> ProductService<'_> {
    ProductService::new(state.repos(), state.storage())
}

pub async fn index(
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<ProductView>>> {
    let page = service(&state).list(&page).await?;
    Ok(Json(page.map(ProductView::from)))
}

pub async fn search(
    State(state): State<AppState>,
    Query(search): Query<ProductSearch>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<ProductView>>> {
    let page = service(&state).search(&search, &page).await?;
    Ok(Json(page.map(ProductView::from)))
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductView>> {
    let product = service(&state).get(id).await?;
    Ok(Json(product.into()))
}

pub async fn create(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ProductView>)> {
    let (request, photo) = read_multipart::<ProductRequest>(multipart, PRODUCT_PART).await?;
    let product = service(&state).create(&request, photo.as_ref()).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Json<ProductView>> {
    let (request, photo) = read_multipart::<ProductRequest>(multipart, PRODUCT_PART).await?;
    let product = service(&state).update(id, &request, photo.as_ref()).await?;
    Ok(Json(product.into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleStatusQuery {
    pub on_sale: bool,
}

pub async fn set_sale_status(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Query(query): Query<SaleStatusQuery>,
) -> Result<Json<ProductView>> {
    let product = service(&state).set_on_sale(id, query.on_sale).await?;
    Ok(Json(product.into()))
}

/// Responds 201 when every item was imported and 207 otherwise.
pub async fn bulk_import(
    State(state): State<AppState>,
    Json(items): Json<Vec<serde_json::Value>>,
) -> Result<(StatusCode, Json<BulkImportResponse>)> {
    if items.is_empty() {
        return Err(AppError::InvalidData("Products list cannot be empty".to_owned()));
    }
    let response = service(&state).bulk_import(&items).await;
    let status = if response.is_complete() {
        StatusCode::CREATED
    } else {
        StatusCode::MULTI_STATUS
    };
    Ok((status, Json(response)))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    service(&state).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
