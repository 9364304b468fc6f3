//! Order route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use succulent_shop_core::requests::OrderRequest;
use succulent_shop_core::{Order, OrderId, OrderStatus, Page, PageRequest, UserId, ValidationError};

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::services::orders::OrderService;
use crate::state::AppState;

pub async fn place(
    State(state): State<AppState>,
    Json(request): Json<OrderRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = OrderService::new(state.repos()).place(&request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn index(
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<Order>>> {
    Ok(Json(OrderService::new(state.repos()).list(&page).await?))
}

pub async fn show(State(state): State<AppState>, Path(id): Path<OrderId>) -> Result<Json<Order>> {
    Ok(Json(OrderService::new(state.repos()).get(id).await?))
}

pub async fn by_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<Order>>> {
    let orders = OrderService::new(state.repos())
        .list_by_user(user_id, &page)
        .await?;
    Ok(Json(orders))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(body): Json<StatusUpdate>,
) -> Result<Json<Order>> {
    let next = body
        .status
        .parse::<OrderStatus>()
        .map_err(|_| ValidationError::single("Invalid order status value"))?;
    let order = OrderService::new(state.repos()).update_status(id, next).await?;
    Ok(Json(order))
}

pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<StatusCode> {
    OrderService::new(state.repos()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
