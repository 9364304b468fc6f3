//! Rating route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use succulent_shop_core::requests::RatingRequest;
use succulent_shop_core::{Page, PageRequest, ProductId, RatingId};

use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::Rating;
use crate::services::ratings::RatingService;
use crate::state::AppState;

pub async fn create(
    State(state): State<AppState>,
    RequireUser(actor): RequireUser,
    Json(request): Json<RatingRequest>,
) -> Result<(StatusCode, Json<Rating>)> {
    let rating = RatingService::new(state.repos()).create(&request, actor).await?;
    Ok((StatusCode::CREATED, Json(rating)))
}

pub async fn by_product(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<Rating>>> {
    let ratings = RatingService::new(state.repos())
        .list_by_product(product_id, &page)
        .await?;
    Ok(Json(ratings))
}

pub async fn delete(
    State(state): State<AppState>,
    RequireUser(actor): RequireUser,
    Path(id): Path<RatingId>,
) -> Result<StatusCode> {
    RatingService::new(state.repos()).delete(id, actor).await?;
    Ok(StatusCode::NO_CONTENT)
}
