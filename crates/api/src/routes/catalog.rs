//! Category and plant route handlers.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};

use succulent_shop_core::requests::{CategoryRequest, PlantRequest, PlantSearch};
use succulent_shop_core::{CategoryId, Page, PageRequest, PlantId};

use crate::error::Result;
use crate::models::{Category, Plant};
use crate::routes::read_multipart;
use crate::services::catalog::{CategoryService, PlantService};
use crate::state::AppState;

const PLANT_PART: &str = "plant";

pub async fn categories(
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<Category>>> {
    Ok(Json(CategoryService::new(state.repos()).list(&page).await?))
}

pub async fn category(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Category>> {
    Ok(Json(CategoryService::new(state.repos()).get(id).await?))
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>)> {
    let category = CategoryService::new(state.repos()).create(&request).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Json(request): Json<CategoryRequest>,
) -> Result<Json<Category>> {
    Ok(Json(
        CategoryService::new(state.repos()).update(id, &request).await?,
    ))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode> {
    CategoryService::new(state.repos()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn plants_service(state: &AppState) -> PlantService<'_> {
    PlantService::new(state.repos(), state.storage())
}

pub async fn plants(
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<Plant>>> {
    Ok(Json(plants_service(&state).list(&page).await?))
}

pub async fn search_plants(
    State(state): State<AppState>,
    Query(search): Query<PlantSearch>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<Plant>>> {
    Ok(Json(plants_service(&state).search(&search, &page).await?))
}

pub async fn plant(State(state): State<AppState>, Path(id): Path<PlantId>) -> Result<Json<Plant>> {
    Ok(Json(plants_service(&state).get(id).await?))
}

pub async fn create_plant(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Plant>)> {
    let (request, photo) = read_multipart::<PlantRequest>(multipart, PLANT_PART).await?;
    let plant = plants_service(&state).create(&request, photo.as_ref()).await?;
    Ok((StatusCode::CREATED, Json(plant)))
}

pub async fn update_plant(
    State(state): State<AppState>,
    Path(id): Path<PlantId>,
    multipart: Multipart,
) -> Result<Json<Plant>> {
    let (request, photo) = read_multipart::<PlantRequest>(multipart, PLANT_PART).await?;
    Ok(Json(
        plants_service(&state)
            .update(id, &request, photo.as_ref())
            .await?,
    ))
}

pub async fn delete_plant(
    State(state): State<AppState>,
    Path(id): Path<PlantId>,
) -> Result<StatusCode> {
    plants_service(&state).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
