//! User administration handlers.
//!
//! Everything here needs an admin token, except that users may read their
//! own account.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use succulent_shop_core::requests::UserRequest;
use succulent_shop_core::{Page, PageRequest, UserId};

use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireUser};
use crate::models::User;
use crate::services::users::UserService;
use crate::state::AppState;

pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<User>>> {
    Ok(Json(UserService::new(state.repos()).list(&page).await?))
}

pub async fn show(
    State(state): State<AppState>,
    RequireUser(actor): RequireUser,
    Path(id): Path<UserId>,
) -> Result<Json<User>> {
    if actor.id != id && !actor.is_admin() {
        return Err(AppError::Unauthorized(
            "You can only view your own account".to_owned(),
        ));
    }
    Ok(Json(UserService::new(state.repos()).get(id).await?))
}

pub async fn by_email(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(email): Path<String>,
) -> Result<Json<User>> {
    Ok(Json(UserService::new(state.repos()).get_by_email(&email).await?))
}

pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(request): Json<UserRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = UserService::new(state.repos()).create(&request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<UserId>,
    Json(request): Json<UserRequest>,
) -> Result<Json<User>> {
    Ok(Json(UserService::new(state.repos()).update(id, &request).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<StatusCode> {
    UserService::new(state.repos()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
