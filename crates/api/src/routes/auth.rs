//! Registration and login.

use axum::{Json, extract::State, http::StatusCode};

use succulent_shop_core::requests::{LoginRequest, RegisterRequest};

use crate::error::Result;
use crate::services::auth::{AuthResponse, AuthService};
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let response = AuthService::new(state.repos().users.as_ref(), state.jwt())
        .register(&request)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let response = AuthService::new(state.repos().users.as_ref(), state.jwt())
        .login(&request)
        .await?;
    Ok(Json(response))
}
