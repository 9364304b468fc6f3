//! Bearer token extractors.
//!
//! Handlers declare what they need:
//!
//! ```rust,ignore
//! async fn create_comment(
//!     State(state): State<AppState>,
//!     RequireUser(actor): RequireUser,
//!     Json(body): Json<CommentRequest>,
//! ) -> Result<Json<Comment>> { ... }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::services::Actor;
use crate::state::AppState;

/// Token from `Authorization: Bearer <token>`, if the header has that shape.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
        .filter(|t| !t.is_empty())
}

fn actor_from(parts: &Parts, state: &AppState) -> Result<Option<Actor>, AppError> {
    let Some(token) = bearer_token(parts) else {
        return Ok(None);
    };
    let claims = state.jwt().verify(token)?;
    let actor = Actor {
        id: claims.user_id(),
        role: claims.role,
    };
    set_sentry_user(&actor.id);
    Ok(Some(actor))
}

/// Extractor that requires a valid bearer token.
///
/// Missing or invalid tokens are rejected with 401.
pub struct RequireUser(pub Actor);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        actor_from(parts, state)?
            .map(Self)
            .ok_or_else(|| AppError::Unauthenticated("Authentication required".to_owned()))
    }
}

/// Extractor that reads a bearer token when one is sent.
///
/// A token that is present but invalid is still rejected, so a stale token
/// never silently downgrades to anonymous access.
pub struct OptionalUser(pub Option<Actor>);

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Self(actor_from(parts, state)?))
    }
}

/// Extractor that requires an admin token. Other roles get 403.
pub struct RequireAdmin(pub Actor);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let RequireUser(actor) = RequireUser::from_request_parts(parts, state).await?;
        if actor.is_admin() {
            Ok(Self(actor))
        } else {
            Err(AppError::Unauthorized("Admin access required".to_owned()))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&parts_with(Some("bearer  xyz"))), Some("xyz"));
        assert_eq!(bearer_token(&parts_with(Some("Basic dXNlcjpwYXNz"))), None);
        assert_eq!(bearer_token(&parts_with(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts_with(None)), None);
    }
}
