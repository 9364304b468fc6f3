//! Unified error handling with Sentry integration.
//!
//! Every route handler returns `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before responding; their details never reach the client.
//!
//! Error bodies are JSON:
//!
//! ```json
//! { "status": 400, "message": "Address cannot be empty, ...", "errors": ["Address cannot be empty", "..."] }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use succulent_shop_core::{TransitionError, ValidationError};

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::storage::StorageError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Requested resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Request is well-formed but not acceptable (bad state, missing references).
    #[error("{0}")]
    InvalidData(String),

    /// One or more field validations failed.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// No valid credentials were presented.
    #[error("{0}")]
    Unauthenticated(String),

    /// The caller is authenticated but may not do this.
    #[error("{0}")]
    Unauthorized(String),

    /// Integrity violation (unique value taken, row still referenced, concurrent update).
    #[error("{0}")]
    Conflict(String),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// File storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Repository(RepositoryError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("Resource not found".to_owned()),
            RepositoryError::Conflict(message) => Self::Conflict(message),
            other => Self::Repository(other),
        }
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        Self::InvalidData(err.to_string())
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub message: String,
    pub errors: Vec<String>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidData(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Unauthorized(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::Repository(_) | AuthError::PasswordHash | AuthError::TokenIssue => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Storage(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Storage(_) | Self::Repository(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(&self) -> ErrorBody {
        let status = self.status();
        let (message, errors) = match self {
            Self::Validation(err) => (err.to_string(), err.violations.clone()),
            _ if status.is_server_error() => ("Internal server error".to_owned(), Vec::new()),
            Self::Auth(AuthError::InvalidCredentials) => ("Invalid credentials".to_owned(), Vec::new()),
            Self::Auth(AuthError::InvalidToken) => {
                ("Invalid or expired token".to_owned(), Vec::new())
            }
            Self::Auth(AuthError::UserAlreadyExists) => (
                "An account with this email already exists".to_owned(),
                Vec::new(),
            ),
            other => (other.to_string(), Vec::new()),
        };
        let errors = if errors.is_empty() {
            vec![message.clone()]
        } else {
            errors
        };
        ErrorBody {
            status: status.as_u16(),
            message,
            errors,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, Json(self.body())).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the authenticated caller.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}
