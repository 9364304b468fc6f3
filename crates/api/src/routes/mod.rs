//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST   /api/v1/auth/register
//! POST   /api/v1/auth/login
//!
//! # Products
//! GET    /api/v1/products                     - Page of products
//! POST   /api/v1/products                     - Create (multipart: product, photo)
//! GET    /api/v1/products/search              - Filtered page
//! POST   /api/v1/products/bulk                - Bulk import (201, or 207 on partial failure)
//! GET    /api/v1/products/photos/{fileName}
//! GET    /api/v1/products/{id}
//! PUT    /api/v1/products/{id}                - Update (multipart)
//! DELETE /api/v1/products/{id}
//! PATCH  /api/v1/products/{id}/sale-status?onSale=
//!
//! # Orders
//! GET    /api/v1/orders
//! POST   /api/v1/orders
//! GET    /api/v1/orders/user/{userId}
//! GET    /api/v1/orders/{id}
//! DELETE /api/v1/orders/{id}                  - Admin only
//! PATCH  /api/v1/orders/{id}/status
//!
//! # Catalog
//! GET|POST        /api/v1/categories
//! GET|PUT|DELETE  /api/v1/categories/{id}
//! GET|POST        /api/v1/plants              - POST is multipart (plant, photo)
//! GET             /api/v1/plants/search
//! GET             /api/v1/plants/photos/{fileName}
//! GET|PUT|DELETE  /api/v1/plants/{id}
//!
//! # Users (admin)
//! GET|POST        /api/v1/users
//! GET             /api/v1/users/email/{email}
//! GET|PUT|DELETE  /api/v1/users/{id}
//!
//! # Ratings
//! POST   /api/v1/ratings
//! GET    /api/v1/ratings/products/{productId}
//! DELETE /api/v1/ratings/{id}
//!
//! # Blog
//! GET|POST        /api/v1/blogs               - POST is multipart (blog, photo)
//! GET             /api/v1/blogs/search
//! GET             /api/v1/blogs/slug/{slug}   - Counts a view
//! GET             /api/v1/blogs/photos/{fileName}
//! GET|PUT|DELETE  /api/v1/blogs/{id}
//! PATCH           /api/v1/blogs/{id}/publish?published=
//!
//! # Comments
//! POST   /api/v1/comments
//! GET    /api/v1/comments/pending
//! GET    /api/v1/comments/blog/{blogId}
//! POST   /api/v1/comments/{id}/reply
//! PUT    /api/v1/comments/{id}
//! DELETE /api/v1/comments/{id}
//! PATCH  /api/v1/comments/{id}/approve
//! ```

pub mod auth;
pub mod blogs;
pub mod catalog;
pub mod orders;
pub mod products;
pub mod ratings;
pub mod users;

use axum::{
    Router,
    body::Body,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};
use crate::services::storage::PhotoUpload;
use crate::state::AppState;

/// Multipart part carrying the upload.
pub const PHOTO_PART: &str = "photo";

/// Photos never change under a name, so clients may cache them for a year.
const PHOTO_CACHE_CONTROL: &str = "max-age=31536000";

fn bad_multipart(err: &MultipartError) -> AppError {
    AppError::InvalidData(format!("Malformed multipart request: {}", err.body_text()))
}

/// Read a JSON part named `part` and an optional `photo` part.
///
/// An empty photo part counts as no photo.
///
/// # Errors
///
/// Returns `InvalidData` for a malformed body, a missing or unparsable JSON part.
pub async fn read_multipart<T: DeserializeOwned>(
    mut multipart: Multipart,
    part: &str,
) -> Result<(T, Option<PhotoUpload>)> {
    let mut data = None;
    let mut photo = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| bad_multipart(&e))? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(n) if n == part => {
                let bytes = field.bytes().await.map_err(|e| bad_multipart(&e))?;
                let parsed = serde_json::from_slice::<T>(&bytes)
                    .map_err(|e| AppError::InvalidData(format!("Invalid {part} data: {e}")))?;
                data = Some(parsed);
            }
            Some(PHOTO_PART) => {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await.map_err(|e| bad_multipart(&e))?;
                if !bytes.is_empty() {
                    photo = Some(PhotoUpload {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    let data = data.ok_or_else(|| AppError::InvalidData(format!("Missing '{part}' part")))?;
    Ok((data, photo))
}

/// Serve a stored photo with a long cache lifetime.
///
/// # Errors
///
/// Returns 404 for unknown names and 400 for names that try to leave the
/// upload directory.
pub async fn serve_photo(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<Response> {
    let file = state.storage().load(&file_name).await?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(file.content_type)),
            (header::CACHE_CONTROL, HeaderValue::from_static(PHOTO_CACHE_CONTROL)),
        ],
        Body::from(file.bytes),
    )
        .into_response())
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/search", get(products::search))
        .route("/bulk", post(products::bulk_import))
        .route("/photos/{file_name}", get(serve_photo))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/{id}/sale-status", patch(products::set_sale_status))
}

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::place))
        .route("/user/{user_id}", get(orders::by_user))
        .route("/{id}", get(orders::show).delete(orders::delete))
        .route("/{id}/status", patch(orders::update_status))
}

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::categories).post(catalog::create_category))
        .route(
            "/{id}",
            get(catalog::category)
                .put(catalog::update_category)
                .delete(catalog::delete_category),
        )
}

pub fn plant_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::plants).post(catalog::create_plant))
        .route("/search", get(catalog::search_plants))
        .route("/photos/{file_name}", get(serve_photo))
        .route(
            "/{id}",
            get(catalog::plant)
                .put(catalog::update_plant)
                .delete(catalog::delete_plant),
        )
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::index).post(users::create))
        .route("/email/{email}", get(users::by_email))
        .route(
            "/{id}",
            get(users::show).put(users::update).delete(users::delete),
        )
}

pub fn rating_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(ratings::create))
        .route("/products/{product_id}", get(ratings::by_product))
        .route("/{id}", axum::routing::delete(ratings::delete))
}

pub fn blog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(blogs::index).post(blogs::create))
        .route("/search", get(blogs::search))
        .route("/slug/{slug}", get(blogs::by_slug))
        .route("/photos/{file_name}", get(serve_photo))
        .route(
            "/{id}",
            get(blogs::show).put(blogs::update).delete(blogs::delete),
        )
        .route("/{id}/publish", patch(blogs::set_published))
}

pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(blogs::create_comment))
        .route("/pending", get(blogs::pending_comments))
        .route("/blog/{blog_id}", get(blogs::comments_for_blog))
        .route("/{id}/reply", post(blogs::reply))
        .route(
            "/{id}",
            axum::routing::put(blogs::update_comment).delete(blogs::delete_comment),
        )
        .route("/{id}/approve", patch(blogs::approve_comment))
}

/// Create all `/api/v1` routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .nest("/orders", order_routes())
        .nest("/categories", category_routes())
        .nest("/plants", plant_routes())
        .nest("/users", user_routes())
        .nest("/ratings", rating_routes())
        .nest("/blogs", blog_routes())
        .nest("/comments", comment_routes())
}
