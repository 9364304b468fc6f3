//! Blog post and comment handlers.
//!
//! Reads are public; every write needs a bearer token.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use succulent_shop_core::requests::{BlogRequest, BlogSearch, CommentRequest};
use succulent_shop_core::{BlogId, CommentId, Page, PageRequest};

use crate::error::Result;
use crate::middleware::{OptionalUser, RequireUser};
use crate::models::{Blog, Comment};
use crate::routes::read_multipart;
use crate::services::blog::{BlogService, CommentService};
use crate::state::AppState;

const BLOG_PART: &str = "blog";

fn blogs(state: &AppState) -> BlogService<'_> {
    BlogService::new(state.repos(), state.storage())
}

pub async fn index(
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<Blog>>> {
    Ok(Json(blogs(&state).list(&page).await?))
}

pub async fn search(
    State(state): State<AppState>,
    Query(search): Query<BlogSearch>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<Blog>>> {
    Ok(Json(blogs(&state).search(&search, &page).await?))
}

pub async fn show(State(state): State<AppState>, Path(id): Path<BlogId>) -> Result<Json<Blog>> {
    Ok(Json(blogs(&state).get(id).await?))
}

pub async fn by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Blog>> {
    Ok(Json(blogs(&state).view_by_slug(&slug).await?))
}

pub async fn create(
    State(state): State<AppState>,
    RequireUser(actor): RequireUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Blog>)> {
    let (request, photo) = read_multipart::<BlogRequest>(multipart, BLOG_PART).await?;
    let blog = blogs(&state).create(&request, photo.as_ref(), actor).await?;
    Ok((StatusCode::CREATED, Json(blog)))
}

pub async fn update(
    State(state): State<AppState>,
    RequireUser(actor): RequireUser,
    Path(id): Path<BlogId>,
    multipart: Multipart,
) -> Result<Json<Blog>> {
    let (request, photo) = read_multipart::<BlogRequest>(multipart, BLOG_PART).await?;
    Ok(Json(
        blogs(&state)
            .update(id, &request, photo.as_ref(), actor)
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct PublishQuery {
    pub published: bool,
}

pub async fn set_published(
    State(state): State<AppState>,
    RequireUser(actor): RequireUser,
    Path(id): Path<BlogId>,
    Query(query): Query<PublishQuery>,
) -> Result<Json<Blog>> {
    Ok(Json(
        blogs(&state)
            .set_published(id, query.published, actor)
            .await?,
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    RequireUser(actor): RequireUser,
    Path(id): Path<BlogId>,
) -> Result<StatusCode> {
    blogs(&state).delete(id, actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn comments_for_blog(
    State(state): State<AppState>,
    OptionalUser(viewer): OptionalUser,
    Path(blog_id): Path<BlogId>,
) -> Result<Json<Vec<Comment>>> {
    let comments = CommentService::new(state.repos())
        .list_by_blog(blog_id, viewer)
        .await?;
    Ok(Json(comments))
}

pub async fn create_comment(
    State(state): State<AppState>,
    RequireUser(actor): RequireUser,
    Json(request): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>)> {
    let comment = CommentService::new(state.repos()).create(&request, actor).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn reply(
    State(state): State<AppState>,
    RequireUser(actor): RequireUser,
    Path(parent_id): Path<CommentId>,
    Json(request): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>)> {
    let comment = CommentService::new(state.repos())
        .reply(parent_id, &request, actor)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn update_comment(
    State(state): State<AppState>,
    RequireUser(actor): RequireUser,
    Path(id): Path<CommentId>,
    Json(request): Json<CommentRequest>,
) -> Result<Json<Comment>> {
    Ok(Json(
        CommentService::new(state.repos())
            .update(id, &request, actor)
            .await?,
    ))
}

pub async fn approve_comment(
    State(state): State<AppState>,
    RequireUser(actor): RequireUser,
    Path(id): Path<CommentId>,
) -> Result<Json<Comment>> {
    Ok(Json(CommentService::new(state.repos()).approve(id, actor).await?))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    RequireUser(actor): RequireUser,
    Path(id): Path<CommentId>,
) -> Result<StatusCode> {
    CommentService::new(state.repos()).delete(id, actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn pending_comments(
    State(state): State<AppState>,
    RequireUser(actor): RequireUser,
) -> Result<Json<Vec<Comment>>> {
    Ok(Json(CommentService::new(state.repos()).pending(actor).await?))
}
