//! Blog post and comment domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use succulent_shop_core::{BlogId, CommentId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    pub id: BlogId,
    pub title: String,
    pub summary: String,
    pub excerpt: String,
    pub content: String,
    pub author_id: UserId,
    /// Unique, `^[a-z0-9-]+$`.
    pub slug: String,
    pub photo: Option<String>,
    pub tags: Vec<String>,
    pub published: bool,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub blog_id: BlogId,
    pub author_id: UserId,
    pub content: String,
    pub approved: bool,
    /// Set on replies.
    pub parent_id: Option<CommentId>,
    pub like_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
