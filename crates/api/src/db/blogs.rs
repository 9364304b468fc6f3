//! Blog post and comment repositories.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};

use succulent_shop_core::pagination::PageSpec;
use succulent_shop_core::requests::{BlogDraft, BlogSearch, CommentDraft};
use succulent_shop_core::{BlogId, CommentId, Page, UserId};

use super::{PgStore, RepositoryError, count_to_u64, map_constraint};
use crate::models::{Blog, Comment};

pub const SORT_FIELDS: &[(&str, &str)] = &[
    ("id", "id"),
    ("title", "title"),
    ("slug", "slug"),
    ("viewCount", "view_count"),
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
];

const SLUG_TAKEN: &str = "slug already exists";

#[async_trait]
pub trait BlogRepository: Send + Sync {
    async fn get(&self, id: BlogId) -> Result<Option<Blog>, RepositoryError>;
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Blog>, RepositoryError>;
    /// Bump the view counter and return the post as stored afterwards.
    async fn increment_views_by_slug(&self, slug: &str) -> Result<Option<Blog>, RepositoryError>;
    async fn list(&self, page: &PageSpec) -> Result<Page<Blog>, RepositoryError>;
    /// Matches the query against title and content; any listed tag matches.
    async fn search(
        &self,
        search: &BlogSearch,
        page: &PageSpec,
    ) -> Result<Page<Blog>, RepositoryError>;
    async fn insert(
        &self,
        draft: &BlogDraft,
        author_id: UserId,
        photo: Option<&str>,
    ) -> Result<Blog, RepositoryError>;
    /// `photo: None` keeps the current photo. The author never changes.
    async fn update(
        &self,
        id: BlogId,
        draft: &BlogDraft,
        photo: Option<&str>,
    ) -> Result<Blog, RepositoryError>;
    async fn set_published(&self, id: BlogId, published: bool) -> Result<Blog, RepositoryError>;
    async fn delete(&self, id: BlogId) -> Result<bool, RepositoryError>;
    async fn photo_names(&self) -> Result<Vec<String>, RepositoryError>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn get(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError>;
    /// Every comment on a post, oldest first.
    async fn list_by_blog(&self, blog_id: BlogId) -> Result<Vec<Comment>, RepositoryError>;
    async fn insert(
        &self,
        draft: &CommentDraft,
        author_id: UserId,
        approved: bool,
    ) -> Result<Comment, RepositoryError>;
    async fn update_content(&self, id: CommentId, content: &str)
    -> Result<Comment, RepositoryError>;
    async fn approve(&self, id: CommentId) -> Result<Comment, RepositoryError>;
    async fn delete(&self, id: CommentId) -> Result<bool, RepositoryError>;
    /// Unapproved comments; limited to posts written by `blog_author` when set.
    async fn list_pending(
        &self,
        blog_author: Option<UserId>,
    ) -> Result<Vec<Comment>, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct BlogRow {
    id: BlogId,
    title: String,
    summary: String,
    excerpt: String,
    content: String,
    author_id: UserId,
    slug: String,
    photo: Option<String>,
    tags: Vec<String>,
    published: bool,
    view_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BlogRow> for Blog {
    fn from(row: BlogRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            summary: row.summary,
            excerpt: row.excerpt,
            content: row.content,
            author_id: row.author_id,
            slug: row.slug,
            photo: row.photo,
            tags: row.tags,
            published: row.published,
            view_count: row.view_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: CommentId,
    blog_id: BlogId,
    author_id: UserId,
    content: String,
    approved: bool,
    parent_id: Option<CommentId>,
    like_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            blog_id: row.blog_id,
            author_id: row.author_id,
            content: row.content,
            approved: row.approved,
            parent_id: row.parent_id,
            like_count: row.like_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const BLOG_COLUMNS: &str = "id, title, summary, excerpt, content, author_id, slug, photo, tags, \
     published, view_count, created_at, updated_at";
const COMMENT_COLUMNS: &str =
    "c.id, c.blog_id, c.author_id, c.content, c.approved, c.parent_id, c.like_count, \
     c.created_at, c.updated_at";

fn push_blog_filter(qb: &mut QueryBuilder<'_, Postgres>, search: &BlogSearch) {
    qb.push(" WHERE TRUE");
    if search.published_only {
        qb.push(" AND published");
    }
    if let Some(term) = search.term() {
        let pattern = format!("%{term}%");
        qb.push(" AND (LOWER(title) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(content) LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    let tags = search.tag_list();
    if !tags.is_empty() {
        qb.push(" AND tags && ").push_bind(tags);
    }
}

#[async_trait]
impl BlogRepository for PgStore {
    async fn get(&self, id: BlogId) -> Result<Option<Blog>, RepositoryError> {
        let row: Option<BlogRow> =
            sqlx::query_as(&format!("SELECT {BLOG_COLUMNS} FROM blogs WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool())
                .await?;
        Ok(row.map(Blog::from))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Blog>, RepositoryError> {
        let row: Option<BlogRow> =
            sqlx::query_as(&format!("SELECT {BLOG_COLUMNS} FROM blogs WHERE slug = $1"))
                .bind(slug)
                .fetch_optional(self.pool())
                .await?;
        Ok(row.map(Blog::from))
    }

    async fn increment_views_by_slug(&self, slug: &str) -> Result<Option<Blog>, RepositoryError> {
        let row: Option<BlogRow> = sqlx::query_as(&format!(
            "UPDATE blogs SET view_count = view_count + 1 WHERE slug = $1 RETURNING {BLOG_COLUMNS}"
        ))
        .bind(slug)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Blog::from))
    }

    async fn list(&self, page: &PageSpec) -> Result<Page<Blog>, RepositoryError> {
        let all = BlogSearch {
            published_only: false,
            ..BlogSearch::default()
        };
        self.search(&all, page).await
    }

    async fn search(
        &self,
        search: &BlogSearch,
        page: &PageSpec,
    ) -> Result<Page<Blog>, RepositoryError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM blogs");
        push_blog_filter(&mut count, search);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool()).await?;

        let mut select = QueryBuilder::new(format!("SELECT {BLOG_COLUMNS} FROM blogs"));
        push_blog_filter(&mut select, search);
        select
            .push(format!(
                " ORDER BY {} {}, id ASC LIMIT ",
                page.sort_column,
                page.direction.as_sql()
            ))
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows: Vec<BlogRow> = select.build_query_as().fetch_all(self.pool()).await?;

        Ok(Page::new(
            rows.into_iter().map(Blog::from).collect(),
            page,
            count_to_u64(total),
        ))
    }

    async fn insert(
        &self,
        draft: &BlogDraft,
        author_id: UserId,
        photo: Option<&str>,
    ) -> Result<Blog, RepositoryError> {
        let row: BlogRow = sqlx::query_as(&format!(
            r"
            INSERT INTO blogs (title, summary, excerpt, content, author_id, slug, photo, tags,
                               published)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {BLOG_COLUMNS}
            "
        ))
        .bind(&draft.title)
        .bind(&draft.summary)
        .bind(&draft.excerpt)
        .bind(&draft.content)
        .bind(author_id)
        .bind(&draft.slug)
        .bind(photo)
        .bind(&draft.tags)
        .bind(draft.published)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_constraint(e, SLUG_TAKEN))?;
        Ok(row.into())
    }

    async fn update(
        &self,
        id: BlogId,
        draft: &BlogDraft,
        photo: Option<&str>,
    ) -> Result<Blog, RepositoryError> {
        let row: Option<BlogRow> = sqlx::query_as(&format!(
            r"
            UPDATE blogs
            SET title = $2, summary = $3, excerpt = $4, content = $5, slug = $6,
                photo = COALESCE($7, photo), tags = $8, published = $9, updated_at = NOW()
            WHERE id = $1
            RETURNING {BLOG_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.summary)
        .bind(&draft.excerpt)
        .bind(&draft.content)
        .bind(&draft.slug)
        .bind(photo)
        .bind(&draft.tags)
        .bind(draft.published)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_constraint(e, SLUG_TAKEN))?;
        row.map(Blog::from).ok_or(RepositoryError::NotFound)
    }

    async fn set_published(&self, id: BlogId, published: bool) -> Result<Blog, RepositoryError> {
        let row: Option<BlogRow> = sqlx::query_as(&format!(
            "UPDATE blogs SET published = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {BLOG_COLUMNS}"
        ))
        .bind(id)
        .bind(published)
        .fetch_optional(self.pool())
        .await?;
        row.map(Blog::from).ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: BlogId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM blogs WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| map_constraint(e, "blog post is still referenced"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn photo_names(&self) -> Result<Vec<String>, RepositoryError> {
        let names = sqlx::query_scalar("SELECT photo FROM blogs WHERE photo IS NOT NULL")
            .fetch_all(self.pool())
            .await?;
        Ok(names)
    }
}

#[async_trait]
impl CommentRepository for PgStore {
    async fn get(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError> {
        let row: Option<CommentRow> =
            sqlx::query_as(&format!("SELECT {COMMENT_COLUMNS} FROM comments c WHERE c.id = $1"))
                .bind(id)
                .fetch_optional(self.pool())
                .await?;
        Ok(row.map(Comment::from))
    }

    async fn list_by_blog(&self, blog_id: BlogId) -> Result<Vec<Comment>, RepositoryError> {
        let rows: Vec<CommentRow> = sqlx::query_as(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments c WHERE c.blog_id = $1 ORDER BY c.created_at, c.id"
        ))
        .bind(blog_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn insert(
        &self,
        draft: &CommentDraft,
        author_id: UserId,
        approved: bool,
    ) -> Result<Comment, RepositoryError> {
        let row: CommentRow = sqlx::query_as(&format!(
            r"
            INSERT INTO comments AS c (blog_id, author_id, content, approved, parent_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COMMENT_COLUMNS}
            "
        ))
        .bind(draft.blog_id)
        .bind(author_id)
        .bind(&draft.content)
        .bind(approved)
        .bind(draft.parent_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_constraint(e, "comment references a missing post or comment"))?;
        Ok(row.into())
    }

    async fn update_content(
        &self,
        id: CommentId,
        content: &str,
    ) -> Result<Comment, RepositoryError> {
        let row: Option<CommentRow> = sqlx::query_as(&format!(
            "UPDATE comments AS c SET content = $2, updated_at = NOW() WHERE c.id = $1 \
             RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(content)
        .fetch_optional(self.pool())
        .await?;
        row.map(Comment::from).ok_or(RepositoryError::NotFound)
    }

    async fn approve(&self, id: CommentId) -> Result<Comment, RepositoryError> {
        let row: Option<CommentRow> = sqlx::query_as(&format!(
            "UPDATE comments AS c SET approved = TRUE, updated_at = NOW() WHERE c.id = $1 \
             RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        row.map(Comment::from).ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: CommentId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_pending(
        &self,
        blog_author: Option<UserId>,
    ) -> Result<Vec<Comment>, RepositoryError> {
        let rows: Vec<CommentRow> = sqlx::query_as(&format!(
            r"
            SELECT {COMMENT_COLUMNS}
            FROM comments c
            JOIN blogs b ON b.id = c.blog_id
            WHERE NOT c.approved AND ($1::BIGINT IS NULL OR b.author_id = $1)
            ORDER BY c.created_at, c.id
            "
        ))
        .bind(blog_author)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blog_filter_sql() {
        let search = BlogSearch {
            query: Some("Echeveria".to_owned()),
            tags: Some("care, indoor".to_owned()),
            published_only: true,
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM blogs");
        push_blog_filter(&mut qb, &search);
        let sql = qb.sql();
        assert!(sql.contains("AND published"));
        assert!(sql.contains("LOWER(title) LIKE $1"));
        assert!(sql.contains("tags && $3"));
    }

    #[test]
    fn test_blog_filter_without_criteria() {
        let search = BlogSearch {
            published_only: false,
            ..BlogSearch::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM blogs");
        push_blog_filter(&mut qb, &search);
        assert_eq!(qb.sql(), "SELECT COUNT(*) FROM blogs WHERE TRUE");
    }
}
