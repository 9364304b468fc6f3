//! Blog posts, comments and comment moderation.

use succulent_shop_core::requests::{BlogRequest, BlogSearch, CommentRequest};
use succulent_shop_core::{BlogId, CommentId, Page, PageRequest};

use crate::db::{Repositories, blogs::SORT_FIELDS};
use crate::error::{AppError, Result};
use crate::models::{Blog, Comment};
use crate::services::Actor;
use crate::services::storage::{FileStorage, PhotoUpload};

fn blog_not_found(id: BlogId) -> AppError {
    AppError::NotFound(format!("Blog not found with id: {id}"))
}

fn comment_not_found(id: CommentId) -> AppError {
    AppError::NotFound(format!("Comment not found with id: {id}"))
}

pub struct BlogService<'a> {
    repos: &'a Repositories,
    storage: &'a FileStorage,
}

impl<'a> BlogService<'a> {
    #[must_use]
    pub const fn new(repos: &'a Repositories, storage: &'a FileStorage) -> Self {
        Self { repos, storage }
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub async fn get(&self, id: BlogId) -> Result<Blog> {
        self.repos.blogs.get(id).await?.ok_or_else(|| blog_not_found(id))
    }

    /// Fetch by slug and count the view.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown slug.
    pub async fn view_by_slug(&self, slug: &str) -> Result<Blog> {
        self.repos
            .blogs
            .increment_views_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Blog not found with slug: {slug}")))
    }

    /// # Errors
    ///
    /// Returns validation errors for bad paging.
    pub async fn list(&self, page: &PageRequest) -> Result<Page<Blog>> {
        let spec = page.resolve(SORT_FIELDS)?;
        Ok(self.repos.blogs.list(&spec).await?)
    }

    /// # Errors
    ///
    /// Returns validation errors for bad paging.
    pub async fn search(&self, search: &BlogSearch, page: &PageRequest) -> Result<Page<Blog>> {
        let spec = page.resolve(SORT_FIELDS)?;
        Ok(self.repos.blogs.search(search, &spec).await?)
    }

    fn ensure_can_edit(blog: &Blog, actor: Actor) -> Result<()> {
        if blog.author_id == actor.id || actor.is_admin() {
            Ok(())
        } else {
            Err(AppError::Unauthorized(
                "You can only edit your own blog posts".to_owned(),
            ))
        }
    }

    /// # Errors
    ///
    /// Returns validation errors, `Conflict` for a taken slug, or photo errors.
    #[tracing::instrument(skip(self, request, photo))]
    pub async fn create(
        &self,
        request: &BlogRequest,
        photo: Option<&PhotoUpload>,
        actor: Actor,
    ) -> Result<Blog> {
        let draft = request.validate()?;
        let stored = self.storage.store_optional(photo).await?;
        match self.repos.blogs.insert(&draft, actor.id, stored.as_deref()).await {
            Ok(blog) => {
                tracing::info!(blog_id = %blog.id, slug = %blog.slug, "Blog post created");
                Ok(blog)
            }
            Err(e) => {
                self.storage.discard(stored.as_deref()).await;
                Err(e.into())
            }
        }
    }

    /// # Errors
    ///
    /// Returns `NotFound`, `Unauthorized` for someone else's post, validation
    /// errors, `Conflict` for a taken slug, or photo errors.
    #[tracing::instrument(skip(self, request, photo))]
    pub async fn update(
        &self,
        id: BlogId,
        request: &BlogRequest,
        photo: Option<&PhotoUpload>,
        actor: Actor,
    ) -> Result<Blog> {
        let current = self.get(id).await?;
        Self::ensure_can_edit(&current, actor)?;
        let draft = request.validate()?;

        let stored = self.storage.store_optional(photo).await?;
        let blog = match self.repos.blogs.update(id, &draft, stored.as_deref()).await {
            Ok(blog) => blog,
            Err(e) => {
                self.storage.discard(stored.as_deref()).await;
                return Err(e.into());
            }
        };
        if stored.is_some() {
            self.storage.discard(current.photo.as_deref()).await;
        }
        Ok(blog)
    }

    /// # Errors
    ///
    /// Returns `NotFound` or `Unauthorized`.
    pub async fn set_published(&self, id: BlogId, published: bool, actor: Actor) -> Result<Blog> {
        let blog = self.get(id).await?;
        Self::ensure_can_edit(&blog, actor)?;
        let blog = self.repos.blogs.set_published(id, published).await?;
        tracing::info!(blog_id = %id, published, "Blog publish status changed");
        Ok(blog)
    }

    /// Delete a post together with its comments.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `Unauthorized`.
    pub async fn delete(&self, id: BlogId, actor: Actor) -> Result<()> {
        let blog = self.get(id).await?;
        if blog.author_id != actor.id && !actor.is_admin() {
            return Err(AppError::Unauthorized(
                "You can only delete your own blog posts".to_owned(),
            ));
        }
        if !self.repos.blogs.delete(id).await? {
            return Err(blog_not_found(id));
        }
        self.storage.discard(blog.photo.as_deref()).await;
        tracing::info!(blog_id = %id, "Blog post deleted");
        Ok(())
    }
}

pub struct CommentService<'a> {
    repos: &'a Repositories,
}

impl<'a> CommentService<'a> {
    #[must_use]
    pub const fn new(repos: &'a Repositories) -> Self {
        Self { repos }
    }

    async fn blog(&self, id: BlogId) -> Result<Blog> {
        self.repos.blogs.get(id).await?.ok_or_else(|| blog_not_found(id))
    }

    async fn comment(&self, id: CommentId) -> Result<Comment> {
        self.repos
            .comments
            .get(id)
            .await?
            .ok_or_else(|| comment_not_found(id))
    }

    /// Comments on a post, oldest first.
    ///
    /// Pending comments are shown only to their author, the post's author and
    /// admins.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown post.
    pub async fn list_by_blog(&self, blog_id: BlogId, viewer: Option<Actor>) -> Result<Vec<Comment>> {
        let blog = self.blog(blog_id).await?;
        let moderator = viewer.is_some_and(|v| v.is_admin() || v.id == blog.author_id);
        let mut comments = self.repos.comments.list_by_blog(blog_id).await?;
        if !moderator {
            comments.retain(|c| c.approved || viewer.is_some_and(|v| v.id == c.author_id));
        }
        Ok(comments)
    }

    /// Post a comment. The post's author and admins skip moderation.
    ///
    /// # Errors
    ///
    /// Returns validation errors, `NotFound` for an unknown post or parent, or
    /// `InvalidData` when the parent belongs to another post.
    #[tracing::instrument(skip(self, request))]
    pub async fn create(&self, request: &CommentRequest, actor: Actor) -> Result<Comment> {
        let draft = request.validate()?;
        let blog = self.blog(draft.blog_id).await?;
        if let Some(parent_id) = draft.parent_id {
            let parent = self.comment(parent_id).await?;
            if parent.blog_id != draft.blog_id {
                return Err(AppError::InvalidData(
                    "Parent comment belongs to a different blog".to_owned(),
                ));
            }
        }

        let approved = blog.author_id == actor.id || actor.is_admin();
        let comment = self.repos.comments.insert(&draft, actor.id, approved).await?;
        tracing::info!(comment_id = %comment.id, blog_id = %blog.id, approved, "Comment created");
        Ok(comment)
    }

    /// Reply to `parent_id`; the post is taken from the parent.
    ///
    /// # Errors
    ///
    /// Same as [`CommentService::create`].
    pub async fn reply(
        &self,
        parent_id: CommentId,
        request: &CommentRequest,
        actor: Actor,
    ) -> Result<Comment> {
        let parent = self.comment(parent_id).await?;
        let request = CommentRequest {
            content: request.content.clone(),
            blog_id: Some(parent.blog_id),
            parent_comment_id: Some(parent_id),
        };
        self.create(&request, actor).await
    }

    /// # Errors
    ///
    /// Returns `NotFound`, validation errors, or `Unauthorized` for someone
    /// else's comment.
    pub async fn update(&self, id: CommentId, request: &CommentRequest, actor: Actor) -> Result<Comment> {
        let comment = self.comment(id).await?;
        if comment.author_id != actor.id {
            return Err(AppError::Unauthorized(
                "You can only edit your own comments".to_owned(),
            ));
        }
        // Only the content changes; the post and parent stay as they were.
        let request = CommentRequest {
            content: request.content.clone(),
            blog_id: Some(comment.blog_id),
            parent_comment_id: comment.parent_id,
        };
        let draft = request.validate()?;
        Ok(self.repos.comments.update_content(id, &draft.content).await?)
    }

    /// # Errors
    ///
    /// Returns `NotFound`, or `Unauthorized` unless the caller is an admin or
    /// wrote the post.
    pub async fn approve(&self, id: CommentId, actor: Actor) -> Result<Comment> {
        let comment = self.comment(id).await?;
        let blog = self.blog(comment.blog_id).await?;
        if blog.author_id != actor.id && !actor.is_admin() {
            return Err(AppError::Unauthorized(
                "Only the blog author or an admin can approve comments".to_owned(),
            ));
        }
        Ok(self.repos.comments.approve(id).await?)
    }

    /// Replies are removed with their parent.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, or `Unauthorized` unless the caller wrote the
    /// comment, wrote the post, or is an admin.
    pub async fn delete(&self, id: CommentId, actor: Actor) -> Result<()> {
        let comment = self.comment(id).await?;
        let blog_author = self.blog(comment.blog_id).await?.author_id;
        if comment.author_id != actor.id && blog_author != actor.id && !actor.is_admin() {
            return Err(AppError::Unauthorized(
                "You don't have permission to delete this comment".to_owned(),
            ));
        }
        if !self.repos.comments.delete(id).await? {
            return Err(comment_not_found(id));
        }
        Ok(())
    }

    /// Admins see every pending comment, others only those on their own posts.
    ///
    /// # Errors
    ///
    /// Returns repository errors.
    pub async fn pending(&self, actor: Actor) -> Result<Vec<Comment>> {
        let scope = if actor.is_admin() { None } else { Some(actor.id) };
        Ok(self.repos.comments.list_pending(scope).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use succulent_shop_core::Role;

    use super::*;
    use crate::models::User;
    use crate::services::fixtures::seed_user;

    fn actor(user: &User) -> Actor {
        Actor {
            id: user.id,
            role: user.role,
        }
    }

    fn post(slug: &str) -> BlogRequest {
        BlogRequest {
            title: Some("Repotting haworthias".to_owned()),
            summary: Some("When and how".to_owned()),
            excerpt: Some("Spring is best".to_owned()),
            content: Some("Use gritty soil and a pot with drainage.".to_owned()),
            slug: Some(slug.to_owned()),
            tags: vec!["care".to_owned(), "soil".to_owned()],
            published: true,
        }
    }

    fn comment(blog_id: BlogId, content: &str) -> CommentRequest {
        CommentRequest {
            content: Some(content.to_owned()),
            blog_id: Some(blog_id),
            parent_comment_id: None,
        }
    }

    struct World {
        repos: Repositories,
        storage: FileStorage,
        _dir: tempfile::TempDir,
        author: User,
        reader: User,
        admin: User,
    }

    async fn world() -> World {
        let dir = tempfile::tempdir().unwrap();
        let repos = Repositories::in_memory();
        let author = seed_user(&repos, "author@shop.test", Role::Employee).await;
        let reader = seed_user(&repos, "reader@shop.test", Role::User).await;
        let admin = seed_user(&repos, "admin@shop.test", Role::Admin).await;
        World {
            storage: FileStorage::new(dir.path()),
            repos,
            _dir: dir,
            author,
            reader,
            admin,
        }
    }

    #[tokio::test]
    async fn test_only_author_or_admin_edits() {
        let w = world().await;
        let blogs = BlogService::new(&w.repos, &w.storage);
        let blog = blogs.create(&post("repotting"), None, actor(&w.author)).await.unwrap();

        let err = blogs
            .set_published(blog.id, false, actor(&w.reader))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(msg) if msg == "You can only edit your own blog posts"));

        let hidden = blogs.set_published(blog.id, false, actor(&w.admin)).await.unwrap();
        assert!(!hidden.published);

        let mut changed = post("repotting");
        changed.title = Some("Repotting in spring".to_owned());
        let updated = blogs.update(blog.id, &changed, None, actor(&w.author)).await.unwrap();
        assert_eq!(updated.author_id, w.author.id);
        assert_eq!(updated.title, "Repotting in spring");
    }

    #[tokio::test]
    async fn test_slug_view_counts_and_conflicts() {
        let w = world().await;
        let blogs = BlogService::new(&w.repos, &w.storage);
        blogs.create(&post("repotting"), None, actor(&w.author)).await.unwrap();

        blogs.view_by_slug("repotting").await.unwrap();
        let second = blogs.view_by_slug("repotting").await.unwrap();
        assert_eq!(second.view_count, 2);
        assert!(matches!(blogs.view_by_slug("missing").await, Err(AppError::NotFound(_))));

        let err = blogs
            .create(&post("repotting"), None, actor(&w.admin))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_comment_moderation() {
        let w = world().await;
        let blog = BlogService::new(&w.repos, &w.storage)
            .create(&post("repotting"), None, actor(&w.author))
            .await
            .unwrap();
        let comments = CommentService::new(&w.repos);

        let by_reader = comments
            .create(&comment(blog.id, "Which soil mix?"), actor(&w.reader))
            .await
            .unwrap();
        assert!(!by_reader.approved);
        let by_author = comments
            .reply(by_reader.id, &comment(blog.id, "Pumice and grit"), actor(&w.author))
            .await
            .unwrap();
        assert!(by_author.approved);
        assert_eq!(by_author.parent_id, Some(by_reader.id));

        let pending = comments.pending(actor(&w.author)).await.unwrap();
        assert_eq!(pending.iter().map(|c| c.id).collect::<Vec<_>>(), [by_reader.id]);
        assert!(comments.pending(actor(&w.reader)).await.unwrap().is_empty());

        assert!(matches!(
            comments.approve(by_reader.id, actor(&w.reader)).await,
            Err(AppError::Unauthorized(_))
        ));
        let approved = comments.approve(by_reader.id, actor(&w.author)).await.unwrap();
        assert!(approved.approved);
    }

    #[tokio::test]
    async fn test_pending_comments_hidden_from_public() {
        let w = world().await;
        let blog = BlogService::new(&w.repos, &w.storage)
            .create(&post("repotting"), None, actor(&w.author))
            .await
            .unwrap();
        let comments = CommentService::new(&w.repos);
        comments
            .create(&comment(blog.id, "Awaiting review"), actor(&w.reader))
            .await
            .unwrap();

        assert!(comments.list_by_blog(blog.id, None).await.unwrap().is_empty());
        assert_eq!(comments.list_by_blog(blog.id, Some(actor(&w.reader))).await.unwrap().len(), 1);
        assert_eq!(comments.list_by_blog(blog.id, Some(actor(&w.author))).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_comment_edit_and_delete_permissions() {
        let w = world().await;
        let blog = BlogService::new(&w.repos, &w.storage)
            .create(&post("repotting"), None, actor(&w.author))
            .await
            .unwrap();
        let comments = CommentService::new(&w.repos);
        let own = comments
            .create(&comment(blog.id, "Lovely post"), actor(&w.reader))
            .await
            .unwrap();

        let err = comments
            .update(own.id, &comment(blog.id, "Edited by someone else"), actor(&w.author))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(msg) if msg == "You can only edit your own comments"));

        let edited = comments
            .update(own.id, &comment(blog.id, "Lovely post, thanks"), actor(&w.reader))
            .await
            .unwrap();
        assert_eq!(edited.content, "Lovely post, thanks");

        let stranger = seed_user(&w.repos, "stranger@shop.test", Role::User).await;
        let err = comments.delete(own.id, actor(&stranger)).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(msg) if msg == "You don't have permission to delete this comment"));

        comments.delete(own.id, actor(&w.author)).await.unwrap();
        assert!(comments.list_by_blog(blog.id, Some(actor(&w.admin))).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reply_parent_must_share_blog() {
        let w = world().await;
        let blogs = BlogService::new(&w.repos, &w.storage);
        let first = blogs.create(&post("first"), None, actor(&w.author)).await.unwrap();
        let second = blogs.create(&post("second"), None, actor(&w.author)).await.unwrap();
        let comments = CommentService::new(&w.repos);
        let parent = comments
            .create(&comment(first.id, "On the first post"), actor(&w.reader))
            .await
            .unwrap();

        let request = CommentRequest {
            content: Some("Misplaced reply".to_owned()),
            blog_id: Some(second.id),
            parent_comment_id: Some(parent.id),
        };
        assert!(matches!(
            comments.create(&request, actor(&w.reader)).await,
            Err(AppError::InvalidData(_))
        ));
    }
}
