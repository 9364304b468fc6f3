//! Account administration.

use succulent_shop_core::requests::UserRequest;
use succulent_shop_core::{Email, Page, PageRequest, UserId, ValidationError};

use crate::db::{Repositories, users::SORT_FIELDS};
use crate::error::{AppError, Result};
use crate::models::User;
use crate::services::auth::hash_password;

pub struct UserService<'a> {
    repos: &'a Repositories,
}

impl<'a> UserService<'a> {
    #[must_use]
    pub const fn new(repos: &'a Repositories) -> Self {
        Self { repos }
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub async fn get(&self, id: UserId) -> Result<User> {
        self.repos
            .users
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found with id: {id}")))
    }

    /// # Errors
    ///
    /// Returns a validation error for a malformed address, `NotFound` otherwise.
    pub async fn get_by_email(&self, raw: &str) -> Result<User> {
        let email = Email::parse(raw).map_err(|e| ValidationError::single(e.to_string()))?;
        self.repos
            .users
            .get_by_email(&email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found with email: {email}")))
    }

    /// # Errors
    ///
    /// Returns validation errors for bad paging.
    pub async fn list(&self, page: &PageRequest) -> Result<Page<User>> {
        let spec = page.resolve(SORT_FIELDS)?;
        Ok(self.repos.users.list(&spec).await?)
    }

    async fn ensure_email_free(&self, email: &Email, owner: Option<UserId>) -> Result<()> {
        match self.repos.users.get_by_email(email).await? {
            Some(existing) if Some(existing.id) != owner => Err(AppError::Conflict(format!(
                "User with email {email} already exists"
            ))),
            _ => Ok(()),
        }
    }

    /// # Errors
    ///
    /// Returns validation errors, or `Conflict` when the email is taken.
    #[tracing::instrument(skip_all)]
    pub async fn create(&self, request: &UserRequest) -> Result<User> {
        let draft = request.validate(true)?;
        self.ensure_email_free(&draft.email, None).await?;
        let hash = hash_password(draft.password.as_deref().unwrap_or_default())?;
        let user = self.repos.users.insert(&draft, &hash).await?;
        tracing::info!(user_id = %user.id, role = %user.role, "User created");
        Ok(user)
    }

    /// A blank password keeps the stored one.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, validation errors, or `Conflict` when the new email
    /// belongs to someone else.
    #[tracing::instrument(skip(self, request))]
    pub async fn update(&self, id: UserId, request: &UserRequest) -> Result<User> {
        self.get(id).await?;
        let draft = request.validate(false)?;
        self.ensure_email_free(&draft.email, Some(id)).await?;
        let hash = draft.password.as_deref().map(hash_password).transpose()?;
        Ok(self.repos.users.update(id, &draft, hash.as_deref()).await?)
    }

    /// # Errors
    ///
    /// Returns `NotFound`, or `Conflict` while orders, ratings, posts or
    /// comments belong to the user.
    pub async fn delete(&self, id: UserId) -> Result<()> {
        if self.repos.users.delete(id).await? {
            tracing::info!(user_id = %id, "User deleted");
            Ok(())
        } else {
            Err(AppError::NotFound(format!("User not found with id: {id}")))
        }
    }
}
