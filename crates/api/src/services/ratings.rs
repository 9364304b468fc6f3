//! Product ratings.

use succulent_shop_core::requests::RatingRequest;
use succulent_shop_core::{Page, PageRequest, ProductId, RatingId};

use crate::db::{Repositories, ratings::SORT_FIELDS};
use crate::error::{AppError, Result};
use crate::models::Rating;
use crate::services::Actor;

pub struct RatingService<'a> {
    repos: &'a Repositories,
}

impl<'a> RatingService<'a> {
    #[must_use]
    pub const fn new(repos: &'a Repositories) -> Self {
        Self { repos }
    }

    /// Rate a product. Customers rate as themselves; admins may rate for anyone.
    ///
    /// # Errors
    ///
    /// Returns validation errors, `Unauthorized` when rating for someone else,
    /// or `NotFound` for an unknown user or product.
    pub async fn create(&self, request: &RatingRequest, actor: Actor) -> Result<Rating> {
        let draft = request.validate()?;
        if draft.user_id != actor.id && !actor.is_admin() {
            return Err(AppError::Unauthorized(
                "You can only rate products as yourself".to_owned(),
            ));
        }
        if self.repos.users.get(draft.user_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "User not found with id: {}",
                draft.user_id
            )));
        }
        self.ensure_product(draft.product_id).await?;

        let rating = self.repos.ratings.insert(&draft).await?;
        tracing::info!(rating_id = %rating.id, product_id = %rating.product_id, score = rating.score, "Rating saved");
        Ok(rating)
    }

    async fn ensure_product(&self, id: ProductId) -> Result<()> {
        if self.repos.products.get(id).await?.is_none() {
            return Err(AppError::NotFound(format!("Product not found with id: {id}")));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown product, or validation errors for bad paging.
    pub async fn list_by_product(&self, product_id: ProductId, page: &PageRequest) -> Result<Page<Rating>> {
        let spec = page.resolve(SORT_FIELDS)?;
        self.ensure_product(product_id).await?;
        Ok(self.repos.ratings.list_by_product(product_id, &spec).await?)
    }

    /// # Errors
    ///
    /// Returns `NotFound`, or `Unauthorized` unless the caller wrote the rating
    /// or is an admin.
    pub async fn delete(&self, id: RatingId, actor: Actor) -> Result<()> {
        let rating = self
            .repos
            .ratings
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Rating not found with id: {id}")))?;
        if rating.user_id != actor.id && !actor.is_admin() {
            return Err(AppError::Unauthorized(
                "You can only delete your own ratings".to_owned(),
            ));
        }
        self.repos.ratings.delete(id).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use succulent_shop_core::{Role, UserId};

    use super::*;
    use crate::services::fixtures::{seed_product, seed_user};

    fn request(user_id: UserId, product_id: ProductId, score: i32) -> RatingRequest {
        RatingRequest {
            user_id: Some(user_id),
            product_id: Some(product_id),
            score,
            comment: Some("Arrived healthy".to_owned()),
        }
    }

    #[tokio::test]
    async fn test_rate_and_list() {
        let repos = Repositories::in_memory();
        let user = seed_user(&repos, "rater@shop.test", Role::User).await;
        let product = seed_product(&repos, "Aloe", "7.00").await;
        let actor = Actor { id: user.id, role: user.role };
        let ratings = RatingService::new(&repos);

        ratings.create(&request(user.id, product.id, 5), actor).await.unwrap();
        ratings.create(&request(user.id, product.id, 3), actor).await.unwrap();

        let page = ratings.list_by_product(product.id, &PageRequest::default()).await.unwrap();
        assert_eq!(page.total_elements, 2);
    }

    #[tokio::test]
    async fn test_score_out_of_range() {
        let repos = Repositories::in_memory();
        let user = seed_user(&repos, "rater@shop.test", Role::User).await;
        let product = seed_product(&repos, "Aloe", "7.00").await;
        let actor = Actor { id: user.id, role: user.role };

        let err = RatingService::new(&repos)
            .create(&request(user.id, product.id, 6), actor)
            .await
            .unwrap_err();
        let AppError::Validation(err) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(
            err.violations,
            ["Invalid rating score: 6. Score must be between 1 and 5 stars"]
        );
    }

    #[tokio::test]
    async fn test_unknown_product_and_foreign_user() {
        let repos = Repositories::in_memory();
        let user = seed_user(&repos, "rater@shop.test", Role::User).await;
        let other = seed_user(&repos, "other@shop.test", Role::User).await;
        let actor = Actor { id: user.id, role: user.role };
        let ratings = RatingService::new(&repos);

        let err = ratings
            .create(&request(user.id, ProductId::new(77), 4), actor)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Product not found with id: 77"));

        let product = seed_product(&repos, "Aloe", "7.00").await;
        let err = ratings
            .create(&request(other.id, product.id, 4), actor)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_only_author_or_admin_deletes() {
        let repos = Repositories::in_memory();
        let user = seed_user(&repos, "rater@shop.test", Role::User).await;
        let stranger = seed_user(&repos, "stranger@shop.test", Role::User).await;
        let admin = seed_user(&repos, "admin@shop.test", Role::Admin).await;
        let product = seed_product(&repos, "Aloe", "7.00").await;
        let ratings = RatingService::new(&repos);

        let rating = ratings
            .create(&request(user.id, product.id, 4), Actor { id: user.id, role: user.role })
            .await
            .unwrap();
        assert!(matches!(
            ratings
                .delete(rating.id, Actor { id: stranger.id, role: stranger.role })
                .await,
            Err(AppError::Unauthorized(_))
        ));
        ratings
            .delete(rating.id, Actor { id: admin.id, role: admin.role })
            .await
            .unwrap();
        assert!(matches!(
            ratings.delete(rating.id, Actor { id: admin.id, role: admin.role }).await,
            Err(AppError::NotFound(_))
        ));
    }
}
