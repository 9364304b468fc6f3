//! Rating repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use succulent_shop_core::pagination::PageSpec;
use succulent_shop_core::requests::RatingDraft;
use succulent_shop_core::{Page, ProductId, RatingId, UserId};

use super::{PgStore, RepositoryError, count_to_u64, map_constraint};
use crate::models::Rating;

pub const SORT_FIELDS: &[(&str, &str)] = &[
    ("id", "id"),
    ("score", "score"),
    ("rating", "score"),
    ("createdAt", "created_at"),
];

#[async_trait]
pub trait RatingRepository: Send + Sync {
    async fn get(&self, id: RatingId) -> Result<Option<Rating>, RepositoryError>;
    async fn insert(&self, draft: &RatingDraft) -> Result<Rating, RepositoryError>;
    async fn list_by_product(
        &self,
        product_id: ProductId,
        page: &PageSpec,
    ) -> Result<Page<Rating>, RepositoryError>;
    async fn delete(&self, id: RatingId) -> Result<bool, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct RatingRow {
    id: RatingId,
    user_id: UserId,
    product_id: ProductId,
    score: i32,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<RatingRow> for Rating {
    fn from(row: RatingRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            score: row.score,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}

const RATING_COLUMNS: &str = "id, user_id, product_id, score, comment, created_at";

#[async_trait]
impl RatingRepository for PgStore {
    async fn get(&self, id: RatingId) -> Result<Option<Rating>, RepositoryError> {
        let row: Option<RatingRow> =
            sqlx::query_as(&format!("SELECT {RATING_COLUMNS} FROM ratings WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool())
                .await?;
        Ok(row.map(Rating::from))
    }

    async fn insert(&self, draft: &RatingDraft) -> Result<Rating, RepositoryError> {
        let row: RatingRow = sqlx::query_as(&format!(
            "INSERT INTO ratings (user_id, product_id, score, comment) VALUES ($1, $2, $3, $4) \
             RETURNING {RATING_COLUMNS}"
        ))
        .bind(draft.user_id)
        .bind(draft.product_id)
        .bind(draft.score)
        .bind(&draft.comment)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_constraint(e, "rating references a missing user or product"))?;
        Ok(row.into())
    }

    async fn list_by_product(
        &self,
        product_id: ProductId,
        page: &PageSpec,
    ) -> Result<Page<Rating>, RepositoryError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ratings WHERE product_id = $1")
            .bind(product_id)
            .fetch_one(self.pool())
            .await?;
        let rows: Vec<RatingRow> = sqlx::query_as(&format!(
            "SELECT {RATING_COLUMNS} FROM ratings WHERE product_id = $1 \
             ORDER BY {} {}, id ASC LIMIT $2 OFFSET $3",
            page.sort_column,
            page.direction.as_sql()
        ))
        .bind(product_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool())
        .await?;
        Ok(Page::new(
            rows.into_iter().map(Rating::from).collect(),
            page,
            count_to_u64(total),
        ))
    }

    async fn delete(&self, id: RatingId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM ratings WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
