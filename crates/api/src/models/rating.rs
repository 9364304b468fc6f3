use chrono::{DateTime, Utc};
use serde::Serialize;

use succulent_shop_core::{ProductId, RatingId, UserId};

/// A 1-5 star product rating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: RatingId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub score: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
