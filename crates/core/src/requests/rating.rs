//! Product rating body.

use serde::{Deserialize, Serialize};

use crate::types::{ProductId, UserId};
use crate::validation::{ValidationError, Violations, char_len};

pub const MIN_SCORE: i32 = 1;
pub const MAX_SCORE: i32 = 5;
pub const MAX_COMMENT_LENGTH: usize = 500;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RatingRequest {
    pub user_id: Option<UserId>,
    pub product_id: Option<ProductId>,
    #[serde(alias = "rating")]
    pub score: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingDraft {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub score: i32,
    pub comment: Option<String>,
}

impl RatingRequest {
    /// # Errors
    ///
    /// Returns every violation found.
    pub fn validate(&self) -> Result<RatingDraft, ValidationError> {
        let mut v = Violations::new();
        let comment = self
            .comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        v.check(
            comment.is_some_and(|c| char_len(c) > MAX_COMMENT_LENGTH),
            format!("Comment cannot exceed {MAX_COMMENT_LENGTH} characters"),
        );
        v.check(
            !(MIN_SCORE..=MAX_SCORE).contains(&self.score),
            format!(
                "Invalid rating score: {}. Score must be between {MIN_SCORE} and {MAX_SCORE} stars",
                self.score
            ),
        );
        v.check(self.user_id.is_none(), "User cannot be null");
        v.check(self.product_id.is_none(), "Product cannot be null");
        v.finish()?;

        let (Some(user_id), Some(product_id)) = (self.user_id, self.product_id) else {
            return Err(ValidationError::single("Invalid rating data"));
        };
        Ok(RatingDraft {
            user_id,
            product_id,
            score: self.score,
            comment: comment.map(str::to_owned),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_score_bounds() {
        for score in [1, 5] {
            let request = RatingRequest {
                user_id: Some(UserId::new(1)),
                product_id: Some(ProductId::new(1)),
                score,
                comment: None,
            };
            assert!(request.validate().is_ok());
        }
        let request = RatingRequest {
            user_id: Some(UserId::new(1)),
            product_id: Some(ProductId::new(1)),
            score: 6,
            comment: Some("c".repeat(501)),
        };
        assert_eq!(
            request.validate().unwrap_err().violations,
            [
                "Comment cannot exceed 500 characters",
                "Invalid rating score: 6. Score must be between 1 and 5 stars"
            ]
        );
    }

    #[test]
    fn test_missing_references() {
        let request = RatingRequest {
            score: 3,
            ..RatingRequest::default()
        };
        assert_eq!(
            request.validate().unwrap_err().violations,
            ["User cannot be null", "Product cannot be null"]
        );
    }
}
