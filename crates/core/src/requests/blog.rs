//! Blog post and comment bodies.

use serde::{Deserialize, Serialize};

use crate::types::{BlogId, CommentId};
use crate::validation::{ValidationError, Violations, char_len};

pub const MAX_TAGS: usize = 10;
pub const MAX_TAG_LENGTH: usize = 50;
pub const MAX_COMMENT_LENGTH: usize = 1000;

/// Whether `slug` only uses lowercase ASCII letters, digits and hyphens.
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlogRequest {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub slug: Option<String>,
    pub tags: Vec<String>,
    pub published: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogDraft {
    pub title: String,
    pub summary: String,
    pub excerpt: String,
    pub content: String,
    pub slug: String,
    pub tags: Vec<String>,
    pub published: bool,
}

impl BlogRequest {
    /// # Errors
    ///
    /// Returns every violation found.
    pub fn validate(&self) -> Result<BlogDraft, ValidationError> {
        let mut v = Violations::new();

        let title = v.require_text(self.title.as_deref(), "Title");
        if let Some(title) = title {
            v.check(
                !(2..=100).contains(&char_len(title)),
                "Title must be between 2 and 100 characters",
            );
        }
        let summary = v.require_text(self.summary.as_deref(), "Summary");
        if let Some(summary) = summary {
            v.check(char_len(summary) > 200, "Summary must not exceed 200 characters");
        }
        let excerpt = v.require_text(self.excerpt.as_deref(), "Excerpt");
        if let Some(excerpt) = excerpt {
            v.check(char_len(excerpt) > 500, "Excerpt must not exceed 500 characters");
        }
        let content = v.require_text(self.content.as_deref(), "Content");
        if let Some(content) = content {
            v.check(
                char_len(content) < 10,
                "Content must be at least 10 characters long",
            );
        }

        v.check(self.tags.len() > MAX_TAGS, format!("Maximum {MAX_TAGS} tags allowed"));
        for tag in &self.tags {
            let tag = tag.trim();
            if tag.is_empty() {
                v.push("Tags cannot be empty");
            } else if char_len(tag) > MAX_TAG_LENGTH {
                v.push(format!("Tag length cannot exceed {MAX_TAG_LENGTH} characters"));
            }
        }

        let slug = v.require_text(self.slug.as_deref(), "Slug");
        if let Some(slug) = slug {
            v.check(
                !is_valid_slug(slug),
                "Slug must contain only lowercase letters, numbers, and hyphens",
            );
        }
        v.finish()?;

        let (Some(title), Some(summary), Some(excerpt), Some(content), Some(slug)) =
            (title, summary, excerpt, content, slug)
        else {
            return Err(ValidationError::single("Invalid blog data"));
        };
        Ok(BlogDraft {
            title: title.to_owned(),
            summary: summary.to_owned(),
            excerpt: excerpt.to_owned(),
            content: content.to_owned(),
            slug: slug.to_owned(),
            tags: self.tags.iter().map(|t| t.trim().to_owned()).collect(),
            published: self.published,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentRequest {
    pub content: Option<String>,
    pub blog_id: Option<BlogId>,
    pub parent_comment_id: Option<CommentId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentDraft {
    pub content: String,
    pub blog_id: BlogId,
    pub parent_id: Option<CommentId>,
}

impl CommentRequest {
    /// # Errors
    ///
    /// Returns every violation found.
    pub fn validate(&self) -> Result<CommentDraft, ValidationError> {
        let mut v = Violations::new();
        let content = match self.content.as_deref().map(str::trim) {
            Some(c) if !c.is_empty() => {
                v.check(
                    char_len(c) > MAX_COMMENT_LENGTH,
                    format!("Comment must be between 1 and {MAX_COMMENT_LENGTH} characters"),
                );
                Some(c)
            }
            _ => {
                v.push("Comment content cannot be empty");
                None
            }
        };
        v.check(self.blog_id.is_none(), "Blog ID is required");
        v.check(
            self.parent_comment_id.is_some_and(|id| id.as_i64() <= 0),
            "Invalid parent comment ID",
        );
        v.finish()?;

        let (Some(content), Some(blog_id)) = (content, self.blog_id) else {
            return Err(ValidationError::single("Invalid comment data"));
        };
        Ok(CommentDraft {
            content: content.to_owned(),
            blog_id,
            parent_id: self.parent_comment_id,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn blog() -> BlogRequest {
        BlogRequest {
            title: Some("Watering succulents".to_owned()),
            summary: Some("Less is more".to_owned()),
            excerpt: Some("How often should you water?".to_owned()),
            content: Some("Water deeply, then let the soil dry out.".to_owned()),
            slug: Some("watering-succulents-101".to_owned()),
            tags: vec!["care".to_owned(), " water ".to_owned()],
            published: false,
        }
    }

    #[test]
    fn test_slug_rule() {
        assert!(is_valid_slug("abc-123"));
        assert!(!is_valid_slug("Abc"));
        assert!(!is_valid_slug("with space"));
        assert!(!is_valid_slug("under_score"));
        assert!(!is_valid_slug(""));
    }

    #[test]
    fn test_valid_blog_trims_tags() {
        let draft = blog().validate().unwrap();
        assert_eq!(draft.tags, ["care", "water"]);
    }

    #[test]
    fn test_blog_violations() {
        let mut request = blog();
        request.slug = Some("Bad Slug".to_owned());
        request.content = Some("short".to_owned());
        request.tags = vec![String::new(); 11];
        let err = request.validate().unwrap_err();
        assert_eq!(err.violations[0], "Content must be at least 10 characters long");
        assert_eq!(err.violations[1], "Maximum 10 tags allowed");
        assert_eq!(
            err.violations.last().map(String::as_str),
            Some("Slug must contain only lowercase letters, numbers, and hyphens")
        );
        assert_eq!(
            err.violations.iter().filter(|m| *m == "Tags cannot be empty").count(),
            11
        );
    }

    #[test]
    fn test_comment_rules() {
        let ok = CommentRequest {
            content: Some("Lovely post".to_owned()),
            blog_id: Some(BlogId::new(1)),
            parent_comment_id: None,
        };
        assert_eq!(ok.validate().unwrap().content, "Lovely post");

        let bad = CommentRequest {
            content: Some("x".repeat(1001)),
            blog_id: None,
            parent_comment_id: Some(CommentId::new(0)),
        };
        assert_eq!(
            bad.validate().unwrap_err().violations,
            [
                "Comment must be between 1 and 1000 characters",
                "Blog ID is required",
                "Invalid parent comment ID"
            ]
        );
    }
}
