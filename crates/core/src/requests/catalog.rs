//! Category and plant bodies.

use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, Color};
use crate::validation::{ValidationError, Violations, char_len};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryRequest {
    #[serde(alias = "categoryName")]
    pub name: Option<String>,
    #[serde(alias = "categoryDesc")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDraft {
    pub name: String,
    pub description: Option<String>,
}

impl CategoryRequest {
    /// # Errors
    ///
    /// Returns every violation found.
    pub fn validate(&self) -> Result<CategoryDraft, ValidationError> {
        let mut v = Violations::new();
        let name = v.require_text(self.name.as_deref(), "Category name");
        if let Some(name) = name {
            let len = char_len(name);
            v.check(len < 2, "Category name must be at least 2 characters long");
            v.check(len > 100, "Category name cannot exceed 100 characters");
        }
        let description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());
        v.check(
            description.is_some_and(|d| char_len(d) > 500),
            "Category description cannot exceed 500 characters",
        );
        v.finish()?;

        Ok(CategoryDraft {
            name: name.unwrap_or_default().to_owned(),
            description: description.map(str::to_owned),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlantRequest {
    pub name: Option<String>,
    pub category_id: Option<CategoryId>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub bloom_color: Option<String>,
    pub care_instructions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantDraft {
    pub name: String,
    pub category_id: CategoryId,
    pub primary_color: Option<Color>,
    pub secondary_color: Option<Color>,
    pub bloom_color: Option<Color>,
    pub care_instructions: Option<String>,
}

impl PlantRequest {
    /// # Errors
    ///
    /// Returns every violation found.
    pub fn validate(&self) -> Result<PlantDraft, ValidationError> {
        let mut v = Violations::new();
        let name = v.require_text(self.name.as_deref(), "Plant name");
        if let Some(name) = name {
            v.check(
                !(2..=100).contains(&char_len(name)),
                "Plant name must be between 2 and 100 characters",
            );
        }
        v.check(self.category_id.is_none(), "Plant category cannot be empty");
        let primary_color =
            v.parse_optional::<Color>(self.primary_color.as_deref(), "Invalid primary color");
        let secondary_color =
            v.parse_optional::<Color>(self.secondary_color.as_deref(), "Invalid secondary color");
        let bloom_color =
            v.parse_optional::<Color>(self.bloom_color.as_deref(), "Invalid bloom color");
        v.finish()?;

        let (Some(name), Some(category_id)) = (name, self.category_id) else {
            return Err(ValidationError::single("Invalid plant data"));
        };
        Ok(PlantDraft {
            name: name.to_owned(),
            category_id,
            primary_color,
            secondary_color,
            bloom_color,
            care_instructions: self
                .care_instructions
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_owned),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_category_name_length() {
        let short = CategoryRequest {
            name: Some("A".to_owned()),
            description: None,
        };
        assert_eq!(
            short.validate().unwrap_err().violations,
            ["Category name must be at least 2 characters long"]
        );

        let long = CategoryRequest {
            name: Some("x".repeat(101)),
            description: Some("y".repeat(501)),
        };
        assert_eq!(long.validate().unwrap_err().violations.len(), 2);
    }

    #[test]
    fn test_category_accepts_legacy_field_names() {
        let request: CategoryRequest =
            serde_json::from_str(r#"{"categoryName":"Cacti","categoryDesc":"Spiky"}"#).unwrap();
        let draft = request.validate().unwrap();
        assert_eq!(draft.name, "Cacti");
        assert_eq!(draft.description.as_deref(), Some("Spiky"));
    }

    #[test]
    fn test_plant_colors_parse() {
        let request = PlantRequest {
            name: Some("Aloe vera".to_owned()),
            category_id: Some(CategoryId::new(2)),
            primary_color: Some("green".to_owned()),
            bloom_color: Some("yellow".to_owned()),
            ..PlantRequest::default()
        };
        let draft = request.validate().unwrap();
        assert_eq!(draft.primary_color, Some(Color::Green));
        assert_eq!(draft.secondary_color, None);
        assert_eq!(draft.bloom_color, Some(Color::Yellow));
    }

    #[test]
    fn test_plant_violations() {
        let request = PlantRequest {
            secondary_color: Some("ultraviolet".to_owned()),
            ..PlantRequest::default()
        };
        assert_eq!(
            request.validate().unwrap_err().violations,
            [
                "Plant name cannot be empty",
                "Plant category cannot be empty",
                "Invalid secondary color"
            ]
        );
    }
}
