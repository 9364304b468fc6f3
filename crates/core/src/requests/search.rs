//! Search query parameters and the typed filters they parse into.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::product::Product;
use crate::types::{CategoryId, Color, PotSize, PotType, ProductType, ToolType};
use crate::validation::{ValidationError, Violations};

fn search_term(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

/// `GET /products/search` query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductSearch {
    pub search_term: Option<String>,
    pub product_type: Option<String>,
    pub pot_type: Option<String>,
    pub tool_type: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub pot_size: Option<String>,
    pub is_pot: Option<bool>,
    pub active: Option<bool>,
    pub on_sale: Option<bool>,
    pub min_quantity: Option<i32>,
    pub max_quantity: Option<i32>,
}

/// Parsed product filter. Every `None` field matches everything.
///
/// Price bounds apply to the display price, so a product on sale is found by
/// the price customers actually see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Lowercased; matched against name and description.
    pub search_term: Option<String>,
    pub product_type: Option<ProductType>,
    pub pot_type: Option<PotType>,
    pub tool_type: Option<ToolType>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub pot_size: Option<PotSize>,
    pub is_pot: Option<bool>,
    pub active: Option<bool>,
    pub on_sale: Option<bool>,
    pub min_quantity: Option<i32>,
    pub max_quantity: Option<i32>,
}

impl ProductSearch {
    /// # Errors
    ///
    /// Returns unknown enum values and inverted ranges.
    pub fn parse(&self) -> Result<ProductFilter, ValidationError> {
        let mut v = Violations::new();
        let filter = ProductFilter {
            search_term: search_term(self.search_term.as_deref()),
            product_type: v.parse_optional(self.product_type.as_deref(), "Invalid product type value"),
            pot_type: v.parse_optional(self.pot_type.as_deref(), "Invalid pot type value"),
            tool_type: v.parse_optional(self.tool_type.as_deref(), "Invalid tool type value"),
            min_price: self.min_price,
            max_price: self.max_price,
            pot_size: v.parse_optional(self.pot_size.as_deref(), "Invalid pot size value"),
            is_pot: self.is_pot,
            active: self.active,
            on_sale: self.on_sale,
            min_quantity: self.min_quantity,
            max_quantity: self.max_quantity,
        };
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            v.check(min > max, "Minimum price cannot exceed maximum price");
        }
        if let (Some(min), Some(max)) = (self.min_quantity, self.max_quantity) {
            v.check(min > max, "Minimum quantity cannot exceed maximum quantity");
        }
        v.finish()?;
        Ok(filter)
    }
}

impl ProductFilter {
    /// In-process evaluation, equivalent to the SQL the store generates.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let price = product.display_price();
        self.search_term.as_deref().is_none_or(|term| {
            product.name.to_lowercase().contains(term)
                || product.description.to_lowercase().contains(term)
        }) && self.product_type.is_none_or(|t| product.product_type == t)
            && self.pot_type.is_none_or(|t| product.pot_type == Some(t))
            && self.tool_type.is_none_or(|t| product.tool_type == Some(t))
            && self.pot_size.is_none_or(|s| product.pot_size == Some(s))
            && self.min_price.is_none_or(|min| price >= min)
            && self.max_price.is_none_or(|max| price <= max)
            && self.is_pot.is_none_or(|p| product.is_pot == p)
            && self.active.is_none_or(|a| product.active == a)
            && self.on_sale.is_none_or(|s| product.on_sale == s)
            && self.min_quantity.is_none_or(|q| product.quantity >= q)
            && self.max_quantity.is_none_or(|q| product.quantity <= q)
    }
}

/// `GET /plants/search` query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlantSearch {
    pub search_term: Option<String>,
    pub name: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub bloom_color: Option<String>,
    pub category_id: Option<CategoryId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlantFilter {
    /// Lowercased; matched against name and care instructions.
    pub search_term: Option<String>,
    /// Lowercased; matched against the name only.
    pub name: Option<String>,
    pub primary_color: Option<Color>,
    pub secondary_color: Option<Color>,
    pub bloom_color: Option<Color>,
    pub category_id: Option<CategoryId>,
}

impl PlantSearch {
    /// # Errors
    ///
    /// Returns unknown colour values.
    pub fn parse(&self) -> Result<PlantFilter, ValidationError> {
        let mut v = Violations::new();
        let filter = PlantFilter {
            search_term: search_term(self.search_term.as_deref()),
            name: search_term(self.name.as_deref()),
            primary_color: v.parse_optional(self.primary_color.as_deref(), "Invalid primary color"),
            secondary_color: v
                .parse_optional(self.secondary_color.as_deref(), "Invalid secondary color"),
            bloom_color: v.parse_optional(self.bloom_color.as_deref(), "Invalid bloom color"),
            category_id: self.category_id,
        };
        v.finish()?;
        Ok(filter)
    }
}

/// `GET /blogs/search` query.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlogSearch {
    pub query: Option<String>,
    /// Comma separated; a post matches when it carries any of them.
    pub tags: Option<String>,
    pub published_only: bool,
}

impl Default for BlogSearch {
    fn default() -> Self {
        Self {
            query: None,
            tags: None,
            published_only: true,
        }
    }
}

impl BlogSearch {
    /// Lowercased free-text query, if any.
    #[must_use]
    pub fn term(&self) -> Option<String> {
        search_term(self.query.as_deref())
    }

    /// Non-blank tags.
    #[must_use]
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::types::{PlantId, ProductId};

    fn product(base: &str, on_sale: bool) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(1),
            name: "Golden Barrel".to_owned(),
            description: "Round cactus".to_owned(),
            product_type: ProductType::Plant,
            plant_id: Some(PlantId::new(1)),
            is_pot: false,
            pot_size: None,
            pot_type: None,
            pot_number: 0,
            tool_type: None,
            base_price: base.parse().unwrap(),
            quantity: 5,
            active: true,
            on_sale,
            photo: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_price_filter_uses_display_price() {
        let filter = ProductSearch {
            max_price: Some("85.00".parse().unwrap()),
            ..ProductSearch::default()
        }
        .parse()
        .unwrap();
        // base 100.00 on sale shows 80.00
        assert!(filter.matches(&product("100.00", true)));
        assert!(!filter.matches(&product("100.00", false)));
    }

    #[test]
    fn test_term_matches_name_or_description_case_insensitively() {
        let filter = ProductSearch {
            search_term: Some("  CACTUS ".to_owned()),
            ..ProductSearch::default()
        }
        .parse()
        .unwrap();
        assert!(filter.matches(&product("10", false)));

        let filter = ProductSearch {
            search_term: Some("agave".to_owned()),
            ..ProductSearch::default()
        }
        .parse()
        .unwrap();
        assert!(!filter.matches(&product("10", false)));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = ProductSearch {
            product_type: Some("boat".to_owned()),
            min_quantity: Some(5),
            max_quantity: Some(1),
            ..ProductSearch::default()
        }
        .parse()
        .unwrap_err();
        assert_eq!(
            err.violations,
            [
                "Invalid product type value",
                "Minimum quantity cannot exceed maximum quantity"
            ]
        );
    }

    #[test]
    fn test_plant_search_parses_colors() {
        let filter = PlantSearch {
            bloom_color: Some("pink".to_owned()),
            name: Some("Aloe".to_owned()),
            ..PlantSearch::default()
        }
        .parse()
        .unwrap();
        assert_eq!(filter.bloom_color, Some(Color::Pink));
        assert_eq!(filter.name.as_deref(), Some("aloe"));
    }

    #[test]
    fn test_blog_search_tags() {
        let search = BlogSearch {
            tags: Some("care, ,water".to_owned()),
            ..BlogSearch::default()
        };
        assert_eq!(search.tag_list(), ["care", "water"]);
        assert!(search.published_only);
    }
}
