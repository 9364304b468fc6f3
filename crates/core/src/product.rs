//! Products and their field rules.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pricing;
use crate::types::{PlantId, PotSize, PotType, ProductId, ProductType, ToolType};
use crate::validation::Violations;

/// A sellable product.
///
/// `base_price` is the undiscounted price. Use [`Product::display_price`] for
/// anything a customer sees or pays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub product_type: ProductType,
    pub plant_id: Option<PlantId>,
    pub is_pot: bool,
    pub pot_size: Option<PotSize>,
    pub pot_type: Option<PotType>,
    pub pot_number: i32,
    pub tool_type: Option<ToolType>,
    pub base_price: Decimal,
    pub quantity: i32,
    pub active: bool,
    pub on_sale: bool,
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Price after any sale discount.
    #[must_use]
    pub fn display_price(&self) -> Decimal {
        pricing::display_price(self.base_price, self.on_sale)
    }
}

/// Validated product fields, ready to insert or apply to an existing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub product_type: ProductType,
    pub plant_id: Option<PlantId>,
    pub is_pot: bool,
    pub pot_size: Option<PotSize>,
    pub pot_type: Option<PotType>,
    pub pot_number: i32,
    pub tool_type: Option<ToolType>,
    pub base_price: Decimal,
    pub quantity: i32,
    pub active: bool,
}

/// Record violations of the type-specific rules.
///
/// - `PLANT`, `SAPLING` and `ARRANGEMENT` need a plant.
/// - `TOOL` needs a tool type and must not reference a plant.
/// - `DECOR` must not reference a plant.
pub fn check_type_rules(
    product_type: ProductType,
    plant_id: Option<PlantId>,
    has_tool_type: bool,
    violations: &mut Violations,
) {
    match product_type {
        ProductType::Plant | ProductType::Sapling | ProductType::Arrangement => {
            violations.check(
                plant_id.is_none(),
                format!(
                    "Plant ID is required for {} products",
                    product_type.as_str().to_lowercase()
                ),
            );
        }
        ProductType::Tool => {
            violations.check(!has_tool_type, "Tool type is required for tool products");
            violations.check(
                plant_id.is_some(),
                "Plant ID should not be provided for tool products",
            );
        }
        ProductType::Decor => {
            violations.check(
                plant_id.is_some(),
                "Plant ID should not be provided for decor products",
            );
        }
    }
}

/// Record violations of the pot rules. Only applies when `is_pot`.
pub fn check_pot_rules(
    is_pot: bool,
    has_size: bool,
    has_type: bool,
    pot_number: i32,
    violations: &mut Violations,
) {
    if !is_pot {
        return;
    }
    violations.check(!has_size, "Pot size must be specified for pot products");
    violations.check(!has_type, "Pot type must be specified for pot products");
    violations.check(
        pot_number <= 0,
        "Pot number must be greater than 0 for pot products",
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn type_violations(
        product_type: ProductType,
        plant: Option<i64>,
        tool: bool,
    ) -> Vec<String> {
        let mut v = Violations::new();
        check_type_rules(product_type, plant.map(PlantId::new), tool, &mut v);
        v.finish().err().map(|e| e.violations).unwrap_or_default()
    }

    #[test]
    fn test_living_products_need_plant() {
        assert_eq!(
            type_violations(ProductType::Sapling, None, false),
            ["Plant ID is required for sapling products"]
        );
        assert!(type_violations(ProductType::Arrangement, Some(3), false).is_empty());
    }

    #[test]
    fn test_tool_rules() {
        assert_eq!(
            type_violations(ProductType::Tool, Some(1), false),
            [
                "Tool type is required for tool products",
                "Plant ID should not be provided for tool products"
            ]
        );
        assert!(type_violations(ProductType::Tool, None, true).is_empty());
    }

    #[test]
    fn test_decor_forbids_plant() {
        assert_eq!(
            type_violations(ProductType::Decor, Some(1), false),
            ["Plant ID should not be provided for decor products"]
        );
        assert!(type_violations(ProductType::Decor, None, false).is_empty());
    }

    #[test]
    fn test_pot_rules_only_apply_to_pots() {
        let mut v = Violations::new();
        check_pot_rules(false, false, false, 0, &mut v);
        assert!(v.is_empty());

        check_pot_rules(true, false, true, 0, &mut v);
        assert_eq!(
            v.finish().unwrap_err().violations,
            [
                "Pot size must be specified for pot products",
                "Pot number must be greater than 0 for pot products"
            ]
        );
    }

    #[test]
    fn test_display_price_follows_sale_flag() {
        let now = Utc::now();
        let mut product = Product {
            id: ProductId::new(1),
            name: "Echeveria".to_owned(),
            description: "Rosette".to_owned(),
            product_type: ProductType::Plant,
            plant_id: Some(PlantId::new(1)),
            is_pot: false,
            pot_size: None,
            pot_type: None,
            pot_number: 0,
            tool_type: None,
            base_price: "25.00".parse().unwrap(),
            quantity: 3,
            active: true,
            on_sale: false,
            photo: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(product.display_price().to_string(), "25.00");
        product.on_sale = true;
        assert_eq!(product.display_price().to_string(), "20.00");
        product.on_sale = false;
        assert_eq!(product.display_price().to_string(), "25.00");
        assert_eq!(product.base_price.to_string(), "25.00");
    }
}
