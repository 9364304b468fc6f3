//! Product create/update body, also used per item by bulk import.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::product::{ProductDraft, check_pot_rules, check_type_rules};
use crate::types::{PlantId, PotSize, PotType, ProductType, ToolType};
use crate::validation::{ValidationError, Violations, char_len};

const PRICE_INTEGER_LIMIT: u32 = 1_000_000;
const PRICE_FRACTION_DIGITS: u32 = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductRequest {
    pub plant_id: Option<PlantId>,
    pub product_name: Option<String>,
    pub product_desc: Option<String>,
    pub product_type: Option<String>,
    #[serde(alias = "pot")]
    pub is_pot: bool,
    pub pot_size: Option<String>,
    pub pot_type: Option<String>,
    pub pot_number: i32,
    pub tool_type: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub active: Option<bool>,
}

impl ProductRequest {
    /// Check every field and build a [`ProductDraft`].
    ///
    /// # Errors
    ///
    /// Returns all violations found, in field order.
    pub fn validate(&self) -> Result<ProductDraft, ValidationError> {
        let mut v = Violations::new();

        let name = v.require_text(self.product_name.as_deref(), "Product name");
        if let Some(name) = name {
            v.check(
                !(2..=100).contains(&char_len(name)),
                "Product name must be between 2 and 100 characters",
            );
        }
        let description = v.require_text(self.product_desc.as_deref(), "Product description");
        if let Some(description) = description {
            v.check(
                char_len(description) > 1000,
                "Product description cannot exceed 1000 characters",
            );
        }
        let quantity = self.quantity.unwrap_or(0);
        v.check(quantity < 0, "Quantity cannot be negative");

        let product_type = match self.product_type.as_deref().map(str::trim) {
            None | Some("") => {
                v.push("Product type cannot be empty");
                None
            }
            Some(raw) => v.parse_optional::<ProductType>(Some(raw), "Invalid product type value"),
        };
        let tool_type = v.parse_optional::<ToolType>(self.tool_type.as_deref(), "Invalid tool type value");
        let pot_size = v.parse_optional::<PotSize>(self.pot_size.as_deref(), "Invalid pot size value");
        let pot_type = v.parse_optional::<PotType>(self.pot_type.as_deref(), "Invalid pot type value");

        if let Some(product_type) = product_type {
            check_type_rules(
                product_type,
                self.plant_id,
                has_text(self.tool_type.as_deref()),
                &mut v,
            );
        }
        check_pot_rules(
            self.is_pot,
            has_text(self.pot_size.as_deref()),
            has_text(self.pot_type.as_deref()),
            self.pot_number,
            &mut v,
        );

        match self.price {
            None => v.push("Price cannot be null"),
            Some(price) => {
                v.check(price <= Decimal::ZERO, "Price must be greater than zero");
                v.check(
                    !fits_price_digits(price),
                    "Price must have at most 6 digits and 2 decimal places",
                );
            }
        }

        v.finish()?;

        // Every `None` below was recorded as a violation above.
        let (Some(name), Some(description), Some(product_type), Some(base_price)) =
            (name, description, product_type, self.price)
        else {
            return Err(ValidationError::single("Invalid product data"));
        };

        Ok(ProductDraft {
            name: name.to_owned(),
            description: description.to_owned(),
            product_type,
            plant_id: self.plant_id,
            is_pot: self.is_pot,
            pot_size: if self.is_pot { pot_size } else { None },
            pot_type: if self.is_pot { pot_type } else { None },
            pot_number: if self.is_pot { self.pot_number } else { 0 },
            tool_type,
            base_price,
            quantity,
            active: self.active.unwrap_or(true),
        })
    }
}

/// At most 6 integer digits and 2 fraction digits, ignoring trailing zeros.
fn fits_price_digits(price: Decimal) -> bool {
    price.normalize().scale() <= PRICE_FRACTION_DIGITS
        && price.trunc().abs() < Decimal::from(PRICE_INTEGER_LIMIT)
}

fn has_text(value: Option<&str>) -> bool {
    value.is_some_and(|s| !s.trim().is_empty())
}
