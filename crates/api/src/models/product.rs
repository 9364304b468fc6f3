//! JSON views of products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use succulent_shop_core::{
    PlantId, PotSize, PotType, Product, ProductId, ProductType, ToolType,
};

/// A product as clients see it.
///
/// `price` is the display price (discounted while on sale); `basePrice` is
/// the stored undiscounted amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: ProductId,
    pub product_name: String,
    pub product_desc: String,
    pub product_type: ProductType,
    pub plant_id: Option<PlantId>,
    pub is_pot: bool,
    pub pot_size: Option<PotSize>,
    pub pot_type: Option<PotType>,
    pub pot_number: i32,
    pub tool_type: Option<ToolType>,
    pub price: Decimal,
    pub base_price: Decimal,
    pub quantity: i32,
    pub active: bool,
    pub on_sale: bool,
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            product_name: product.name.clone(),
            product_desc: product.description.clone(),
            product_type: product.product_type,
            plant_id: product.plant_id,
            is_pot: product.is_pot,
            pot_size: product.pot_size,
            pot_type: product.pot_type,
            pot_number: product.pot_number,
            tool_type: product.tool_type,
            price: product.display_price(),
            base_price: product.base_price,
            quantity: product.quantity,
            active: product.active,
            on_sale: product.on_sale,
            photo: product.photo.clone(),
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self::from(&product)
    }
}

/// Bulk import outcome.
///
/// Returned with `201 Created` when every item was imported and
/// `207 Multi-Status` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkImportResponse {
    pub imported_products: Vec<ProductView>,
    pub message: String,
    pub total_requested: usize,
    pub successful_imports: usize,
    pub errors: Vec<String>,
}

impl BulkImportResponse {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}
