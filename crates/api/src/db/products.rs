//! Product repository.
//!
//! Prices are stored undiscounted. Anything that filters or sorts by price
//! goes through [`EFFECTIVE_PRICE_SQL`] so results agree with the display
//! price clients see.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Postgres, QueryBuilder};

use succulent_shop_core::pagination::PageSpec;
use succulent_shop_core::product::ProductDraft;
use succulent_shop_core::requests::ProductFilter;
use succulent_shop_core::{Page, PlantId, Product, ProductId};

use super::{
    PgStore, RepositoryError, count_to_u64, map_constraint, parse_column, parse_optional_column,
};

/// Price after the sale discount, in SQL. Mirrors `pricing::display_price`.
pub const EFFECTIVE_PRICE_SQL: &str =
    "(CASE WHEN on_sale THEN ROUND(base_price * 0.80, 2) ELSE base_price END)";

/// Accepted `sortBy` values for product listings.
pub const SORT_FIELDS: &[(&str, &str)] = &[
    ("id", "id"),
    ("productName", "name"),
    ("name", "name"),
    ("productType", "product_type"),
    ("price", EFFECTIVE_PRICE_SQL),
    ("basePrice", "base_price"),
    ("quantity", "quantity"),
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
];

const PRODUCT_COLUMNS: &str = "id, name, description, product_type, plant_id, is_pot, pot_size, \
     pot_type, pot_number, tool_type, base_price, quantity, active, on_sale, photo, \
     created_at, updated_at";

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Products with the given ids, each at most once, in id order.
    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;

    async fn list(&self, page: &PageSpec) -> Result<Page<Product>, RepositoryError>;

    async fn search(
        &self,
        filter: &ProductFilter,
        page: &PageSpec,
    ) -> Result<Page<Product>, RepositoryError>;

    async fn insert(
        &self,
        draft: &ProductDraft,
        photo: Option<&str>,
    ) -> Result<Product, RepositoryError>;

    /// Overwrite every draft field. `photo: None` keeps the current photo.
    async fn update(
        &self,
        id: ProductId,
        draft: &ProductDraft,
        photo: Option<&str>,
    ) -> Result<Product, RepositoryError>;

    /// Flip the sale flag without touching the stored price.
    async fn set_on_sale(&self, id: ProductId, on_sale: bool) -> Result<Product, RepositoryError>;

    /// Returns `false` when no product had this id.
    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError>;

    /// Every photo file name referenced by a product.
    async fn photo_names(&self) -> Result<Vec<String>, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    description: String,
    product_type: String,
    plant_id: Option<PlantId>,
    is_pot: bool,
    pot_size: Option<String>,
    pot_type: Option<String>,
    pot_number: i32,
    tool_type: Option<String>,
    base_price: Decimal,
    quantity: i32,
    active: bool,
    on_sale: bool,
    photo: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            product_type: parse_column(&row.product_type, "product type")?,
            plant_id: row.plant_id,
            is_pot: row.is_pot,
            pot_size: parse_optional_column(row.pot_size.as_deref(), "pot size")?,
            pot_type: parse_optional_column(row.pot_type.as_deref(), "pot type")?,
            pot_number: row.pot_number,
            tool_type: parse_optional_column(row.tool_type.as_deref(), "tool type")?,
            base_price: row.base_price,
            quantity: row.quantity,
            active: row.active,
            on_sale: row.on_sale,
            photo: row.photo,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(Product::try_from).collect()
}

const WRITE_CONFLICT: &str = "product references a plant that does not exist";

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    qb.push(" WHERE TRUE");
    if let Some(term) = &filter.search_term {
        let pattern = format!("%{term}%");
        qb.push(" AND (LOWER(name) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(description) LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(product_type) = filter.product_type {
        qb.push(" AND product_type = ").push_bind(product_type.as_str());
    }
    if let Some(pot_type) = filter.pot_type {
        qb.push(" AND pot_type = ").push_bind(pot_type.as_str());
    }
    if let Some(tool_type) = filter.tool_type {
        qb.push(" AND tool_type = ").push_bind(tool_type.as_str());
    }
    if let Some(pot_size) = filter.pot_size {
        qb.push(" AND pot_size = ").push_bind(pot_size.as_str());
    }
    if let Some(min) = filter.min_price {
        qb.push(format!(" AND {EFFECTIVE_PRICE_SQL} >= ")).push_bind(min);
    }
    if let Some(max) = filter.max_price {
        qb.push(format!(" AND {EFFECTIVE_PRICE_SQL} <= ")).push_bind(max);
    }
    if let Some(is_pot) = filter.is_pot {
        qb.push(" AND is_pot = ").push_bind(is_pot);
    }
    if let Some(active) = filter.active {
        qb.push(" AND active = ").push_bind(active);
    }
    if let Some(on_sale) = filter.on_sale {
        qb.push(" AND on_sale = ").push_bind(on_sale);
    }
    if let Some(min) = filter.min_quantity {
        qb.push(" AND quantity >= ").push_bind(min);
    }
    if let Some(max) = filter.max_quantity {
        qb.push(" AND quantity <= ").push_bind(max);
    }
}

fn push_page(qb: &mut QueryBuilder<'_, Postgres>, page: &PageSpec) {
    qb.push(format!(
        " ORDER BY {} {}, id ASC LIMIT ",
        page.sort_column,
        page.direction.as_sql()
    ))
    .push_bind(page.limit())
    .push(" OFFSET ")
    .push_bind(page.offset());
}

#[async_trait]
impl ProductRepository for PgStore {
    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool())
                .await?;
        row.map(Product::try_from).transpose()
    }

    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let raw: Vec<i64> = ids.iter().map(|id| id.as_i64()).collect();
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1) ORDER BY id"
        ))
        .bind(raw)
        .fetch_all(self.pool())
        .await?;
        into_products(rows)
    }

    async fn list(&self, page: &PageSpec) -> Result<Page<Product>, RepositoryError> {
        self.search(&ProductFilter::default(), page).await
    }

    async fn search(
        &self,
        filter: &ProductFilter,
        page: &PageSpec,
    ) -> Result<Page<Product>, RepositoryError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM products");
        push_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool()).await?;

        let mut select = QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products"));
        push_filter(&mut select, filter);
        push_page(&mut select, page);
        let rows: Vec<ProductRow> = select.build_query_as().fetch_all(self.pool()).await?;

        Ok(Page::new(into_products(rows)?, page, count_to_u64(total)))
    }

    async fn insert(
        &self,
        draft: &ProductDraft,
        photo: Option<&str>,
    ) -> Result<Product, RepositoryError> {
        let row: ProductRow = sqlx::query_as(&format!(
            r"
            INSERT INTO products (name, description, product_type, plant_id, is_pot, pot_size,
                                  pot_type, pot_number, tool_type, base_price, quantity, active,
                                  photo)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.product_type.as_str())
        .bind(draft.plant_id)
        .bind(draft.is_pot)
        .bind(draft.pot_size.map(|s| s.as_str()))
        .bind(draft.pot_type.map(|t| t.as_str()))
        .bind(draft.pot_number)
        .bind(draft.tool_type.map(|t| t.as_str()))
        .bind(draft.base_price)
        .bind(draft.quantity)
        .bind(draft.active)
        .bind(photo)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_constraint(e, WRITE_CONFLICT))?;
        Product::try_from(row)
    }

    async fn update(
        &self,
        id: ProductId,
        draft: &ProductDraft,
        photo: Option<&str>,
    ) -> Result<Product, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            r"
            UPDATE products
            SET name = $2, description = $3, product_type = $4, plant_id = $5, is_pot = $6,
                pot_size = $7, pot_type = $8, pot_number = $9, tool_type = $10,
                base_price = $11, quantity = $12, active = $13,
                photo = COALESCE($14, photo), updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.product_type.as_str())
        .bind(draft.plant_id)
        .bind(draft.is_pot)
        .bind(draft.pot_size.map(|s| s.as_str()))
        .bind(draft.pot_type.map(|t| t.as_str()))
        .bind(draft.pot_number)
        .bind(draft.tool_type.map(|t| t.as_str()))
        .bind(draft.base_price)
        .bind(draft.quantity)
        .bind(draft.active)
        .bind(photo)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_constraint(e, WRITE_CONFLICT))?;
        row.ok_or(RepositoryError::NotFound).and_then(Product::try_from)
    }

    async fn set_on_sale(&self, id: ProductId, on_sale: bool) -> Result<Product, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "UPDATE products SET on_sale = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(on_sale)
        .fetch_optional(self.pool())
        .await?;
        row.ok_or(RepositoryError::NotFound).and_then(Product::try_from)
    }

    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| {
                map_constraint(e, "product is still referenced by orders or ratings")
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn photo_names(&self) -> Result<Vec<String>, RepositoryError> {
        let names = sqlx::query_scalar("SELECT photo FROM products WHERE photo IS NOT NULL")
            .fetch_all(self.pool())
            .await?;
        Ok(names)
    }
}
