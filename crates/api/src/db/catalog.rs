//! Category and plant repositories.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};

use succulent_shop_core::pagination::PageSpec;
use succulent_shop_core::requests::{CategoryDraft, PlantDraft, PlantFilter};
use succulent_shop_core::{CategoryId, Page, PlantId};

use super::{
    PgStore, RepositoryError, count_to_u64, map_constraint, parse_optional_column,
};
use crate::models::{Category, Plant};

pub const CATEGORY_SORT_FIELDS: &[(&str, &str)] = &[
    ("id", "id"),
    ("name", "name"),
    ("categoryName", "name"),
    ("createdAt", "created_at"),
];

pub const PLANT_SORT_FIELDS: &[(&str, &str)] = &[
    ("id", "id"),
    ("name", "name"),
    ("categoryId", "category_id"),
    ("createdAt", "created_at"),
];

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError>;
    async fn list(&self, page: &PageSpec) -> Result<Page<Category>, RepositoryError>;
    async fn insert(&self, draft: &CategoryDraft) -> Result<Category, RepositoryError>;
    async fn update(
        &self,
        id: CategoryId,
        draft: &CategoryDraft,
    ) -> Result<Category, RepositoryError>;
    /// Returns `false` when no category had this id.
    async fn delete(&self, id: CategoryId) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait PlantRepository: Send + Sync {
    async fn get(&self, id: PlantId) -> Result<Option<Plant>, RepositoryError>;
    async fn list(&self, page: &PageSpec) -> Result<Page<Plant>, RepositoryError>;
    async fn search(
        &self,
        filter: &PlantFilter,
        page: &PageSpec,
    ) -> Result<Page<Plant>, RepositoryError>;
    async fn insert(&self, draft: &PlantDraft, photo: Option<&str>)
    -> Result<Plant, RepositoryError>;
    /// `photo: None` keeps the current photo.
    async fn update(
        &self,
        id: PlantId,
        draft: &PlantDraft,
        photo: Option<&str>,
    ) -> Result<Plant, RepositoryError>;
    async fn delete(&self, id: PlantId) -> Result<bool, RepositoryError>;
    async fn photo_names(&self) -> Result<Vec<String>, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PlantRow {
    id: PlantId,
    name: String,
    category_id: CategoryId,
    primary_color: Option<String>,
    secondary_color: Option<String>,
    bloom_color: Option<String>,
    care_instructions: Option<String>,
    photo: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PlantRow> for Plant {
    type Error = RepositoryError;

    fn try_from(row: PlantRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            category_id: row.category_id,
            primary_color: parse_optional_column(row.primary_color.as_deref(), "primary color")?,
            secondary_color: parse_optional_column(
                row.secondary_color.as_deref(),
                "secondary color",
            )?,
            bloom_color: parse_optional_column(row.bloom_color.as_deref(), "bloom color")?,
            care_instructions: row.care_instructions,
            photo: row.photo,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const CATEGORY_COLUMNS: &str = "id, name, description, created_at, updated_at";
const PLANT_COLUMNS: &str = "id, name, category_id, primary_color, secondary_color, bloom_color, \
     care_instructions, photo, created_at, updated_at";

#[async_trait]
impl CategoryRepository for PgStore {
    async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row: Option<CategoryRow> =
            sqlx::query_as(&format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool())
                .await?;
        Ok(row.map(Category::from))
    }

    async fn list(&self, page: &PageSpec) -> Result<Page<Category>, RepositoryError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(self.pool())
            .await?;
        let rows: Vec<CategoryRow> = sqlx::query_as(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY {} {}, id ASC LIMIT $1 OFFSET $2",
            page.sort_column,
            page.direction.as_sql()
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool())
        .await?;
        Ok(Page::new(
            rows.into_iter().map(Category::from).collect(),
            page,
            count_to_u64(total),
        ))
    }

    async fn insert(&self, draft: &CategoryDraft) -> Result<Category, RepositoryError> {
        let row: CategoryRow = sqlx::query_as(&format!(
            "INSERT INTO categories (name, description) VALUES ($1, $2) RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(&draft.name)
        .bind(&draft.description)
        .fetch_one(self.pool())
        .await?;
        Ok(row.into())
    }

    async fn update(
        &self,
        id: CategoryId,
        draft: &CategoryDraft,
    ) -> Result<Category, RepositoryError> {
        let row: Option<CategoryRow> = sqlx::query_as(&format!(
            "UPDATE categories SET name = $2, description = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.description)
        .fetch_optional(self.pool())
        .await?;
        row.map(Category::from).ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| map_constraint(e, "category still has plants"))?;
        Ok(result.rows_affected() > 0)
    }
}

fn push_plant_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &PlantFilter) {
    qb.push(" WHERE TRUE");
    if let Some(term) = &filter.search_term {
        let pattern = format!("%{term}%");
        qb.push(" AND (LOWER(name) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(COALESCE(care_instructions, '')) LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(name) = &filter.name {
        qb.push(" AND LOWER(name) LIKE ").push_bind(format!("%{name}%"));
    }
    if let Some(color) = filter.primary_color {
        qb.push(" AND primary_color = ").push_bind(color.as_str());
    }
    if let Some(color) = filter.secondary_color {
        qb.push(" AND secondary_color = ").push_bind(color.as_str());
    }
    if let Some(color) = filter.bloom_color {
        qb.push(" AND bloom_color = ").push_bind(color.as_str());
    }
    if let Some(category_id) = filter.category_id {
        qb.push(" AND category_id = ").push_bind(category_id);
    }
}

#[async_trait]
impl PlantRepository for PgStore {
    async fn get(&self, id: PlantId) -> Result<Option<Plant>, RepositoryError> {
        let row: Option<PlantRow> =
            sqlx::query_as(&format!("SELECT {PLANT_COLUMNS} FROM plants WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool())
                .await?;
        row.map(Plant::try_from).transpose()
    }

    async fn list(&self, page: &PageSpec) -> Result<Page<Plant>, RepositoryError> {
        self.search(&PlantFilter::default(), page).await
    }

    async fn search(
        &self,
        filter: &PlantFilter,
        page: &PageSpec,
    ) -> Result<Page<Plant>, RepositoryError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM plants");
        push_plant_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool()).await?;

        let mut select = QueryBuilder::new(format!("SELECT {PLANT_COLUMNS} FROM plants"));
        push_plant_filter(&mut select, filter);
        select
            .push(format!(
                " ORDER BY {} {}, id ASC LIMIT ",
                page.sort_column,
                page.direction.as_sql()
            ))
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows: Vec<PlantRow> = select.build_query_as().fetch_all(self.pool()).await?;

        let plants = rows
            .into_iter()
            .map(Plant::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(plants, page, count_to_u64(total)))
    }

    async fn insert(
        &self,
        draft: &PlantDraft,
        photo: Option<&str>,
    ) -> Result<Plant, RepositoryError> {
        let row: PlantRow = sqlx::query_as(&format!(
            r"
            INSERT INTO plants (name, category_id, primary_color, secondary_color, bloom_color,
                                care_instructions, photo)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PLANT_COLUMNS}
            "
        ))
        .bind(&draft.name)
        .bind(draft.category_id)
        .bind(draft.primary_color.map(|c| c.as_str()))
        .bind(draft.secondary_color.map(|c| c.as_str()))
        .bind(draft.bloom_color.map(|c| c.as_str()))
        .bind(&draft.care_instructions)
        .bind(photo)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_constraint(e, "plant references a category that does not exist"))?;
        Plant::try_from(row)
    }

    async fn update(
        &self,
        id: PlantId,
        draft: &PlantDraft,
        photo: Option<&str>,
    ) -> Result<Plant, RepositoryError> {
        let row: Option<PlantRow> = sqlx::query_as(&format!(
            r"
            UPDATE plants
            SET name = $2, category_id = $3, primary_color = $4, secondary_color = $5,
                bloom_color = $6, care_instructions = $7, photo = COALESCE($8, photo),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PLANT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&draft.name)
        .bind(draft.category_id)
        .bind(draft.primary_color.map(|c| c.as_str()))
        .bind(draft.secondary_color.map(|c| c.as_str()))
        .bind(draft.bloom_color.map(|c| c.as_str()))
        .bind(&draft.care_instructions)
        .bind(photo)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_constraint(e, "plant references a category that does not exist"))?;
        row.ok_or(RepositoryError::NotFound).and_then(Plant::try_from)
    }

    async fn delete(&self, id: PlantId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM plants WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| map_constraint(e, "plant is still referenced by products"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn photo_names(&self) -> Result<Vec<String>, RepositoryError> {
        let names = sqlx::query_scalar("SELECT photo FROM plants WHERE photo IS NOT NULL")
            .fetch_all(self.pool())
            .await?;
        Ok(names)
    }
}
