//! Categories and the plants filed under them.

use succulent_shop_core::requests::{CategoryRequest, PlantRequest, PlantSearch};
use succulent_shop_core::{CategoryId, Page, PageRequest, PlantId};

use crate::db::Repositories;
use crate::db::catalog::{CATEGORY_SORT_FIELDS, PLANT_SORT_FIELDS};
use crate::error::{AppError, Result};
use crate::models::{Category, Plant};
use crate::services::storage::{FileStorage, PhotoUpload};

fn category_not_found(id: CategoryId) -> AppError {
    AppError::NotFound(format!("Category not found with id: {id}"))
}

fn plant_not_found(id: PlantId) -> AppError {
    AppError::NotFound(format!("Plant not found with id: {id}"))
}

pub struct CategoryService<'a> {
    repos: &'a Repositories,
}

impl<'a> CategoryService<'a> {
    #[must_use]
    pub const fn new(repos: &'a Repositories) -> Self {
        Self { repos }
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub async fn get(&self, id: CategoryId) -> Result<Category> {
        self.repos
            .categories
            .get(id)
            .await?
            .ok_or_else(|| category_not_found(id))
    }

    /// # Errors
    ///
    /// Returns validation errors for bad paging.
    pub async fn list(&self, page: &PageRequest) -> Result<Page<Category>> {
        let spec = page.resolve(CATEGORY_SORT_FIELDS)?;
        Ok(self.repos.categories.list(&spec).await?)
    }

    /// # Errors
    ///
    /// Returns validation errors, or `Conflict` when the name is taken.
    pub async fn create(&self, request: &CategoryRequest) -> Result<Category> {
        let draft = request.validate()?;
        let category = self.repos.categories.insert(&draft).await?;
        tracing::info!(category_id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    /// # Errors
    ///
    /// Returns `NotFound`, validation errors, or `Conflict` when the name is taken.
    pub async fn update(&self, id: CategoryId, request: &CategoryRequest) -> Result<Category> {
        self.get(id).await?;
        let draft = request.validate()?;
        Ok(self.repos.categories.update(id, &draft).await?)
    }

    /// # Errors
    ///
    /// Returns `NotFound`, or `Conflict` while plants still use the category.
    pub async fn delete(&self, id: CategoryId) -> Result<()> {
        if self.repos.categories.delete(id).await? {
            tracing::info!(category_id = %id, "Category deleted");
            Ok(())
        } else {
            Err(category_not_found(id))
        }
    }
}

pub struct PlantService<'a> {
    repos: &'a Repositories,
    storage: &'a FileStorage,
}

impl<'a> PlantService<'a> {
    #[must_use]
    pub const fn new(repos: &'a Repositories, storage: &'a FileStorage) -> Self {
        Self { repos, storage }
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub async fn get(&self, id: PlantId) -> Result<Plant> {
        self.repos.plants.get(id).await?.ok_or_else(|| plant_not_found(id))
    }

    /// # Errors
    ///
    /// Returns validation errors for bad paging.
    pub async fn list(&self, page: &PageRequest) -> Result<Page<Plant>> {
        let spec = page.resolve(PLANT_SORT_FIELDS)?;
        Ok(self.repos.plants.list(&spec).await?)
    }

    /// # Errors
    ///
    /// Returns validation errors for unknown colours or bad paging.
    pub async fn search(&self, search: &PlantSearch, page: &PageRequest) -> Result<Page<Plant>> {
        let filter = search.parse()?;
        let spec = page.resolve(PLANT_SORT_FIELDS)?;
        Ok(self.repos.plants.search(&filter, &spec).await?)
    }

    /// # Errors
    ///
    /// Returns validation errors, `NotFound` for an unknown category, or photo
    /// and repository errors.
    #[tracing::instrument(skip_all)]
    pub async fn create(&self, request: &PlantRequest, photo: Option<&PhotoUpload>) -> Result<Plant> {
        let draft = request.validate()?;
        CategoryService::new(self.repos).get(draft.category_id).await?;

        let stored = self.storage.store_optional(photo).await?;
        match self.repos.plants.insert(&draft, stored.as_deref()).await {
            Ok(plant) => {
                tracing::info!(plant_id = %plant.id, "Plant created");
                Ok(plant)
            }
            Err(e) => {
                self.storage.discard(stored.as_deref()).await;
                Err(e.into())
            }
        }
    }

    /// # Errors
    ///
    /// Same as [`PlantService::create`], plus `NotFound` for an unknown id.
    #[tracing::instrument(skip(self, request, photo))]
    pub async fn update(
        &self,
        id: PlantId,
        request: &PlantRequest,
        photo: Option<&PhotoUpload>,
    ) -> Result<Plant> {
        let current = self.get(id).await?;
        let draft = request.validate()?;
        CategoryService::new(self.repos).get(draft.category_id).await?;

        let stored = self.storage.store_optional(photo).await?;
        let plant = match self.repos.plants.update(id, &draft, stored.as_deref()).await {
            Ok(plant) => plant,
            Err(e) => {
                self.storage.discard(stored.as_deref()).await;
                return Err(e.into());
            }
        };
        if stored.is_some() {
            self.storage.discard(current.photo.as_deref()).await;
        }
        Ok(plant)
    }

    /// # Errors
    ///
    /// Returns `NotFound`, or `Conflict` while products reference the plant.
    pub async fn delete(&self, id: PlantId) -> Result<()> {
        let plant = self.get(id).await?;
        if !self.repos.plants.delete(id).await? {
            return Err(plant_not_found(id));
        }
        self.storage.discard(plant.photo.as_deref()).await;
        tracing::info!(plant_id = %id, "Plant deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use succulent_shop_core::Color;

    use super::*;

    fn category(name: &str) -> CategoryRequest {
        CategoryRequest {
            name: Some(name.to_owned()),
            description: None,
        }
    }

    fn plant(name: &str, category_id: CategoryId) -> PlantRequest {
        PlantRequest {
            name: Some(name.to_owned()),
            category_id: Some(category_id),
            primary_color: Some("GREEN".to_owned()),
            ..PlantRequest::default()
        }
    }

    #[tokio::test]
    async fn test_plant_requires_existing_category() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let repos = Repositories::in_memory();

        let err = PlantService::new(&repos, &storage)
            .create(&plant("Echeveria", CategoryId::new(8)), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Category not found with id: 8"));
    }

    #[tokio::test]
    async fn test_category_with_plants_cannot_be_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let repos = Repositories::in_memory();
        let categories = CategoryService::new(&repos);
        let plants = PlantService::new(&repos, &storage);

        let rosettes = categories.create(&category("Rosettes")).await.unwrap();
        let echeveria = plants.create(&plant("Echeveria", rosettes.id), None).await.unwrap();
        assert_eq!(echeveria.primary_color, Some(Color::Green));

        let err = categories.delete(rosettes.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        plants.delete(echeveria.id).await.unwrap();
        categories.delete(rosettes.id).await.unwrap();
        assert!(matches!(categories.get(rosettes.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_plant_list_pages_everything() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let repos = Repositories::in_memory();
        let rosettes = CategoryService::new(&repos).create(&category("Rosettes")).await.unwrap();
        let plants = PlantService::new(&repos, &storage);
        for name in ["Echeveria", "Graptopetalum", "Pachyphytum"] {
            plants.create(&plant(name, rosettes.id), None).await.unwrap();
        }

        let page = plants.list(&PageRequest::default()).await.unwrap();
        assert_eq!(page.total_elements, 3);
        assert_eq!(page.content[0].name, "Echeveria");
    }

    #[tokio::test]
    async fn test_plant_search_by_colour() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let repos = Repositories::in_memory();
        let rosettes = CategoryService::new(&repos).create(&category("Rosettes")).await.unwrap();
        let plants = PlantService::new(&repos, &storage);

        plants.create(&plant("Echeveria", rosettes.id), None).await.unwrap();
        let mut red = plant("Crassula", rosettes.id);
        red.primary_color = Some("red".to_owned());
        plants.create(&red, None).await.unwrap();

        let search = PlantSearch {
            primary_color: Some("RED".to_owned()),
            ..PlantSearch::default()
        };
        let page = plants.search(&search, &PageRequest::default()).await.unwrap();
        assert_eq!(page.total_elements, 1);
        assert_eq!(page.content[0].name, "Crassula");

        let bad = PlantSearch {
            bloom_color: Some("plaid".to_owned()),
            ..PlantSearch::default()
        };
        assert!(matches!(
            plants.search(&bad, &PageRequest::default()).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_unknown_category() {
        let repos = Repositories::in_memory();
        let err = CategoryService::new(&repos)
            .update(CategoryId::new(3), &category("Cacti"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
