//! Product catalog: CRUD with photos, sale flag, search and bulk import.

use succulent_shop_core::product::ProductDraft;
use succulent_shop_core::requests::{ProductRequest, ProductSearch};
use succulent_shop_core::{Page, PageRequest, PlantId, Product, ProductId};

use crate::db::{Repositories, products::SORT_FIELDS};
use crate::error::{AppError, Result};
use crate::models::{BulkImportResponse, ProductView};
use crate::services::storage::{FileStorage, PhotoUpload};

pub struct ProductService<'a> {
    repos: &'a Repositories,
    storage: &'a FileStorage,
}

impl<'a> ProductService<'a> {
    #[must_use]
    pub const fn new(repos: &'a Repositories, storage: &'a FileStorage) -> Self {
        Self { repos, storage }
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub async fn get(&self, id: ProductId) -> Result<Product> {
        self.repos
            .products
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product not found with id: {id}")))
    }

    /// # Errors
    ///
    /// Returns validation errors for bad paging.
    pub async fn list(&self, page: &PageRequest) -> Result<Page<Product>> {
        let spec = page.resolve(SORT_FIELDS)?;
        Ok(self.repos.products.list(&spec).await?)
    }

    /// # Errors
    ///
    /// Returns validation errors for unknown enum values, inverted ranges or bad paging.
    pub async fn search(&self, search: &ProductSearch, page: &PageRequest) -> Result<Page<Product>> {
        let filter = search.parse()?;
        let spec = page.resolve(SORT_FIELDS)?;
        Ok(self.repos.products.search(&filter, &spec).await?)
    }

    async fn check_plant(&self, plant_id: Option<PlantId>) -> Result<()> {
        if let Some(plant_id) = plant_id
            && self.repos.plants.get(plant_id).await?.is_none()
        {
            return Err(AppError::NotFound(format!("Plant not found with id: {plant_id}")));
        }
        Ok(())
    }

    async fn validated(&self, request: &ProductRequest) -> Result<ProductDraft> {
        let draft = request.validate()?;
        self.check_plant(draft.plant_id).await?;
        Ok(draft)
    }

    /// Create a product, storing `photo` first.
    ///
    /// # Errors
    ///
    /// Returns validation, photo and repository errors. The stored photo is
    /// removed again if the insert fails.
    #[tracing::instrument(skip_all)]
    pub async fn create(
        &self,
        request: &ProductRequest,
        photo: Option<&PhotoUpload>,
    ) -> Result<Product> {
        let draft = self.validated(request).await?;
        let stored = self.storage.store_optional(photo).await?;
        match self.repos.products.insert(&draft, stored.as_deref()).await {
            Ok(product) => {
                tracing::info!(product_id = %product.id, "Product created");
                Ok(product)
            }
            Err(e) => {
                self.storage.discard(stored.as_deref()).await;
                Err(e.into())
            }
        }
    }

    /// Replace a product's fields; a new `photo` replaces the old file.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, validation, photo and repository errors.
    #[tracing::instrument(skip(self, request, photo))]
    pub async fn update(
        &self,
        id: ProductId,
        request: &ProductRequest,
        photo: Option<&PhotoUpload>,
    ) -> Result<Product> {
        let current = self.get(id).await?;
        let draft = self.validated(request).await?;
        let stored = self.storage.store_optional(photo).await?;

        let updated = match self.repos.products.update(id, &draft, stored.as_deref()).await {
            Ok(product) => product,
            Err(e) => {
                self.storage.discard(stored.as_deref()).await;
                return Err(e.into());
            }
        };
        if stored.is_some() {
            self.storage.discard(current.photo.as_deref()).await;
        }
        tracing::info!(product_id = %id, "Product updated");
        Ok(updated)
    }

    /// Flip the sale flag. The base price is left alone.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    #[tracing::instrument(skip(self))]
    pub async fn set_on_sale(&self, id: ProductId, on_sale: bool) -> Result<Product> {
        let product = self.repos.products.set_on_sale(id, on_sale).await.map_err(|e| {
            match AppError::from(e) {
                AppError::NotFound(_) => AppError::NotFound(format!("Product not found with id: {id}")),
                other => other,
            }
        })?;
        tracing::info!(product_id = %id, on_sale, price = %product.display_price(), "Sale status updated");
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns `NotFound`, or `Conflict` while orders or ratings reference it.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<()> {
        let product = self.get(id).await?;
        match self.repos.products.delete(id).await {
            Ok(true) => {}
            Ok(false) => {
                return Err(AppError::NotFound(format!("Product not found with id: {id}")));
            }
            Err(crate::db::RepositoryError::Conflict(_)) => {
                return Err(AppError::Conflict(format!(
                    "Cannot delete product with id: {id} due to existing references"
                )));
            }
            Err(e) => return Err(e.into()),
        }
        self.storage.discard(product.photo.as_deref()).await;
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// Import each item on its own; failures do not undo earlier successes.
    ///
    /// Items arrive as raw JSON so a malformed entry fails alone instead of
    /// rejecting the whole batch.
    #[tracing::instrument(skip_all, fields(total = items.len()))]
    pub async fn bulk_import(&self, items: &[serde_json::Value]) -> BulkImportResponse {
        let mut imported = Vec::new();
        let mut errors = Vec::new();

        for (index, item) in items.iter().enumerate() {
            let outcome = match serde_json::from_value::<ProductRequest>(item.clone()) {
                Ok(request) => self.create(&request, None).await,
                Err(e) => Err(AppError::InvalidData(format!("Invalid product data: {e}"))),
            };
            match outcome {
                Ok(product) => imported.push(ProductView::from(product)),
                Err(e) => {
                    let message = format!("Error importing product at index {index}: {e}");
                    tracing::warn!(%message, "Bulk import item failed");
                    errors.push(message);
                }
            }
        }

        let message = if errors.is_empty() {
            "All products imported successfully".to_owned()
        } else {
            format!("Partial import completed with {} errors", errors.len())
        };
        tracing::info!(imported = imported.len(), failed = errors.len(), "Bulk import finished");

        BulkImportResponse {
            successful_imports: imported.len(),
            total_requested: items.len(),
            imported_products: imported,
            message,
            errors,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::services::fixtures::seed_product;
    use crate::services::storage::StorageError;

    fn pot_request(name: &str, price: &str) -> ProductRequest {
        serde_json::from_value(json!({
            "productName": name,
            "productDesc": "Glazed ceramic pot",
            "productType": "DECOR",
            "isPot": true,
            "potSize": "SMALL",
            "potType": "CERAMIC",
            "potNumber": 1,
            "price": price,
            "quantity": 4
        }))
        .unwrap()
    }

    fn photo(name: &str) -> PhotoUpload {
        PhotoUpload {
            file_name: name.to_owned(),
            content_type: Some("image/png".to_owned()),
            bytes: vec![1, 2, 3],
        }
    }

    async fn files_in(dir: &std::path::Path) -> Vec<String> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names
    }

    #[tokio::test]
    async fn test_sale_toggle_keeps_base_price() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let repos = Repositories::in_memory();
        let service = ProductService::new(&repos, &storage);
        let product = seed_product(&repos, "Pot", "19.99").await;

        let on = service.set_on_sale(product.id, true).await.unwrap();
        assert_eq!(on.display_price().to_string(), "15.99");
        assert_eq!(on.base_price.to_string(), "19.99");

        let on_again = service.set_on_sale(product.id, true).await.unwrap();
        assert_eq!(on_again.display_price(), on.display_price());

        let off = service.set_on_sale(product.id, false).await.unwrap();
        assert_eq!(off.display_price().to_string(), "19.99");

        assert!(matches!(
            service.set_on_sale(ProductId::new(999), true).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_with_photo_and_replace() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let repos = Repositories::in_memory();
        let service = ProductService::new(&repos, &storage);

        let created = service
            .create(&pot_request("Blue pot", "12.00"), Some(&photo("blue.png")))
            .await
            .unwrap();
        let first = created.photo.clone().unwrap();
        assert!(first.ends_with(".png"));
        assert_eq!(files_in(dir.path()).await, [first.clone()]);

        let updated = service
            .update(created.id, &pot_request("Blue pot XL", "14.00"), Some(&photo("xl.png")))
            .await
            .unwrap();
        let second = updated.photo.clone().unwrap();
        assert_ne!(first, second);
        assert_eq!(files_in(dir.path()).await, [second.clone()]);

        // No photo part keeps the current file.
        let kept = service
            .update(created.id, &pot_request("Blue pot XL", "15.00"), None)
            .await
            .unwrap();
        assert_eq!(kept.photo, Some(second));
    }

    #[tokio::test]
    async fn test_rejected_photo_stores_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let repos = Repositories::in_memory();
        let service = ProductService::new(&repos, &storage);

        let mut upload = photo("doc.pdf");
        upload.content_type = Some("application/pdf".to_owned());
        let err = service
            .create(&pot_request("Pot", "5.00"), Some(&upload))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Storage(StorageError::UnsupportedType)));
        assert_eq!(repos.products.list(&PageRequest::default().resolve(SORT_FIELDS).unwrap()).await.unwrap().total_elements, 0);
    }

    #[tokio::test]
    async fn test_unknown_plant_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let repos = Repositories::in_memory();
        let service = ProductService::new(&repos, &storage);

        let request: ProductRequest = serde_json::from_value(json!({
            "productName": "Haworthia",
            "productDesc": "Zebra plant",
            "productType": "PLANT",
            "plantId": 41,
            "price": "9.50"
        }))
        .unwrap();
        let err = service.create(&request, None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Plant not found with id: 41"));
    }

    #[tokio::test]
    async fn test_bulk_import_partial_failure() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let repos = Repositories::in_memory();
        let service = ProductService::new(&repos, &storage);

        let items = vec![
            serde_json::to_value(pot_request("Pot one", "10.00")).unwrap(),
            json!({ "productName": "Nameless", "productType": "TOOL", "price": "3.00" }),
            json!("not an object"),
            serde_json::to_value(pot_request("Pot two", "11.00")).unwrap(),
        ];
        let response = service.bulk_import(&items).await;

        assert!(!response.is_complete());
        assert_eq!(response.total_requested, 4);
        assert_eq!(response.successful_imports, 2);
        assert_eq!(response.errors.len(), 2);
        assert!(response.errors[0].starts_with("Error importing product at index 1: "));
        assert!(response.errors[1].starts_with("Error importing product at index 2: "));
        assert_eq!(
            response
                .imported_products
                .iter()
                .map(|p| p.product_name.as_str())
                .collect::<Vec<_>>(),
            ["Pot one", "Pot two"]
        );

        let stored = service.list(&PageRequest::default()).await.unwrap();
        assert_eq!(stored.total_elements, 2);
    }

    #[tokio::test]
    async fn test_bulk_import_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let repos = Repositories::in_memory();
        let service = ProductService::new(&repos, &storage);

        let items = vec![serde_json::to_value(pot_request("Pot", "10.00")).unwrap()];
        let response = service.bulk_import(&items).await;
        assert!(response.is_complete());
        assert_eq!(response.message, "All products imported successfully");
    }

    #[tokio::test]
    async fn test_delete_removes_photo() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let repos = Repositories::in_memory();
        let service = ProductService::new(&repos, &storage);

        let created = service
            .create(&pot_request("Pot", "10.00"), Some(&photo("p.png")))
            .await
            .unwrap();
        service.delete(created.id).await.unwrap();
        assert!(files_in(dir.path()).await.is_empty());
        assert!(matches!(service.get(created.id).await, Err(AppError::NotFound(_))));
    }
}
