//! Product Service - Business logic layer

use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{InventoryError, InventoryResult};
use crate::models::{CreateProduct, Product, ProductFilter, UpdateProduct};
use crate::repository::ProductRepository;

/// Product service providing business logic operations
///
/// The service layer handles validation, business rules, and orchestrates
/// repository operations. Stock quantities are out of its reach by design:
/// they move only through [`crate::StockStore`].
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> ProductService<R> {
    /// Create a new ProductService with the given repository
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Create a new product
    #[instrument(skip(self, input), fields(product_code = %input.product_code))]
    pub async fn create_product(&self, input: CreateProduct) -> InventoryResult<Product> {
        input
            .validate()
            .map_err(|e| InventoryError::Validation(e.to_string()))?;

        let code = input.product_code.trim();
        if code.is_empty() {
            return Err(InventoryError::Validation(
                "product_code must not be blank".to_string(),
            ));
        }
        if self.repository.exists_by_code(code).await? {
            return Err(InventoryError::CodeExists(code.to_string()));
        }

        self.repository.create(input).await
    }

    /// Get a product by ID
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> InventoryResult<Product> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(InventoryError::NotFound(id))
    }

    /// List products with optional filters
    #[instrument(skip(self))]
    pub async fn list_products(&self, filter: ProductFilter) -> InventoryResult<Vec<Product>> {
        self.repository.list(filter).await
    }

    /// Count products matching a filter
    #[instrument(skip(self))]
    pub async fn count_products(&self, filter: ProductFilter) -> InventoryResult<u64> {
        self.repository.count(filter).await
    }

    /// Update an existing product
    #[instrument(skip(self, input))]
    pub async fn update_product(&self, id: Uuid, input: UpdateProduct) -> InventoryResult<Product> {
        input
            .validate()
            .map_err(|e| InventoryError::Validation(e.to_string()))?;

        self.repository.update(id, input).await
    }

    /// Delete a product
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> InventoryResult<()> {
        self.repository.delete(id).await?;
        Ok(())
    }
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SizeStock, SizesInput};
    use crate::repository::MockProductRepository;
    use mockall::predicate::eq;

    fn create_input(code: &str) -> CreateProduct {
        CreateProduct {
            product_code: code.to_string(),
            product_name: "Shirt".to_string(),
            brand: "Acme".to_string(),
            color: "Blue".to_string(),
            sizes: SizesInput::Entries(vec![SizeStock {
                label: "M".to_string(),
                quantity: 3,
            }]),
        }
    }

    #[tokio::test]
    async fn test_create_product_rejects_existing_code() {
        let mut repo = MockProductRepository::new();
        repo.expect_exists_by_code()
            .with(eq("SKU-1"))
            .returning(|_| Ok(true));

        let service = ProductService::new(repo);
        let err = service.create_product(create_input("SKU-1")).await.unwrap_err();
        assert!(matches!(err, InventoryError::CodeExists(_)));
    }

    #[tokio::test]
    async fn test_create_product_happy_path() {
        let mut repo = MockProductRepository::new();
        repo.expect_exists_by_code().returning(|_| Ok(false));
        repo.expect_create()
            .returning(|input| Ok(Product::new(input)));

        let service = ProductService::new(repo);
        let product = service.create_product(create_input("SKU-1")).await.unwrap();
        assert_eq!(product.product_code, "SKU-1");
        assert_eq!(product.quantity_for("M"), 3);
    }

    #[tokio::test]
    async fn test_create_product_rejects_blank_code() {
        let repo = MockProductRepository::new();
        let service = ProductService::new(repo);
        let err = service.create_product(create_input("   ")).await.unwrap_err();
        assert!(matches!(err, InventoryError::Validation(_)));
    }

    #[tokio::test]
    async fn test_get_product_not_found() {
        let mut repo = MockProductRepository::new();
        repo.expect_get_by_id().returning(|_| Ok(None));

        let service = ProductService::new(repo);
        let err = service.get_product(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, InventoryError::NotFound(_)));
    }
}
