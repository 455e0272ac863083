use async_trait::async_trait;
use uuid::Uuid;

use crate::error::InventoryResult;
use crate::models::{CreateProduct, Product, ProductFilter, UpdateProduct};

/// Result of a conditional stock decrement.
#[derive(Debug, Clone)]
pub enum DecrementOutcome {
    /// The counter held enough stock and was decremented; carries the
    /// product state after the write.
    Applied(Product),
    /// The product exists but the size is absent or short on stock.
    NotAvailable,
    /// No product with that code.
    ProductNotFound,
}

/// Repository trait for Product persistence
///
/// This trait defines the data access interface for products.
/// Implementations can use different storage backends (MongoDB, in-memory).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Create a new product
    async fn create(&self, input: CreateProduct) -> InventoryResult<Product>;

    /// Get a product by ID
    async fn get_by_id(&self, id: Uuid) -> InventoryResult<Option<Product>>;

    /// Get a product by its business code
    async fn get_by_code(&self, code: &str) -> InventoryResult<Option<Product>>;

    /// List products with optional filters
    async fn list(&self, filter: ProductFilter) -> InventoryResult<Vec<Product>>;

    /// Count products matching a filter
    async fn count(&self, filter: ProductFilter) -> InventoryResult<u64>;

    /// Update an existing product
    async fn update(&self, id: Uuid, input: UpdateProduct) -> InventoryResult<Product>;

    /// Delete a product by ID
    async fn delete(&self, id: Uuid) -> InventoryResult<bool>;

    /// Check if a product code exists
    async fn exists_by_code(&self, code: &str) -> InventoryResult<bool>;
}

/// The only component allowed to mutate size quantities.
///
/// Both operations are atomic per (product_code, size) counter: the storage
/// layer provides the check-and-mutate, never the caller. This is what keeps
/// concurrent sales from overselling.
#[async_trait]
pub trait StockStore: Send + Sync {
    /// Atomically decrement a size counter by `amount`, but only if the
    /// counter currently holds at least `amount`. Never applies a partial
    /// or negative-going decrement.
    async fn conditional_decrement(
        &self,
        product_code: &str,
        size: &str,
        amount: u32,
    ) -> InventoryResult<DecrementOutcome>;

    /// Atomically increment a size counter by `amount`, creating the size
    /// entry if the label is absent. Errors with
    /// [`crate::InventoryError::ProductNotFound`] when the product does not
    /// exist.
    async fn increment(
        &self,
        product_code: &str,
        size: &str,
        amount: u32,
    ) -> InventoryResult<Product>;
}
