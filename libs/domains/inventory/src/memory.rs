//! In-memory implementation of ProductRepository and StockStore.
//!
//! Backs protocol and concurrency tests without a running MongoDB. The
//! mutex is held across each check-and-mutate, so every counter operation
//! is atomic exactly like the storage-level compare-and-set of the Mongo
//! implementation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::{InventoryError, InventoryResult};
use crate::models::{CreateProduct, Product, ProductFilter, UpdateProduct};
use crate::repository::{DecrementOutcome, ProductRepository, StockStore};

/// In-memory product store keyed by product code.
#[derive(Default, Clone)]
pub struct MemoryStockStore {
    inner: Arc<Mutex<HashMap<String, Product>>>,
}

impl MemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a product directly, replacing any existing one with the
    /// same code.
    pub fn seed(&self, product: Product) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.insert(product.product_code.clone(), product);
        }
    }

    /// Current state of a product, if present.
    pub fn snapshot(&self, product_code: &str) -> Option<Product> {
        self.inner
            .lock()
            .ok()
            .and_then(|guard| guard.get(product_code).cloned())
    }

    fn lock(&self) -> InventoryResult<MutexGuard<'_, HashMap<String, Product>>> {
        self.inner
            .lock()
            .map_err(|_| InventoryError::Internal("stock store mutex poisoned".to_string()))
    }
}

#[async_trait]
impl ProductRepository for MemoryStockStore {
    async fn create(&self, input: CreateProduct) -> InventoryResult<Product> {
        let product = Product::new(input);
        let mut guard = self.lock()?;
        if guard.contains_key(&product.product_code) {
            return Err(InventoryError::CodeExists(product.product_code));
        }
        guard.insert(product.product_code.clone(), product.clone());
        Ok(product)
    }

    async fn get_by_id(&self, id: Uuid) -> InventoryResult<Option<Product>> {
        let guard = self.lock()?;
        Ok(guard.values().find(|p| p.id == id).cloned())
    }

    async fn get_by_code(&self, code: &str) -> InventoryResult<Option<Product>> {
        let guard = self.lock()?;
        Ok(guard.get(code).cloned())
    }

    async fn list(&self, filter: ProductFilter) -> InventoryResult<Vec<Product>> {
        let guard = self.lock()?;
        let mut products: Vec<Product> = guard
            .values()
            .filter(|p| matches_search(p, filter.search.as_deref()))
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    async fn count(&self, filter: ProductFilter) -> InventoryResult<u64> {
        let guard = self.lock()?;
        Ok(guard
            .values()
            .filter(|p| matches_search(p, filter.search.as_deref()))
            .count() as u64)
    }

    async fn update(&self, id: Uuid, input: UpdateProduct) -> InventoryResult<Product> {
        let mut guard = self.lock()?;
        let product = guard
            .values_mut()
            .find(|p| p.id == id)
            .ok_or(InventoryError::NotFound(id))?;
        product.apply_update(input);
        Ok(product.clone())
    }

    async fn delete(&self, id: Uuid) -> InventoryResult<bool> {
        let mut guard = self.lock()?;
        let code = guard
            .values()
            .find(|p| p.id == id)
            .map(|p| p.product_code.clone())
            .ok_or(InventoryError::NotFound(id))?;
        guard.remove(&code);
        Ok(true)
    }

    async fn exists_by_code(&self, code: &str) -> InventoryResult<bool> {
        let guard = self.lock()?;
        Ok(guard.contains_key(code))
    }
}

#[async_trait]
impl StockStore for MemoryStockStore {
    async fn conditional_decrement(
        &self,
        product_code: &str,
        size: &str,
        amount: u32,
    ) -> InventoryResult<DecrementOutcome> {
        let mut guard = self.lock()?;
        let Some(product) = guard.get_mut(product_code) else {
            return Ok(DecrementOutcome::ProductNotFound);
        };

        match product.sizes.iter_mut().find(|s| s.label == size) {
            Some(entry) if entry.quantity >= amount => {
                entry.quantity -= amount;
                product.updated_at = chrono::Utc::now();
                Ok(DecrementOutcome::Applied(product.clone()))
            }
            _ => Ok(DecrementOutcome::NotAvailable),
        }
    }

    async fn increment(
        &self,
        product_code: &str,
        size: &str,
        amount: u32,
    ) -> InventoryResult<Product> {
        let mut guard = self.lock()?;
        let product = guard
            .get_mut(product_code)
            .ok_or_else(|| InventoryError::ProductNotFound(product_code.to_string()))?;

        match product.sizes.iter_mut().find(|s| s.label == size) {
            Some(entry) => entry.quantity += amount,
            None => product.sizes.push(crate::models::SizeStock {
                label: size.to_string(),
                quantity: amount,
            }),
        }
        product.updated_at = chrono::Utc::now();
        Ok(product.clone())
    }
}

fn matches_search(product: &Product, search: Option<&str>) -> bool {
    let Some(search) = search else {
        return true;
    };
    let needle = search.to_lowercase();
    [
        &product.product_code,
        &product.product_name,
        &product.brand,
        &product.color,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SizeStock, SizesInput};

    fn product(code: &str, size: &str, quantity: u32) -> Product {
        Product::new(CreateProduct {
            product_code: code.to_string(),
            product_name: format!("Product {}", code),
            brand: "Acme".to_string(),
            color: "Blue".to_string(),
            sizes: SizesInput::Entries(vec![SizeStock {
                label: size.to_string(),
                quantity,
            }]),
        })
    }

    #[tokio::test]
    async fn test_decrement_applies_when_enough_stock() {
        let store = MemoryStockStore::new();
        store.seed(product("SKU-1", "M", 5));

        let outcome = store.conditional_decrement("SKU-1", "M", 3).await.unwrap();
        assert!(matches!(outcome, DecrementOutcome::Applied(_)));
        assert_eq!(store.snapshot("SKU-1").unwrap().quantity_for("M"), 2);
    }

    #[tokio::test]
    async fn test_decrement_refuses_short_counter() {
        let store = MemoryStockStore::new();
        store.seed(product("SKU-1", "M", 2));

        let outcome = store.conditional_decrement("SKU-1", "M", 3).await.unwrap();
        assert!(matches!(outcome, DecrementOutcome::NotAvailable));
        // counter untouched
        assert_eq!(store.snapshot("SKU-1").unwrap().quantity_for("M"), 2);
    }

    #[tokio::test]
    async fn test_decrement_unknown_size_is_not_available() {
        let store = MemoryStockStore::new();
        store.seed(product("SKU-1", "M", 2));

        let outcome = store.conditional_decrement("SKU-1", "XL", 1).await.unwrap();
        assert!(matches!(outcome, DecrementOutcome::NotAvailable));
    }

    #[tokio::test]
    async fn test_decrement_unknown_product() {
        let store = MemoryStockStore::new();
        let outcome = store.conditional_decrement("NOPE", "M", 1).await.unwrap();
        assert!(matches!(outcome, DecrementOutcome::ProductNotFound));
    }

    #[tokio::test]
    async fn test_increment_creates_missing_size_entry() {
        let store = MemoryStockStore::new();
        store.seed(product("SKU-1", "M", 1));

        let updated = store.increment("SKU-1", "XL", 4).await.unwrap();
        assert_eq!(updated.quantity_for("XL"), 4);
        assert_eq!(updated.quantity_for("M"), 1);
    }

    #[tokio::test]
    async fn test_increment_unknown_product_errors() {
        let store = MemoryStockStore::new();
        let err = store.increment("NOPE", "M", 1).await.unwrap_err();
        assert!(matches!(err, InventoryError::ProductNotFound(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_code() {
        let store = MemoryStockStore::new();
        store.seed(product("SKU-1", "M", 1));

        let err = store
            .create(CreateProduct {
                product_code: "SKU-1".to_string(),
                product_name: "Other".to_string(),
                brand: String::new(),
                color: "Red".to_string(),
                sizes: SizesInput::default(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::CodeExists(_)));
    }

    #[tokio::test]
    async fn test_list_search_is_case_insensitive() {
        let store = MemoryStockStore::new();
        store.seed(product("SKU-1", "M", 1));
        store.seed(product("OTHER", "M", 1));

        let found = store
            .list(ProductFilter {
                search: Some("sku".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].product_code, "SKU-1");
    }
}
