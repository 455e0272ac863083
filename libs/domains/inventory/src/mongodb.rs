//! MongoDB implementation of ProductRepository and StockStore

use async_trait::async_trait;
use mongodb::{
    bson::{doc, to_bson, Bson},
    options::{IndexOptions, ReturnDocument},
    Collection, Database, IndexModel,
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{is_duplicate_key, InventoryError, InventoryResult};
use crate::models::{CreateProduct, Product, ProductFilter, UpdateProduct};
use crate::repository::{DecrementOutcome, ProductRepository, StockStore};

/// MongoDB implementation of the ProductRepository and StockStore
pub struct MongoProductRepository {
    collection: Collection<Product>,
}

impl MongoProductRepository {
    /// Create a new MongoProductRepository
    pub fn new(db: &Database) -> Self {
        let collection = db.collection::<Product>("products");
        Self { collection }
    }

    /// Create a new MongoProductRepository with a custom collection name
    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        let collection = db.collection::<Product>(collection_name);
        Self { collection }
    }

    /// Initialize indexes for optimal query performance
    pub async fn init_indexes(&self) -> InventoryResult<()> {
        let indexes = vec![
            // Unique product code - the stock identity
            IndexModel::builder()
                .keys(doc! { "product_code": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name("idx_product_code_unique".to_string())
                        .build(),
                )
                .build(),
            // Listing order
            IndexModel::builder()
                .keys(doc! { "created_at": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_created_at".to_string())
                        .build(),
                )
                .build(),
            // Brand lookups
            IndexModel::builder()
                .keys(doc! { "brand": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_brand".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Product indexes created successfully");
        Ok(())
    }

    /// Get the underlying collection for advanced operations
    pub fn collection(&self) -> &Collection<Product> {
        &self.collection
    }

    /// Build a MongoDB filter document from ProductFilter
    fn build_filter(filter: &ProductFilter) -> mongodb::bson::Document {
        let mut doc = doc! {};

        if let Some(ref search) = filter.search {
            doc.insert(
                "$or",
                vec![
                    doc! { "product_code": { "$regex": search, "$options": "i" } },
                    doc! { "product_name": { "$regex": search, "$options": "i" } },
                    doc! { "brand": { "$regex": search, "$options": "i" } },
                    doc! { "color": { "$regex": search, "$options": "i" } },
                ],
            );
        }

        doc
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self, input), fields(product_code = %input.product_code))]
    async fn create(&self, input: CreateProduct) -> InventoryResult<Product> {
        let product = Product::new(input);

        self.collection.insert_one(&product).await.map_err(|e| {
            if is_duplicate_key(&e) {
                InventoryError::CodeExists(product.product_code.clone())
            } else {
                e.into()
            }
        })?;

        tracing::info!(product_id = %product.id, "Product created successfully");
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> InventoryResult<Option<Product>> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let product = self.collection.find_one(filter).await?;
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn get_by_code(&self, code: &str) -> InventoryResult<Option<Product>> {
        let filter = doc! { "product_code": code };
        let product = self.collection.find_one(filter).await?;
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: ProductFilter) -> InventoryResult<Vec<Product>> {
        use futures_util::TryStreamExt;

        let mongo_filter = Self::build_filter(&filter);

        let options = mongodb::options::FindOptions::builder()
            .limit(filter.limit)
            .skip(filter.offset())
            .sort(doc! { "created_at": -1 })
            .build();

        let cursor = self
            .collection
            .find(mongo_filter)
            .with_options(options)
            .await?;
        let products: Vec<Product> = cursor.try_collect().await?;

        Ok(products)
    }

    #[instrument(skip(self))]
    async fn count(&self, filter: ProductFilter) -> InventoryResult<u64> {
        let mongo_filter = Self::build_filter(&filter);
        let count = self.collection.count_documents(mongo_filter).await?;
        Ok(count)
    }

    #[instrument(skip(self, input))]
    async fn update(&self, id: Uuid, input: UpdateProduct) -> InventoryResult<Product> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let existing = self
            .collection
            .find_one(filter.clone())
            .await?
            .ok_or(InventoryError::NotFound(id))?;

        let mut updated = existing;
        updated.apply_update(input);

        self.collection.replace_one(filter, &updated).await?;

        tracing::info!(product_id = %id, "Product updated successfully");
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> InventoryResult<bool> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let result = self.collection.delete_one(filter).await?;

        if result.deleted_count == 0 {
            return Err(InventoryError::NotFound(id));
        }

        tracing::info!(product_id = %id, "Product deleted successfully");
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn exists_by_code(&self, code: &str) -> InventoryResult<bool> {
        let filter = doc! { "product_code": code };
        let count = self.collection.count_documents(filter).await?;
        Ok(count > 0)
    }
}

#[async_trait]
impl StockStore for MongoProductRepository {
    /// One compare-and-set round-trip: the filter requires a size element
    /// with the exact label and `quantity >= amount`, the update `$inc`s
    /// that element. A miss never mutates; the follow-up read only
    /// classifies it.
    #[instrument(skip(self))]
    async fn conditional_decrement(
        &self,
        product_code: &str,
        size: &str,
        amount: u32,
    ) -> InventoryResult<DecrementOutcome> {
        let filter = doc! {
            "product_code": product_code,
            "sizes": {
                "$elemMatch": {
                    "label": size,
                    "quantity": { "$gte": amount as i64 }
                }
            }
        };
        let update = doc! {
            "$inc": { "sizes.$.quantity": -(amount as i64) },
            "$set": { "updated_at": chrono::Utc::now().to_rfc3339() }
        };

        let updated = self
            .collection
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await?;

        if let Some(product) = updated {
            tracing::info!(product_code, size, amount, "Stock decremented");
            return Ok(DecrementOutcome::Applied(product));
        }

        // CAS miss: distinguish a missing product from a short counter
        match self
            .collection
            .find_one(doc! { "product_code": product_code })
            .await?
        {
            Some(_) => Ok(DecrementOutcome::NotAvailable),
            None => Ok(DecrementOutcome::ProductNotFound),
        }
    }

    #[instrument(skip(self))]
    async fn increment(
        &self,
        product_code: &str,
        size: &str,
        amount: u32,
    ) -> InventoryResult<Product> {
        let now = chrono::Utc::now().to_rfc3339();

        let inc = self
            .collection
            .update_one(
                doc! { "product_code": product_code, "sizes.label": size },
                doc! {
                    "$inc": { "sizes.$.quantity": amount as i64 },
                    "$set": { "updated_at": &now }
                },
            )
            .await?;

        if inc.matched_count == 0 {
            // The label is absent. The `$ne` guard keeps a concurrent
            // writer from pushing a duplicate entry for the same label.
            let push = self
                .collection
                .update_one(
                    doc! { "product_code": product_code, "sizes.label": { "$ne": size } },
                    doc! {
                        "$push": { "sizes": { "label": size, "quantity": amount as i64 } },
                        "$set": { "updated_at": &now }
                    },
                )
                .await?;

            if push.matched_count == 0 {
                // Either the product is gone or another writer created the
                // label between our two updates; retry the $inc once.
                let retry = self
                    .collection
                    .update_one(
                        doc! { "product_code": product_code, "sizes.label": size },
                        doc! {
                            "$inc": { "sizes.$.quantity": amount as i64 },
                            "$set": { "updated_at": &now }
                        },
                    )
                    .await?;

                if retry.matched_count == 0 {
                    return Err(InventoryError::ProductNotFound(product_code.to_string()));
                }
            }
        }

        let product = self
            .collection
            .find_one(doc! { "product_code": product_code })
            .await?
            .ok_or_else(|| InventoryError::ProductNotFound(product_code.to_string()))?;

        tracing::info!(product_code, size, amount, "Stock incremented");
        Ok(product)
    }
}
