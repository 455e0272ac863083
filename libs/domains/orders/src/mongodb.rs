//! MongoDB implementations of the sale and return ledgers

use async_trait::async_trait;
use mongodb::{
    bson::{doc, to_bson, Bson, Document},
    options::IndexOptions,
    Collection, Database, IndexModel,
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::OrderResult;
use crate::models::{Return, ReturnFilter, Sale, SaleFilter};
use crate::repository::{ReturnLedger, SaleLedger};

fn customer_filter(customer: Option<&str>) -> Document {
    match customer {
        Some(customer) => doc! {
            "customer_name": { "$regex": customer, "$options": "i" }
        },
        None => doc! {},
    }
}

/// MongoDB implementation of the SaleLedger
pub struct MongoSaleLedger {
    collection: Collection<Sale>,
}

impl MongoSaleLedger {
    pub fn new(db: &Database) -> Self {
        let collection = db.collection::<Sale>("sales");
        Self { collection }
    }

    /// Initialize indexes for optimal query performance
    pub async fn init_indexes(&self) -> OrderResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "created_at": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_created_at".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "customer_name": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_customer_name".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Sale indexes created successfully");
        Ok(())
    }
}

#[async_trait]
impl SaleLedger for MongoSaleLedger {
    #[instrument(skip(self, sale), fields(sale_id = %sale.id))]
    async fn append(&self, sale: Sale) -> OrderResult<Sale> {
        self.collection.insert_one(&sale).await?;
        tracing::info!(sale_id = %sale.id, total_items = sale.total_items, "Sale recorded");
        Ok(sale)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> OrderResult<Option<Sale>> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let sale = self.collection.find_one(filter).await?;
        Ok(sale)
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: SaleFilter) -> OrderResult<Vec<Sale>> {
        use futures_util::TryStreamExt;

        let mongo_filter = customer_filter(filter.customer.as_deref());

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
        let sales: Vec<Sale> = cursor.try_collect().await?;

        Ok(sales)
    }

    #[instrument(skip(self))]
    async fn count(&self, filter: SaleFilter) -> OrderResult<u64> {
        let mongo_filter = customer_filter(filter.customer.as_deref());
        let count = self.collection.count_documents(mongo_filter).await?;
        Ok(count)
    }
}

/// MongoDB implementation of the ReturnLedger
pub struct MongoReturnLedger {
    collection: Collection<Return>,
}

impl MongoReturnLedger {
    pub fn new(db: &Database) -> Self {
        let collection = db.collection::<Return>("returns");
        Self { collection }
    }

    /// Initialize indexes for optimal query performance
    pub async fn init_indexes(&self) -> OrderResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "created_at": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_created_at".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "customer_name": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_customer_name".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "sale_id": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_sale_id".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Return indexes created successfully");
        Ok(())
    }
}

#[async_trait]
impl ReturnLedger for MongoReturnLedger {
    #[instrument(skip(self, ret), fields(return_id = %ret.id, sale_id = %ret.sale_id))]
    async fn append(&self, ret: Return) -> OrderResult<Return> {
        self.collection.insert_one(&ret).await?;
        tracing::info!(return_id = %ret.id, "Return recorded");
        Ok(ret)
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: ReturnFilter) -> OrderResult<Vec<Return>> {
        use futures_util::TryStreamExt;

        let mongo_filter = customer_filter(filter.customer.as_deref());

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
        let returns: Vec<Return> = cursor.try_collect().await?;

        Ok(returns)
    }

    #[instrument(skip(self))]
    async fn count(&self, filter: ReturnFilter) -> OrderResult<u64> {
        let mongo_filter = customer_filter(filter.customer.as_deref());
        let count = self.collection.count_documents(mongo_filter).await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_filter_empty() {
        assert!(customer_filter(None).is_empty());
    }

    #[test]
    fn test_customer_filter_regex() {
        let doc = customer_filter(Some("alice"));
        assert!(doc.contains_key("customer_name"));
    }
}
