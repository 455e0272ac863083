use async_trait::async_trait;
use uuid::Uuid;

use crate::error::OrderResult;
use crate::models::{Return, ReturnFilter, Sale, SaleFilter};

/// Append-only ledger of sales, plus pass-through reads.
///
/// `append` is the reservation protocol's commit point: a Sale exists iff
/// every one of its lines was decremented.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SaleLedger: Send + Sync {
    /// Append a sale record
    async fn append(&self, sale: Sale) -> OrderResult<Sale>;

    /// Get a sale by ID
    async fn get_by_id(&self, id: Uuid) -> OrderResult<Option<Sale>>;

    /// List sales, newest first
    async fn list(&self, filter: SaleFilter) -> OrderResult<Vec<Sale>>;

    /// Count sales matching a filter
    async fn count(&self, filter: SaleFilter) -> OrderResult<u64>;
}

/// Append-only ledger of returns, plus pass-through reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReturnLedger: Send + Sync {
    /// Append a return record
    async fn append(&self, ret: Return) -> OrderResult<Return>;

    /// List returns, newest first
    async fn list(&self, filter: ReturnFilter) -> OrderResult<Vec<Return>>;

    /// Count returns matching a filter
    async fn count(&self, filter: ReturnFilter) -> OrderResult<u64>;
}
