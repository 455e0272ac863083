//! In-memory ledgers backing protocol and handler tests.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::{OrderError, OrderResult};
use crate::models::{Return, ReturnFilter, Sale, SaleFilter};
use crate::repository::{ReturnLedger, SaleLedger};

fn matches_customer(name: &str, customer: Option<&str>) -> bool {
    match customer {
        Some(customer) => name.to_lowercase().contains(&customer.to_lowercase()),
        None => true,
    }
}

/// In-memory append-only sale ledger.
#[derive(Default, Clone)]
pub struct MemorySaleLedger {
    inner: Arc<Mutex<Vec<Sale>>>,
}

impl MemorySaleLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded sales.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> OrderResult<MutexGuard<'_, Vec<Sale>>> {
        self.inner
            .lock()
            .map_err(|_| OrderError::Internal("sale ledger mutex poisoned".to_string()))
    }
}

#[async_trait]
impl SaleLedger for MemorySaleLedger {
    async fn append(&self, sale: Sale) -> OrderResult<Sale> {
        self.lock()?.push(sale.clone());
        Ok(sale)
    }

    async fn get_by_id(&self, id: Uuid) -> OrderResult<Option<Sale>> {
        Ok(self.lock()?.iter().find(|s| s.id == id).cloned())
    }

    async fn list(&self, filter: SaleFilter) -> OrderResult<Vec<Sale>> {
        let guard = self.lock()?;
        let mut sales: Vec<Sale> = guard
            .iter()
            .filter(|s| matches_customer(&s.customer_name, filter.customer.as_deref()))
            .cloned()
            .collect();
        sales.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sales
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    async fn count(&self, filter: SaleFilter) -> OrderResult<u64> {
        Ok(self
            .lock()?
            .iter()
            .filter(|s| matches_customer(&s.customer_name, filter.customer.as_deref()))
            .count() as u64)
    }
}

/// In-memory append-only return ledger.
#[derive(Default, Clone)]
pub struct MemoryReturnLedger {
    inner: Arc<Mutex<Vec<Return>>>,
}

impl MemoryReturnLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded returns.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> OrderResult<MutexGuard<'_, Vec<Return>>> {
        self.inner
            .lock()
            .map_err(|_| OrderError::Internal("return ledger mutex poisoned".to_string()))
    }
}

#[async_trait]
impl ReturnLedger for MemoryReturnLedger {
    async fn append(&self, ret: Return) -> OrderResult<Return> {
        self.lock()?.push(ret.clone());
        Ok(ret)
    }

    async fn list(&self, filter: ReturnFilter) -> OrderResult<Vec<Return>> {
        let guard = self.lock()?;
        let mut returns: Vec<Return> = guard
            .iter()
            .filter(|r| matches_customer(&r.customer_name, filter.customer.as_deref()))
            .cloned()
            .collect();
        returns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(returns
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    async fn count(&self, filter: ReturnFilter) -> OrderResult<u64> {
        Ok(self
            .lock()?
            .iter()
            .filter(|r| matches_customer(&r.customer_name, filter.customer.as_deref()))
            .count() as u64)
    }
}
