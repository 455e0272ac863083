//! Sale and return services - the reservation and restock protocols.

use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use domain_inventory::{DecrementOutcome, StockStore};

use crate::error::{OrderError, OrderResult};
use crate::models::{CreateReturn, CreateSale, Return, ReturnFilter, Sale, SaleFilter, SaleLine};
use crate::repository::{ReturnLedger, SaleLedger};

/// A successfully reserved line, kept so it can be credited back if a later
/// step fails.
struct ReservedLine {
    product_code: String,
    size: String,
    quantity: u32,
}

/// Runs the reservation protocol and serves sale reads.
///
/// `create_sale` decrements stock line by line in input order; on any
/// failure it rolls the journal back in reverse order and the request
/// fails without a Sale record. The ledger append is the commit point:
/// if it fails, the journal is rolled back too.
pub struct SaleService<S: StockStore, L: SaleLedger> {
    stock: Arc<S>,
    ledger: Arc<L>,
}

impl<S: StockStore, L: SaleLedger> SaleService<S, L> {
    pub fn new(stock: Arc<S>, ledger: Arc<L>) -> Self {
        Self { stock, ledger }
    }

    /// Create a sale by reserving every line, then recording the sale.
    #[instrument(skip(self, input), fields(customer = %input.customer_name))]
    pub async fn create_sale(&self, input: CreateSale) -> OrderResult<Sale> {
        let normalized = input.normalized().map_err(OrderError::InvalidInput)?;

        let mut journal: Vec<ReservedLine> = Vec::with_capacity(normalized.items.len());
        let mut lines: Vec<SaleLine> = Vec::with_capacity(normalized.items.len());

        for item in &normalized.items {
            let outcome = self
                .stock
                .conditional_decrement(&item.product_code, &item.size, item.quantity)
                .await;

            match outcome {
                Ok(DecrementOutcome::Applied(product)) => {
                    journal.push(ReservedLine {
                        product_code: item.product_code.clone(),
                        size: item.size.clone(),
                        quantity: item.quantity,
                    });
                    let color = if item.color.is_empty() {
                        product.color.clone()
                    } else {
                        item.color.clone()
                    };
                    lines.push(SaleLine {
                        product_id: product.id,
                        product_code: item.product_code.clone(),
                        size: item.size.clone(),
                        quantity: item.quantity,
                        color,
                    });
                }
                Ok(DecrementOutcome::NotAvailable) => {
                    self.compensate(&journal).await;
                    return Err(OrderError::InsufficientStock {
                        product_code: item.product_code.clone(),
                        size: item.size.clone(),
                    });
                }
                Ok(DecrementOutcome::ProductNotFound) => {
                    self.compensate(&journal).await;
                    return Err(OrderError::ProductNotFound(item.product_code.clone()));
                }
                Err(e) => {
                    self.compensate(&journal).await;
                    return Err(e.into());
                }
            }
        }

        let sale = Sale::new(normalized.customer_name, lines, normalized.notes);

        match self.ledger.append(sale).await {
            Ok(sale) => {
                tracing::info!(sale_id = %sale.id, total_items = sale.total_items, "Sale committed");
                Ok(sale)
            }
            Err(e) => {
                tracing::error!(error = %e, "Sale ledger append failed, rolling back reservations");
                self.compensate(&journal).await;
                Err(e)
            }
        }
    }

    /// Credit every journaled line back, newest reservation first.
    /// Best-effort: a failed credit is logged and skipped so the rest of
    /// the journal still unwinds.
    async fn compensate(&self, journal: &[ReservedLine]) {
        for entry in journal.iter().rev() {
            if let Err(e) = self
                .stock
                .increment(&entry.product_code, &entry.size, entry.quantity)
                .await
            {
                tracing::error!(
                    product_code = %entry.product_code,
                    size = %entry.size,
                    quantity = entry.quantity,
                    error = %e,
                    "Compensation failed, stock left decremented"
                );
            }
        }
    }

    /// Get a sale by ID
    #[instrument(skip(self))]
    pub async fn get_sale(&self, id: Uuid) -> OrderResult<Sale> {
        self.ledger
            .get_by_id(id)
            .await?
            .ok_or(OrderError::NotFound(id))
    }

    /// List sales, newest first
    #[instrument(skip(self))]
    pub async fn list_sales(&self, filter: SaleFilter) -> OrderResult<Vec<Sale>> {
        self.ledger.list(filter).await
    }

    /// Count sales matching a filter
    #[instrument(skip(self))]
    pub async fn count_sales(&self, filter: SaleFilter) -> OrderResult<u64> {
        self.ledger.count(filter).await
    }
}

impl<S: StockStore, L: SaleLedger> Clone for SaleService<S, L> {
    fn clone(&self) -> Self {
        Self {
            stock: Arc::clone(&self.stock),
            ledger: Arc::clone(&self.ledger),
        }
    }
}

/// Runs the restock protocol and serves return reads.
pub struct ReturnService<S: StockStore, SL: SaleLedger, RL: ReturnLedger> {
    stock: Arc<S>,
    sales: Arc<SL>,
    returns: Arc<RL>,
}

impl<S: StockStore, SL: SaleLedger, RL: ReturnLedger> ReturnService<S, SL, RL> {
    pub fn new(stock: Arc<S>, sales: Arc<SL>, returns: Arc<RL>) -> Self {
        Self {
            stock,
            sales,
            returns,
        }
    }

    /// Create a return: verify it against the original sale line, credit
    /// the stock back, then record it.
    ///
    /// The bound is per request against the line's sold quantity; earlier
    /// returns for the same line are not summed.
    #[instrument(skip(self, input), fields(sale_id = %input.sale_id))]
    pub async fn create_return(&self, input: CreateReturn) -> OrderResult<Return> {
        let sale_id = Uuid::parse_str(input.sale_id.trim()).map_err(|_| {
            OrderError::InvalidInput(format!("'{}' is not a valid sale id", input.sale_id))
        })?;

        let product_code = input.product_code.trim().to_string();
        let size = input.size.trim().to_string();
        if product_code.is_empty() || size.is_empty() {
            return Err(OrderError::InvalidInput(
                "product_code and size must not be blank".to_string(),
            ));
        }
        if input.quantity == 0 {
            return Err(OrderError::InvalidInput(
                "quantity must be at least 1".to_string(),
            ));
        }

        let sale = self
            .sales
            .get_by_id(sale_id)
            .await?
            .ok_or(OrderError::NotFound(sale_id))?;

        let line = sale
            .find_line(&product_code, &size)
            .ok_or_else(|| OrderError::LineNotFound {
                product_code: product_code.clone(),
                size: size.clone(),
            })?
            .clone();

        if input.quantity > line.quantity {
            return Err(OrderError::ExceedsSoldQuantity {
                requested: input.quantity,
                sold: line.quantity,
            });
        }

        let product = self
            .stock
            .increment(&product_code, &size, input.quantity)
            .await?;

        let ret = Return {
            id: Uuid::now_v7(),
            sale_id,
            customer_name: sale.customer_name.clone(),
            product_id: line.product_id,
            product_code,
            size,
            quantity: input.quantity,
            color: if line.color.is_empty() {
                product.color
            } else {
                line.color
            },
            reason: input.reason.trim().to_string(),
            notes: input.notes.trim().to_string(),
            created_at: Utc::now(),
        };

        match self.returns.append(ret).await {
            Ok(ret) => {
                tracing::info!(return_id = %ret.id, "Return committed");
                Ok(ret)
            }
            Err(e) => {
                // The increment is not undone: crediting stock back twice
                // would be worse than a missing ledger row.
                tracing::error!(
                    sale_id = %sale_id,
                    error = %e,
                    "Stock restored but return record could not be written"
                );
                Err(OrderError::Internal(format!(
                    "return could not be recorded: {}",
                    e
                )))
            }
        }
    }

    /// List returns, newest first
    #[instrument(skip(self))]
    pub async fn list_returns(&self, filter: ReturnFilter) -> OrderResult<Vec<Return>> {
        self.returns.list(filter).await
    }

    /// Count returns matching a filter
    #[instrument(skip(self))]
    pub async fn count_returns(&self, filter: ReturnFilter) -> OrderResult<u64> {
        self.returns.count(filter).await
    }
}

impl<S: StockStore, SL: SaleLedger, RL: ReturnLedger> Clone for ReturnService<S, SL, RL> {
    fn clone(&self) -> Self {
        Self {
            stock: Arc::clone(&self.stock),
            sales: Arc::clone(&self.sales),
            returns: Arc::clone(&self.returns),
        }
    }
}
