//! API routes module
//!
//! This module wires the inventory and order domains into HTTP routes.

pub mod health;

use std::sync::Arc;

use axum::Router;
use mongodb::Database;

use domain_inventory::{MongoProductRepository, ProductService};
use domain_orders::{MongoReturnLedger, MongoSaleLedger, ReturnService, SaleService};

use crate::state::AppState;

/// Create all API routes
/// Note: These are nested under /api by axum_helpers::create_router
pub fn routes(state: &AppState) -> Router {
    let product_service = ProductService::new(MongoProductRepository::new(&state.db));

    // The product collection doubles as the stock store for sales and returns
    let stock = Arc::new(MongoProductRepository::new(&state.db));
    let sales = Arc::new(MongoSaleLedger::new(&state.db));
    let returns = Arc::new(MongoReturnLedger::new(&state.db));

    let sale_service = SaleService::new(Arc::clone(&stock), Arc::clone(&sales));
    let return_service = ReturnService::new(stock, sales, returns);

    Router::new()
        .nest("/products", domain_inventory::handlers::router(product_service))
        .nest("/sales", domain_orders::handlers::sales_router(sale_service))
        .nest(
            "/returns",
            domain_orders::handlers::returns_router(return_service),
        )
}

/// Create all MongoDB indexes at startup
pub async fn init_indexes(db: &Database) -> eyre::Result<()> {
    MongoProductRepository::new(db).init_indexes().await?;
    MongoSaleLedger::new(db).init_indexes().await?;
    MongoReturnLedger::new(db).init_indexes().await?;
    Ok(())
}
