//! Inventory Domain
//!
//! Products with per-size stock counters, stored in MongoDB.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Business logic, validation
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (traits + MongoDB / in-memory impls)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs
//! └─────────────┘
//! ```
//!
//! The [`StockStore`] trait is the only component allowed to mutate size
//! quantities. Its `conditional_decrement` is a single compare-and-set
//! against storage, so concurrent sales cannot oversell a counter.
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_inventory::{
//!     handlers,
//!     mongodb::MongoProductRepository,
//!     service::ProductService,
//! };
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("inventory");
//!
//! let repository = MongoProductRepository::new(&db);
//! let service = ProductService::new(repository);
//!
//! let router = handlers::router(service);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{InventoryError, InventoryResult};
pub use memory::MemoryStockStore;
pub use models::{
    coalesce_sizes, CreateProduct, Product, ProductFilter, SizeStock, SizesInput, UpdateProduct,
};
pub use mongodb::MongoProductRepository;
pub use repository::{DecrementOutcome, ProductRepository, StockStore};
pub use service::ProductService;
