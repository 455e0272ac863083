//! Orders Domain
//!
//! Sales and returns over the inventory's per-size stock counters.
//!
//! A sale is only recorded after every requested line has been reserved
//! through [`domain_inventory::StockStore::conditional_decrement`]; any
//! failure rolls the already-reserved lines back in reverse order before
//! the request fails. A return credits stock back and appends a `Return`
//! record bound to the original sale line.
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints (protocol runs as a detached task)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │  Services   │  ← reservation / restock protocols
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐     ┌──────────────┐
//! │   Ledgers   │     │  StockStore  │  ← domain_inventory
//! └─────────────┘     └──────────────┘
//! ```

pub mod error;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{OrderError, OrderResult};
pub use memory::{MemoryReturnLedger, MemorySaleLedger};
pub use models::{
    CreateReturn, CreateSale, Return, ReturnFilter, Sale, SaleFilter, SaleLine, SaleLineInput,
};
pub use mongodb::{MongoReturnLedger, MongoSaleLedger};
pub use repository::{ReturnLedger, SaleLedger};
pub use service::{ReturnService, SaleService};
