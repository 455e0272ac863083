use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use domain_inventory::InventoryError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Sale not found: {0}")]
    NotFound(Uuid),

    #[error("Sale has no line for product '{product_code}' size '{size}'")]
    LineNotFound { product_code: String, size: String },

    #[error("Insufficient stock for product '{product_code}' size '{size}'")]
    InsufficientStock { product_code: String, size: String },

    #[error("Return quantity {requested} exceeds sold quantity {sold}")]
    ExceedsSoldQuantity { requested: u32, sold: u32 },

    #[error("Product with code '{0}' does not exist")]
    ProductNotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type OrderResult<T> = Result<T, OrderError>;

/// Convert OrderError to AppError for standardized error responses
impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::InvalidInput(msg) => AppError::BadRequest(msg),
            OrderError::NotFound(id) => AppError::NotFound(format!("Sale {} not found", id)),
            OrderError::LineNotFound { product_code, size } => AppError::BadRequest(format!(
                "Sale has no line for product '{}' size '{}'",
                product_code, size
            )),
            OrderError::InsufficientStock { product_code, size } => AppError::BadRequest(format!(
                "Insufficient stock for product '{}' size '{}'",
                product_code, size
            )),
            OrderError::ExceedsSoldQuantity { requested, sold } => AppError::BadRequest(format!(
                "Return quantity {} exceeds sold quantity {}",
                requested, sold
            )),
            OrderError::ProductNotFound(code) => {
                AppError::BadRequest(format!("Product with code '{}' does not exist", code))
            }
            OrderError::Database(msg) => AppError::InternalServerError(msg),
            OrderError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for OrderError {
    fn from(err: mongodb::error::Error) -> Self {
        OrderError::Database(err.to_string())
    }
}

/// Stock-layer failures keep their business meaning where they have one;
/// everything else is internal.
impl From<InventoryError> for OrderError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::ProductNotFound(code) => OrderError::ProductNotFound(code),
            InventoryError::Database(msg) => OrderError::Database(msg),
            other => OrderError::Internal(other.to_string()),
        }
    }
}
