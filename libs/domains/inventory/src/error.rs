use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Product not found: {0}")]
    NotFound(Uuid),

    #[error("Product with code '{0}' already exists")]
    CodeExists(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Product with code '{0}' does not exist")]
    ProductNotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type InventoryResult<T> = Result<T, InventoryError>;

/// Convert InventoryError to AppError for standardized error responses
impl From<InventoryError> for AppError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::NotFound(id) => {
                AppError::NotFound(format!("Product {} not found", id))
            }
            InventoryError::CodeExists(code) => {
                AppError::Conflict(format!("Product with code '{}' already exists", code))
            }
            InventoryError::Validation(msg) => AppError::BadRequest(msg),
            InventoryError::ProductNotFound(code) => {
                AppError::BadRequest(format!("Product with code '{}' does not exist", code))
            }
            InventoryError::Database(msg) => AppError::InternalServerError(msg),
            InventoryError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for InventoryError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for InventoryError {
    fn from(err: mongodb::error::Error) -> Self {
        InventoryError::Database(err.to_string())
    }
}

/// True when a MongoDB write failed on a unique index (error code 11000).
pub(crate) fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        *err.kind,
        mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(ref we))
            if we.code == 11000
    )
}
