//! HTTP handlers for the Sales and Returns APIs
//!
//! The write endpoints run their protocol on a detached task and await its
//! handle: if the client disconnects mid-request, axum drops the handler
//! future, but the reservation/compensation keeps running to completion.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use axum_helpers::{ApiResponse, ErrorResponse, ListMeta, UuidPath, ValidatedJson};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi};

use domain_inventory::StockStore;

use crate::error::{OrderError, OrderResult};
use crate::models::{
    CreateReturn, CreateSale, Return, ReturnFilter, Sale, SaleFilter, SaleLine, SaleLineInput,
};
use crate::repository::{ReturnLedger, SaleLedger};
use crate::service::{ReturnService, SaleService};

/// OpenAPI documentation for the Sales API
#[derive(OpenApi)]
#[openapi(
    paths(list_sales, create_sale, get_sale, sales_by_customer),
    components(schemas(Sale, SaleLine, CreateSale, SaleLineInput, ErrorResponse)),
    tags(
        (name = "Sales", description = "Sale recording with atomic stock reservation")
    )
)]
pub struct SalesApiDoc;

/// OpenAPI documentation for the Returns API
#[derive(OpenApi)]
#[openapi(
    paths(list_returns, create_return, returns_by_customer),
    components(schemas(Return, CreateReturn, ErrorResponse)),
    tags(
        (name = "Returns", description = "Stock-crediting returns against recorded sales")
    )
)]
pub struct ReturnsApiDoc;

/// By-customer query parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct CustomerQuery {
    /// Customer name (case-insensitive substring match)
    pub name: String,
}

/// Create the sales router with all HTTP endpoints
pub fn sales_router<S, L>(service: SaleService<S, L>) -> Router
where
    S: StockStore + 'static,
    L: SaleLedger + 'static,
{
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_sales).post(create_sale))
        .route("/by-customer", get(sales_by_customer))
        .route("/{id}", get(get_sale))
        .with_state(shared_service)
}

/// Create the returns router with all HTTP endpoints
pub fn returns_router<S, SL, RL>(service: ReturnService<S, SL, RL>) -> Router
where
    S: StockStore + 'static,
    SL: SaleLedger + 'static,
    RL: ReturnLedger + 'static,
{
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_returns).post(create_return))
        .route("/by-customer", get(returns_by_customer))
        .with_state(shared_service)
}

/// Record a sale, reserving stock for every line
#[utoipa::path(
    post,
    path = "",
    tag = "Sales",
    request_body = CreateSale,
    responses(
        (status = 201, description = "Sale recorded, stock decremented", body = Sale),
        (status = 400, description = "Bad input, unknown product or insufficient stock", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
async fn create_sale<S, L>(
    State(service): State<Arc<SaleService<S, L>>>,
    ValidatedJson(input): ValidatedJson<CreateSale>,
) -> OrderResult<impl IntoResponse>
where
    S: StockStore + 'static,
    L: SaleLedger + 'static,
{
    let service = Arc::clone(&service);
    let sale = tokio::spawn(async move { service.create_sale(input).await })
        .await
        .map_err(|e| OrderError::Internal(format!("sale task failed: {}", e)))??;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(sale))))
}

/// List sales, newest first, with paging meta
#[utoipa::path(
    get,
    path = "",
    tag = "Sales",
    params(SaleFilter),
    responses(
        (status = 200, description = "List of sales", body = Vec<Sale>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
async fn list_sales<S, L>(
    State(service): State<Arc<SaleService<S, L>>>,
    Query(filter): Query<SaleFilter>,
) -> OrderResult<impl IntoResponse>
where
    S: StockStore + 'static,
    L: SaleLedger + 'static,
{
    let total = service.count_sales(filter.clone()).await?;
    let meta = ListMeta {
        page: filter.page.max(1),
        limit: filter.limit,
        total,
    };
    let sales = service.list_sales(filter).await?;
    Ok(Json(ApiResponse::with_meta(sales, meta)))
}

/// Get a sale by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Sales",
    params(
        ("id" = Uuid, Path, description = "Sale ID")
    ),
    responses(
        (status = 200, description = "Sale found", body = Sale),
        (status = 400, description = "Invalid UUID", body = ErrorResponse),
        (status = 404, description = "Sale not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
async fn get_sale<S, L>(
    State(service): State<Arc<SaleService<S, L>>>,
    UuidPath(id): UuidPath,
) -> OrderResult<impl IntoResponse>
where
    S: StockStore + 'static,
    L: SaleLedger + 'static,
{
    let sale = service.get_sale(id).await?;
    Ok(Json(ApiResponse::new(sale)))
}

/// List a customer's sales with aggregate totals
#[utoipa::path(
    get,
    path = "/by-customer",
    tag = "Sales",
    params(CustomerQuery),
    responses(
        (status = 200, description = "The customer's sales", body = Vec<Sale>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
async fn sales_by_customer<S, L>(
    State(service): State<Arc<SaleService<S, L>>>,
    Query(query): Query<CustomerQuery>,
) -> OrderResult<impl IntoResponse>
where
    S: StockStore + 'static,
    L: SaleLedger + 'static,
{
    let sales = service
        .list_sales(SaleFilter::all_for_customer(query.name))
        .await?;
    let total_items: u32 = sales.iter().map(|s| s.total_items).sum();
    let meta = serde_json::json!({
        "total": sales.len(),
        "total_items": total_items,
    });
    Ok(Json(ApiResponse::with_meta(sales, meta)))
}

/// Record a return, crediting stock back
#[utoipa::path(
    post,
    path = "",
    tag = "Returns",
    request_body = CreateReturn,
    responses(
        (status = 201, description = "Return recorded, stock credited", body = Return),
        (status = 400, description = "Bad input, no matching sale line, or quantity above sold", body = ErrorResponse),
        (status = 404, description = "Sale not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
async fn create_return<S, SL, RL>(
    State(service): State<Arc<ReturnService<S, SL, RL>>>,
    ValidatedJson(input): ValidatedJson<CreateReturn>,
) -> OrderResult<impl IntoResponse>
where
    S: StockStore + 'static,
    SL: SaleLedger + 'static,
    RL: ReturnLedger + 'static,
{
    let service = Arc::clone(&service);
    let ret = tokio::spawn(async move { service.create_return(input).await })
        .await
        .map_err(|e| OrderError::Internal(format!("return task failed: {}", e)))??;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(ret))))
}

/// List returns, newest first, with paging meta
#[utoipa::path(
    get,
    path = "",
    tag = "Returns",
    params(ReturnFilter),
    responses(
        (status = 200, description = "List of returns", body = Vec<Return>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
async fn list_returns<S, SL, RL>(
    State(service): State<Arc<ReturnService<S, SL, RL>>>,
    Query(filter): Query<ReturnFilter>,
) -> OrderResult<impl IntoResponse>
where
    S: StockStore + 'static,
    SL: SaleLedger + 'static,
    RL: ReturnLedger + 'static,
{
    let total = service.count_returns(filter.clone()).await?;
    let meta = ListMeta {
        page: filter.page.max(1),
        limit: filter.limit,
        total,
    };
    let returns = service.list_returns(filter).await?;
    Ok(Json(ApiResponse::with_meta(returns, meta)))
}

/// List a customer's returns
#[utoipa::path(
    get,
    path = "/by-customer",
    tag = "Returns",
    params(CustomerQuery),
    responses(
        (status = 200, description = "The customer's returns", body = Vec<Return>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
async fn returns_by_customer<S, SL, RL>(
    State(service): State<Arc<ReturnService<S, SL, RL>>>,
    Query(query): Query<CustomerQuery>,
) -> OrderResult<impl IntoResponse>
where
    S: StockStore + 'static,
    SL: SaleLedger + 'static,
    RL: ReturnLedger + 'static,
{
    let returns = service
        .list_returns(ReturnFilter::all_for_customer(query.name))
        .await?;
    let meta = serde_json::json!({ "total": returns.len() });
    Ok(Json(ApiResponse::with_meta(returns, meta)))
}
