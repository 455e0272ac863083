//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for all APIs
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inventory API",
        version = "0.1.0",
        description = "Inventory and order backend: products with per-size stock, \
                       sales with atomic reservation, and stock-crediting returns",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    nest(
        (path = "/api/products", api = domain_inventory::handlers::ApiDoc),
        (path = "/api/sales", api = domain_orders::handlers::SalesApiDoc),
        (path = "/api/returns", api = domain_orders::handlers::ReturnsApiDoc)
    ),
    tags(
        (name = "Products", description = "Product and stock management endpoints"),
        (name = "Sales", description = "Sale recording with atomic stock reservation"),
        (name = "Returns", description = "Stock-crediting returns against recorded sales")
    )
)]
pub struct ApiDoc;
