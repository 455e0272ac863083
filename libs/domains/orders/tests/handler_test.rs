//! Handler tests for the Sales and Returns APIs
//!
//! These run the real routers against the in-memory stock store and
//! ledgers, checking status codes and the response envelope.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // for oneshot()

use domain_inventory::{CreateProduct, MemoryStockStore, Product, SizeStock, SizesInput};
use domain_orders::{
    handlers, MemoryReturnLedger, MemorySaleLedger, ReturnService, SaleService,
};

async fn json_body(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn seed_product(store: &MemoryStockStore, code: &str, size: &str, quantity: u32) {
    store.seed(Product::new(CreateProduct {
        product_code: code.to_string(),
        product_name: format!("Product {}", code),
        brand: "Acme".to_string(),
        color: "Blue".to_string(),
        sizes: SizesInput::Entries(vec![SizeStock {
            label: size.to_string(),
            quantity,
        }]),
    }));
}

fn sales_app(store: &MemoryStockStore) -> (axum::Router, MemorySaleLedger) {
    let ledger = MemorySaleLedger::new();
    let service = SaleService::new(Arc::new(store.clone()), Arc::new(ledger.clone()));
    (handlers::sales_router(service), ledger)
}

fn returns_app(store: &MemoryStockStore, sales: MemorySaleLedger) -> axum::Router {
    let service = ReturnService::new(
        Arc::new(store.clone()),
        Arc::new(sales),
        Arc::new(MemoryReturnLedger::new()),
    );
    handlers::returns_router(service)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn test_create_sale_returns_201_with_envelope() {
    let store = MemoryStockStore::new();
    seed_product(&store, "SKU-1", "M", 5);
    let (app, _) = sales_app(&store);

    let response = app
        .oneshot(post(
            "/",
            json!({
                "customer_name": "Alice",
                "items": [{"product_code": "SKU-1", "size": "M", "quantity": 2}]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["total_items"], json!(2));
    assert_eq!(body["data"]["customer_name"], json!("Alice"));
}

#[tokio::test]
async fn test_create_sale_insufficient_stock_returns_400() {
    let store = MemoryStockStore::new();
    seed_product(&store, "SKU-1", "M", 1);
    let (app, ledger) = sales_app(&store);

    let response = app
        .oneshot(post(
            "/",
            json!({
                "customer_name": "Alice",
                "items": [{"product_code": "SKU-1", "size": "M", "quantity": 2}]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["success"], json!(false));
    assert!(body["message"].as_str().unwrap().contains("Insufficient stock"));
    assert!(ledger.is_empty());
}

#[tokio::test]
async fn test_create_sale_validates_input() {
    let store = MemoryStockStore::new();
    let (app, _) = sales_app(&store);

    // empty customer name fails the validator before any stock call
    let response = app
        .oneshot(post(
            "/",
            json!({
                "customer_name": "",
                "items": [{"product_code": "SKU-1", "size": "M", "quantity": 1}]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["success"], json!(false));
    assert!(body["details"]["customer_name"].is_array());
}

#[tokio::test]
async fn test_get_sale_returns_404_for_missing() {
    let store = MemoryStockStore::new();
    let (app, _) = sales_app(&store);

    let request = Request::builder()
        .method("GET")
        .uri(format!("/{}", uuid::Uuid::now_v7()))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_sales_carries_paging_meta() {
    let store = MemoryStockStore::new();
    seed_product(&store, "SKU-1", "M", 10);
    let ledger = MemorySaleLedger::new();
    let service = SaleService::new(Arc::new(store.clone()), Arc::new(ledger.clone()));

    for i in 0..3 {
        service
            .create_sale(domain_orders::CreateSale {
                customer_name: format!("Customer {}", i),
                items: vec![domain_orders::SaleLineInput {
                    product_code: "SKU-1".to_string(),
                    size: "M".to_string(),
                    quantity: 1,
                    color: String::new(),
                }],
                notes: String::new(),
            })
            .await
            .unwrap();
    }

    let app = handlers::sales_router(service);
    let request = Request::builder()
        .method("GET")
        .uri("/?page=1&limit=2")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["meta"]["total"], json!(3));
    assert_eq!(body["meta"]["page"], json!(1));
}

#[tokio::test]
async fn test_sales_by_customer_aggregates_over_all_sales() {
    // aggregates must cover every matching sale, not the first page
    let store = MemoryStockStore::new();
    seed_product(&store, "SKU-1", "M", 50);
    let ledger = MemorySaleLedger::new();
    let service = SaleService::new(Arc::new(store.clone()), Arc::new(ledger.clone()));

    for _ in 0..25 {
        service
            .create_sale(domain_orders::CreateSale {
                customer_name: "Alice".to_string(),
                items: vec![domain_orders::SaleLineInput {
                    product_code: "SKU-1".to_string(),
                    size: "M".to_string(),
                    quantity: 1,
                    color: String::new(),
                }],
                notes: String::new(),
            })
            .await
            .unwrap();
    }

    let app = handlers::sales_router(service);
    let request = Request::builder()
        .method("GET")
        .uri("/by-customer?name=Alice")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 25);
    assert_eq!(body["meta"]["total"], json!(25));
    assert_eq!(body["meta"]["total_items"], json!(25));
}

#[tokio::test]
async fn test_returns_by_customer_lists_beyond_default_page() {
    let store = MemoryStockStore::new();
    seed_product(&store, "SKU-1", "M", 25);
    let sales_ledger = MemorySaleLedger::new();
    let sale_service = SaleService::new(Arc::new(store.clone()), Arc::new(sales_ledger.clone()));

    let sale = sale_service
        .create_sale(domain_orders::CreateSale {
            customer_name: "Alice".to_string(),
            items: vec![domain_orders::SaleLineInput {
                product_code: "SKU-1".to_string(),
                size: "M".to_string(),
                quantity: 25,
                color: String::new(),
            }],
            notes: String::new(),
        })
        .await
        .unwrap();

    let return_service = ReturnService::new(
        Arc::new(store.clone()),
        Arc::new(sales_ledger),
        Arc::new(MemoryReturnLedger::new()),
    );
    for _ in 0..21 {
        return_service
            .create_return(domain_orders::CreateReturn {
                sale_id: sale.id.to_string(),
                product_code: "SKU-1".to_string(),
                size: "M".to_string(),
                quantity: 1,
                reason: String::new(),
                notes: String::new(),
            })
            .await
            .unwrap();
    }

    let app = handlers::returns_router(return_service);
    let request = Request::builder()
        .method("GET")
        .uri("/by-customer?name=Alice")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 21);
    assert_eq!(body["meta"]["total"], json!(21));
}

#[tokio::test]
async fn test_create_return_roundtrip() {
    let store = MemoryStockStore::new();
    seed_product(&store, "SKU-1", "M", 2);
    let sales_ledger = MemorySaleLedger::new();
    let sale_service = SaleService::new(Arc::new(store.clone()), Arc::new(sales_ledger.clone()));

    let sale = sale_service
        .create_sale(domain_orders::CreateSale {
            customer_name: "Alice".to_string(),
            items: vec![domain_orders::SaleLineInput {
                product_code: "SKU-1".to_string(),
                size: "M".to_string(),
                quantity: 2,
                color: String::new(),
            }],
            notes: String::new(),
        })
        .await
        .unwrap();

    let app = returns_app(&store, sales_ledger);
    let response = app
        .oneshot(post(
            "/",
            json!({
                "sale_id": sale.id.to_string(),
                "product_code": "SKU-1",
                "size": "M",
                "quantity": 1,
                "reason": "too small"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["quantity"], json!(1));
    assert_eq!(store.snapshot("SKU-1").unwrap().quantity_for("M"), 1);
}

#[tokio::test]
async fn test_create_return_above_sold_quantity_returns_400() {
    let store = MemoryStockStore::new();
    seed_product(&store, "SKU-1", "M", 5);
    let sales_ledger = MemorySaleLedger::new();
    let sale_service = SaleService::new(Arc::new(store.clone()), Arc::new(sales_ledger.clone()));

    let sale = sale_service
        .create_sale(domain_orders::CreateSale {
            customer_name: "Alice".to_string(),
            items: vec![domain_orders::SaleLineInput {
                product_code: "SKU-1".to_string(),
                size: "M".to_string(),
                quantity: 1,
                color: String::new(),
            }],
            notes: String::new(),
        })
        .await
        .unwrap();

    let app = returns_app(&store, sales_ledger);
    let response = app
        .oneshot(post(
            "/",
            json!({
                "sale_id": sale.id.to_string(),
                "product_code": "SKU-1",
                "size": "M",
                "quantity": 2
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.into_body()).await;
    assert!(body["message"].as_str().unwrap().contains("exceeds sold quantity"));
}

#[tokio::test]
async fn test_create_return_malformed_sale_id_returns_400() {
    let store = MemoryStockStore::new();
    let app = returns_app(&store, MemorySaleLedger::new());

    let response = app
        .oneshot(post(
            "/",
            json!({
                "sale_id": "not-a-uuid",
                "product_code": "SKU-1",
                "size": "M",
                "quantity": 1
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
