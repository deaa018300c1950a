#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use backoffice_api as api;
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

use api::entities::{order::OrderStatus, product};
use api::services::orders::{CreateOrderInput, OrderItemInput, OrderRecord};
use api::services::products::ProductInput;

/// Test harness: the full application router over an in-memory SQLite
/// database, plus direct access to the service layer for seeding.
pub struct TestApp {
    router: Router,
    pub state: api::AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        let cfg = api::config::AppConfig::for_database("sqlite::memory:");

        let db = api::db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to open in-memory database");
        api::db::run_migrations(&db)
            .await
            .expect("failed to run migrations");
        let db = Arc::new(db);

        let (event_sender, event_rx) = api::events::EventSender::channel(64);
        tokio::spawn(api::events::process_events(event_rx));

        let views = api::cache::ViewCache::new(Duration::from_secs(cfg.dashboard_cache_ttl_secs));
        let services =
            api::handlers::AppServices::new(db.clone(), event_sender.clone(), views.clone());

        let state = api::AppState {
            db,
            config: cfg,
            event_sender,
            views,
            services,
        };

        Self {
            router: api::app_router(state.clone()),
            state,
        }
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, path, None).await
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("failed to build request"))
            .await
            .expect("request failed");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to read body")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body was not JSON")
        };
        (status, value)
    }

    /// Seeds one product through the service layer.
    pub async fn seed_product(
        &self,
        name: &str,
        category: &str,
        description: &str,
        price: Decimal,
        stock: i32,
    ) -> product::Model {
        self.state
            .services
            .products
            .create(ProductInput {
                name: name.to_string(),
                description: description.to_string(),
                price,
                stock,
                category: category.to_string(),
                images: Vec::new(),
            })
            .await
            .expect("failed to seed product")
    }

    /// Seeds one order with a single synthetic line item.
    pub async fn seed_order(
        &self,
        order_number: &str,
        email: &str,
        total: Decimal,
        created_at: DateTime<Utc>,
    ) -> OrderRecord {
        self.seed_order_for_product(order_number, email, total, created_at, None)
            .await
    }

    /// Seeds one order whose line item references the given product.
    pub async fn seed_order_for_product(
        &self,
        order_number: &str,
        email: &str,
        total: Decimal,
        created_at: DateTime<Utc>,
        product_id: Option<Uuid>,
    ) -> OrderRecord {
        self.state
            .services
            .orders
            .create(CreateOrderInput {
                order_number: order_number.to_string(),
                customer_email: email.to_string(),
                items: vec![OrderItemInput {
                    product_id,
                    product_name: "Seeded item".to_string(),
                    quantity: 1,
                    price: total,
                }],
                total_amount: total,
                status: Some(OrderStatus::Pending),
                created_at: Some(created_at),
            })
            .await
            .expect("failed to seed order")
    }
}

/// Decimals cross the wire as strings; parse them back for comparisons.
pub fn decimal_field(value: &Value) -> Decimal {
    value
        .as_str()
        .unwrap_or_else(|| panic!("expected decimal string, got {value}"))
        .parse()
        .expect("invalid decimal string")
}
