//! Back-office API for a small storefront.
//!
//! Products, orders, and derived customers behind a uniform envelope
//! contract, plus dashboard analytics. The database is the only state;
//! customers are a read-time aggregation over orders.
#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod cache;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod pagination;
pub mod services;

use axum::{routing::get, Router};
use serde::Deserialize;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<db::DbPool>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub views: cache::ViewCache,
    pub services: handlers::AppServices,
}

/// Common query parameters for list endpoints.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub search: Option<String>,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    10
}

/// Builds the application router. Transport-level middleware (trace, CORS,
/// compression) is layered on by the binary.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .nest("/api/products", handlers::products::routes())
        .nest("/api/orders", handlers::orders::routes())
        .nest("/api/customers", handlers::customers::routes())
        .nest("/api/analytics", handlers::analytics::routes())
        .with_state(state)
}
