pub mod analytics;
pub mod customers;
pub mod health;
pub mod orders;
pub mod products;

use crate::{
    cache::ViewCache,
    db::DbPool,
    events::EventSender,
    services::{
        analytics::AnalyticsService, customers::CustomerService, orders::OrderService,
        products::ProductService,
    },
};
use serde::Serialize;
use std::sync::Arc;

/// Aggregate of the services used by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub products: ProductService,
    pub orders: OrderService,
    pub customers: CustomerService,
    pub analytics: AnalyticsService,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender, views: ViewCache) -> Self {
        Self {
            products: ProductService::new(db.clone(), event_sender.clone(), views.clone()),
            orders: OrderService::new(db.clone(), event_sender, views),
            customers: CustomerService::new(db.clone()),
            analytics: AnalyticsService::new(db),
        }
    }
}

/// Envelope for form-style mutations that only need to report success or an
/// error message.
#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MutationResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}
