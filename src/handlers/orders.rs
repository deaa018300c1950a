use crate::{
    cache::views,
    errors::ServiceError,
    pagination,
    services::orders::{CreateOrderInput, OrderDto, OrderListResponse},
    AppState, ListQuery,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;
use uuid::Uuid;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:id", get(get_order))
        .route("/:id/status", put(update_order_status))
}

#[derive(Debug, Serialize)]
pub struct OrderDetailResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct StatusUpdateResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusUpdateResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            order: None,
            error: Some(message.into()),
        }
    }
}

/// Unfiltered list pages are served from the view cache; searched listings
/// always hit storage.
async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Value> {
    let search = query.search.unwrap_or_default();
    let (page, limit) = pagination::clamp(query.page, query.limit);

    let cache_key = search
        .trim()
        .is_empty()
        .then(|| views::orders_page(page, limit));
    if let Some(key) = &cache_key {
        if let Some(cached) = state.views.get(key) {
            return Json(cached);
        }
    }

    match state.services.orders.list(page, limit, &search).await {
        Ok((records, window)) => {
            let value =
                serde_json::to_value(OrderListResponse::ok(records, window)).unwrap_or_default();
            if let Some(key) = cache_key {
                state.views.put(key, value.clone());
            }
            Json(value)
        }
        Err(err) => {
            error!(error = %err, "Error fetching orders");
            Json(
                serde_json::to_value(OrderListResponse::failure("Failed to fetch orders"))
                    .unwrap_or_default(),
            )
        }
    }
}

async fn get_order(State(state): State<AppState>, Path(id): Path<Uuid>) -> Json<Value> {
    let key = views::order_detail(&id);
    if let Some(cached) = state.views.get(&key) {
        return Json(cached);
    }

    let response = match state.services.orders.get(id).await {
        Ok(record) => OrderDetailResponse {
            success: true,
            order: Some(record.into()),
            error: None,
        },
        Err(ServiceError::NotFound(_)) => OrderDetailResponse {
            success: false,
            order: None,
            error: Some("Order not found".to_string()),
        },
        Err(err) => {
            error!(error = %err, order_id = %id, "Error fetching order");
            OrderDetailResponse {
                success: false,
                order: None,
                error: Some("Failed to fetch order".to_string()),
            }
        }
    };

    let value = serde_json::to_value(&response).unwrap_or_default();
    if response.success {
        state.views.put(key, value.clone());
    }
    Json(value)
}

/// Order intake used by seeding and tests; unlike the form-style endpoints it
/// propagates `ServiceError` directly.
async fn create_order(
    State(state): State<AppState>,
    Json(input): Json<CreateOrderInput>,
) -> Result<(StatusCode, Json<OrderDto>), ServiceError> {
    let record = state.services.orders.create(input).await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Json<StatusUpdateResponse> {
    match state.services.orders.update_status(id, &request.status).await {
        Ok(record) => Json(StatusUpdateResponse {
            success: true,
            message: Some(format!("Order status updated to {}", record.order.status)),
            order: Some(record.into()),
            error: None,
        }),
        Err(ServiceError::InvalidStatus(_)) => {
            Json(StatusUpdateResponse::failure("Invalid status"))
        }
        Err(ServiceError::NotFound(_)) => Json(StatusUpdateResponse::failure("Order not found")),
        Err(err) => {
            error!(error = %err, order_id = %id, "Error updating order status");
            Json(StatusUpdateResponse::failure(
                "Failed to update order status",
            ))
        }
    }
}
