use crate::{
    errors::ServiceError,
    services::customers::{CustomerDetailResponse, CustomerListResponse},
    AppState, ListQuery,
};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use tracing::error;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customers))
        .route("/:email", get(get_customer_details))
}

async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<CustomerListResponse> {
    let search = query.search.unwrap_or_default();
    match state
        .services
        .customers
        .list(query.page, query.limit, &search)
        .await
    {
        Ok((customers, window)) => Json(CustomerListResponse::ok(customers, window)),
        Err(err) => {
            error!(error = %err, "Error fetching customers");
            Json(CustomerListResponse::failure("Failed to fetch customers"))
        }
    }
}

async fn get_customer_details(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Json<CustomerDetailResponse> {
    match state.services.customers.detail(&email).await {
        Ok((customer, orders)) => Json(CustomerDetailResponse::ok(customer, orders)),
        Err(ServiceError::NotFound(_)) => {
            Json(CustomerDetailResponse::failure("Customer not found"))
        }
        Err(err) => {
            error!(error = %err, email = %email, "Error fetching customer details");
            Json(CustomerDetailResponse::failure(
                "Failed to fetch customer details",
            ))
        }
    }
}
