use crate::{
    errors::ServiceError,
    handlers::MutationResponse,
    services::products::{ProductDto, ProductInput, ProductListResponse},
    AppState, ListQuery,
};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::error;
use uuid::Uuid;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

#[derive(Debug, Serialize)]
pub struct ProductDetailResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<ProductListResponse> {
    let search = query.search.unwrap_or_default();
    match state
        .services
        .products
        .list(query.page, query.limit, &search)
        .await
    {
        Ok((products, window)) => Json(ProductListResponse::ok(products, window)),
        Err(err) => {
            error!(error = %err, "Error fetching products");
            Json(ProductListResponse::failure("Failed to fetch products"))
        }
    }
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Json<ProductDetailResponse> {
    match state.services.products.get(id).await {
        Ok(product) => Json(ProductDetailResponse {
            success: true,
            product: Some(product.into()),
            error: None,
        }),
        Err(ServiceError::NotFound(_)) => Json(ProductDetailResponse {
            success: false,
            product: None,
            error: Some("Product not found".to_string()),
        }),
        Err(err) => {
            error!(error = %err, product_id = %id, "Error fetching product");
            Json(ProductDetailResponse {
                success: false,
                product: None,
                error: Some("Failed to fetch product".to_string()),
            })
        }
    }
}

async fn create_product(
    State(state): State<AppState>,
    Json(input): Json<ProductInput>,
) -> Json<MutationResponse> {
    match state.services.products.create(input).await {
        Ok(_) => Json(MutationResponse::ok()),
        Err(ServiceError::ValidationError(message)) => Json(MutationResponse::failure(message)),
        Err(err) => {
            error!(error = %err, "Error creating product");
            Json(MutationResponse::failure("Failed to add product"))
        }
    }
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ProductInput>,
) -> Json<MutationResponse> {
    match state.services.products.update(id, input).await {
        Ok(_) => Json(MutationResponse::ok()),
        Err(ServiceError::ValidationError(message)) => Json(MutationResponse::failure(message)),
        Err(ServiceError::NotFound(_)) => Json(MutationResponse::failure("Product not found")),
        Err(err) => {
            error!(error = %err, product_id = %id, "Error updating product");
            Json(MutationResponse::failure("Failed to update product"))
        }
    }
}

async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Json<MutationResponse> {
    match state.services.products.delete(id).await {
        Ok(_) => Json(MutationResponse::ok()),
        Err(ServiceError::NotFound(_)) => Json(MutationResponse::failure("Product not found")),
        Err(err) => {
            error!(error = %err, product_id = %id, "Error deleting product");
            Json(MutationResponse::failure("Failed to delete product"))
        }
    }
}
