use crate::{
    cache::{views, ViewCache},
    db::DbPool,
    entities::{
        order::{self, Entity as OrderEntity},
        order_item::{self, Entity as OrderItemEntity},
        product::{self, ActiveModel as ProductActiveModel, Entity as ProductEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    pagination::{self, PageWindow},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Validated payload for product create and update.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 5, message = "Description is too short"))]
    pub description: String,

    #[validate(custom = "validate_price")]
    pub price: Decimal,

    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: i32,

    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,

    #[serde(default)]
    pub images: Vec<String>,
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price <= Decimal::ZERO {
        let mut err = ValidationError::new("price");
        err.message = Some("Price must be greater than 0".into());
        return Err(err);
    }
    Ok(())
}

/// Wire shape of a product. Field names match the presentation layer's
/// contract, `_id` included.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub category: String,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<product::Model> for ProductDto {
    fn from(model: product::Model) -> Self {
        let images = serde_json::from_value(model.images).unwrap_or_default();
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            stock: model.stock,
            category: model.category,
            images,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_products: u64,
    pub has_more: bool,
}

impl From<PageWindow> for ProductPagination {
    fn from(w: PageWindow) -> Self {
        Self {
            current_page: w.current_page,
            total_pages: w.total_pages,
            total_products: w.total,
            has_more: w.has_more,
        }
    }
}

impl ProductPagination {
    fn zeroed() -> Self {
        Self {
            current_page: 1,
            total_pages: 0,
            total_products: 0,
            has_more: false,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListResponse {
    pub success: bool,
    pub products: Vec<ProductDto>,
    pub pagination: ProductPagination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProductListResponse {
    pub fn ok(products: Vec<product::Model>, window: PageWindow) -> Self {
        Self {
            success: true,
            products: products.into_iter().map(ProductDto::from).collect(),
            pagination: window.into(),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            products: Vec::new(),
            pagination: ProductPagination::zeroed(),
            error: Some(message.into()),
        }
    }
}

/// Service for the product catalog: paginated search plus CRUD with
/// referential cleanup of orders on delete.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DbPool>,
    event_sender: EventSender,
    views: ViewCache,
}

impl ProductService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender, views: ViewCache) -> Self {
        Self {
            db,
            event_sender,
            views,
        }
    }

    /// Lists products, newest first. A non-empty search term matches
    /// case-insensitively as a substring of name, category, or description.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        limit: u64,
        search: &str,
    ) -> Result<(Vec<product::Model>, PageWindow), ServiceError> {
        let (page, limit) = pagination::clamp(page, limit);
        let db = &*self.db;

        let mut query = ProductEntity::find();
        let term = search.trim();
        if !term.is_empty() {
            let pattern = format!("%{}%", term.to_lowercase());
            let matches = |col: product::Column| {
                Expr::expr(Func::lower(Expr::col(col))).like(pattern.clone())
            };
            query = query.filter(
                Condition::any()
                    .add(matches(product::Column::Name))
                    .add(matches(product::Column::Category))
                    .add(matches(product::Column::Description)),
            );
        }

        let paginator = query
            .order_by_desc(product::Column::CreatedAt)
            .paginate(db, limit);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count products");
            ServiceError::DatabaseError(e)
        })?;

        let products = paginator.fetch_page(page - 1).await.map_err(|e| {
            error!(error = %e, page, limit, "Failed to fetch products page");
            ServiceError::DatabaseError(e)
        })?;

        let window = pagination::window(page, limit, total, products.len());
        Ok((products, window))
    }

    /// Fetches a single product by id.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        let product = ProductEntity::find_by_id(id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        product.ok_or_else(|| ServiceError::NotFound(format!("Product {id} not found")))
    }

    /// Creates a product from a validated form payload.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: ProductInput) -> Result<product::Model, ServiceError> {
        input.validate()?;

        let now = Utc::now();
        let id = Uuid::new_v4();
        let model = ProductActiveModel {
            id: Set(id),
            name: Set(input.name),
            description: Set(input.description),
            price: Set(input.price),
            stock: Set(input.stock),
            category: Set(input.category),
            images: Set(serde_json::json!(input.images)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let product = model.insert(&*self.db).await.map_err(|e| {
            error!(error = %e, product_id = %id, "Failed to create product");
            ServiceError::DatabaseError(e)
        })?;

        info!(product_id = %id, "Product created");
        self.views.invalidate(views::DASHBOARD);
        if let Err(e) = self.event_sender.send(Event::ProductCreated(id)).await {
            warn!(error = %e, product_id = %id, "Failed to send product created event");
        }

        Ok(product)
    }

    /// Replaces a product's attributes with a validated payload.
    #[instrument(skip(self, input), fields(product_id = %id))]
    pub async fn update(&self, id: Uuid, input: ProductInput) -> Result<product::Model, ServiceError> {
        input.validate()?;

        let existing = self.get(id).await?;
        let mut model: ProductActiveModel = existing.into();
        model.name = Set(input.name);
        model.description = Set(input.description);
        model.price = Set(input.price);
        model.stock = Set(input.stock);
        model.category = Set(input.category);
        model.images = Set(serde_json::json!(input.images));
        model.updated_at = Set(Utc::now());

        let product = model.update(&*self.db).await.map_err(|e| {
            error!(error = %e, product_id = %id, "Failed to update product");
            ServiceError::DatabaseError(e)
        })?;

        info!(product_id = %id, "Product updated");
        self.views.invalidate(views::DASHBOARD);
        if let Err(e) = self.event_sender.send(Event::ProductUpdated(id)).await {
            warn!(error = %e, product_id = %id, "Failed to send product updated event");
        }

        Ok(product)
    }

    /// Deletes a product and cascades to every order that references it:
    /// referential cleanup, not soft delete. Returns the number of orders
    /// removed.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<u64, ServiceError> {
        let txn = self.db.begin().await.map_err(ServiceError::DatabaseError)?;

        let exists = ProductEntity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;
        if exists.is_none() {
            return Err(ServiceError::NotFound(format!("Product {id} not found")));
        }

        let mut order_ids: Vec<Uuid> = OrderItemEntity::find()
            .filter(order_item::Column::ProductId.eq(id))
            .all(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .into_iter()
            .map(|item| item.order_id)
            .collect();
        order_ids.sort_unstable();
        order_ids.dedup();

        let removed_orders = if order_ids.is_empty() {
            0
        } else {
            OrderItemEntity::delete_many()
                .filter(order_item::Column::OrderId.is_in(order_ids.clone()))
                .exec(&txn)
                .await
                .map_err(ServiceError::DatabaseError)?;
            let result = OrderEntity::delete_many()
                .filter(order::Column::Id.is_in(order_ids))
                .exec(&txn)
                .await
                .map_err(ServiceError::DatabaseError)?;
            result.rows_affected
        };

        ProductEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, product_id = %id, "Failed to commit product delete");
            ServiceError::DatabaseError(e)
        })?;

        info!(product_id = %id, removed_orders, "Product deleted with order cascade");
        self.views.invalidate(views::DASHBOARD);
        self.views.invalidate_prefix(views::ORDERS);
        if let Err(e) = self
            .event_sender
            .send(Event::ProductDeleted {
                product_id: id,
                removed_orders,
            })
            .await
        {
            warn!(error = %e, product_id = %id, "Failed to send product deleted event");
        }

        Ok(removed_orders)
    }
}
