use crate::{
    cache::{views, ViewCache},
    db::DbPool,
    entities::{
        order::{self, ActiveModel as OrderActiveModel, Entity as OrderEntity, OrderStatus},
        order_item::{self, ActiveModel as OrderItemActiveModel, Entity as OrderItemEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    pagination::{self, PageWindow},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, LoaderTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// An order together with its line items.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

/// Payload accepted by the seed and order-intake paths.
///
/// `totalAmount` is taken as given and never re-validated against the line
/// items; `createdAt` may be supplied to backdate seeded orders.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderInput {
    #[validate(length(min = 1, message = "Order number is required"))]
    pub order_number: String,

    #[validate(email(message = "A valid customer email is required"))]
    pub customer_email: String,

    #[validate]
    pub items: Vec<OrderItemInput>,

    pub total_amount: Decimal,

    #[serde(default)]
    pub status: Option<OrderStatus>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub product_id: Option<Uuid>,

    #[validate(length(min = 1, message = "Product name is required"))]
    pub product_name: String,

    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,

    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDto {
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
}

/// Wire shape of an order, line items embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub order_number: String,
    pub customer_email: String,
    pub items: Vec<OrderItemDto>,
    pub total_amount: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrderRecord> for OrderDto {
    fn from(record: OrderRecord) -> Self {
        Self {
            id: record.order.id,
            order_number: record.order.order_number,
            customer_email: record.order.customer_email,
            items: record
                .items
                .into_iter()
                .map(|item| OrderItemDto {
                    product_id: item.product_id,
                    product_name: item.product_name,
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect(),
            total_amount: record.order.total_amount,
            status: record.order.status,
            created_at: record.order.created_at,
            updated_at: record.order.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_orders: u64,
    pub has_more: bool,
}

impl From<PageWindow> for OrderPagination {
    fn from(w: PageWindow) -> Self {
        Self {
            current_page: w.current_page,
            total_pages: w.total_pages,
            total_orders: w.total,
            has_more: w.has_more,
        }
    }
}

impl OrderPagination {
    fn zeroed() -> Self {
        Self {
            current_page: 1,
            total_pages: 0,
            total_orders: 0,
            has_more: false,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListResponse {
    pub success: bool,
    pub orders: Vec<OrderDto>,
    pub pagination: OrderPagination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OrderListResponse {
    pub fn ok(records: Vec<OrderRecord>, window: PageWindow) -> Self {
        Self {
            success: true,
            orders: records.into_iter().map(OrderDto::from).collect(),
            pagination: window.into(),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            orders: Vec::new(),
            pagination: OrderPagination::zeroed(),
            error: Some(message.into()),
        }
    }
}

/// How a non-empty order search term is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderSearchTerm {
    /// Term contains `@`: exact customer-email match, pagination bypassed.
    CustomerEmail(String),
    /// Anything else: exact order-number match, at most one record.
    OrderNumber(String),
}

impl OrderSearchTerm {
    /// Classifies a raw search string. Whitespace-only input means no search.
    pub fn parse(search: &str) -> Option<Self> {
        let trimmed = search.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.contains('@') {
            Some(OrderSearchTerm::CustomerEmail(trimmed.to_lowercase()))
        } else {
            Some(OrderSearchTerm::OrderNumber(trimmed.to_string()))
        }
    }
}

/// Service for order listings, search, intake, and the status lifecycle.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
    event_sender: EventSender,
    views: ViewCache,
}

impl OrderService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender, views: ViewCache) -> Self {
        Self {
            db,
            event_sender,
            views,
        }
    }

    /// Lists orders, newest first. An email-shaped term returns every order
    /// for that customer on a single page; any other term is an exact
    /// order-number lookup.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        limit: u64,
        search: &str,
    ) -> Result<(Vec<OrderRecord>, PageWindow), ServiceError> {
        let (page, limit) = pagination::clamp(page, limit);
        let db = &*self.db;

        let (orders, window) = match OrderSearchTerm::parse(search) {
            None => {
                let paginator = OrderEntity::find()
                    .order_by_desc(order::Column::CreatedAt)
                    .paginate(db, limit);

                let total = paginator.num_items().await.map_err(|e| {
                    error!(error = %e, "Failed to count orders");
                    ServiceError::DatabaseError(e)
                })?;
                let orders = paginator.fetch_page(page - 1).await.map_err(|e| {
                    error!(error = %e, page, limit, "Failed to fetch orders page");
                    ServiceError::DatabaseError(e)
                })?;

                let window = pagination::window(page, limit, total, orders.len());
                (orders, window)
            }
            Some(OrderSearchTerm::CustomerEmail(email)) => {
                let orders = OrderEntity::find()
                    .filter(order::Column::CustomerEmail.eq(email))
                    .order_by_desc(order::Column::CreatedAt)
                    .all(db)
                    .await
                    .map_err(ServiceError::DatabaseError)?;

                let window = pagination::single_page(page, orders.len() as u64, orders.len());
                (orders, window)
            }
            Some(OrderSearchTerm::OrderNumber(number)) => {
                let orders: Vec<order::Model> = OrderEntity::find()
                    .filter(order::Column::OrderNumber.eq(number))
                    .one(db)
                    .await
                    .map_err(ServiceError::DatabaseError)?
                    .into_iter()
                    .collect();

                let window = pagination::single_page(page, orders.len() as u64, orders.len());
                (orders, window)
            }
        };

        let records = self.attach_items(orders).await?;
        Ok((records, window))
    }

    /// Fetches one order with its line items.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<OrderRecord, ServiceError> {
        let order = OrderEntity::find_by_id(id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {id} not found")))?;

        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(id))
            .all(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(OrderRecord { order, items })
    }

    /// Creates an order with its line items. Order numbers are globally
    /// unique; the customer email is stored lowercased.
    #[instrument(skip(self, input), fields(order_number = %input.order_number))]
    pub async fn create(&self, input: CreateOrderInput) -> Result<OrderRecord, ServiceError> {
        input.validate()?;

        let existing = OrderEntity::find()
            .filter(order::Column::OrderNumber.eq(input.order_number.clone()))
            .one(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        if existing.is_some() {
            return Err(ServiceError::ValidationError(format!(
                "Order number {} already exists",
                input.order_number
            )));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        let created_at = input.created_at.unwrap_or(now);
        let status = input.status.unwrap_or(OrderStatus::DEFAULT);

        let txn = self.db.begin().await.map_err(ServiceError::DatabaseError)?;

        let order_model = OrderActiveModel {
            id: Set(id),
            order_number: Set(input.order_number),
            customer_email: Set(input.customer_email.to_lowercase()),
            total_amount: Set(input.total_amount),
            status: Set(status.to_string()),
            created_at: Set(created_at),
            updated_at: Set(created_at),
        };
        let order = order_model.insert(&txn).await.map_err(|e| {
            error!(error = %e, order_id = %id, "Failed to insert order");
            ServiceError::DatabaseError(e)
        })?;

        let mut items = Vec::with_capacity(input.items.len());
        for item in input.items {
            let item_model = OrderItemActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(id),
                product_id: Set(item.product_id),
                product_name: Set(item.product_name),
                quantity: Set(item.quantity),
                price: Set(item.price),
            };
            let inserted = item_model.insert(&txn).await.map_err(|e| {
                error!(error = %e, order_id = %id, "Failed to insert order item");
                ServiceError::DatabaseError(e)
            })?;
            items.push(inserted);
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %id, "Failed to commit order creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %id, "Order created");
        self.views.invalidate(views::DASHBOARD);
        self.views.invalidate_prefix(views::ORDERS);
        if let Err(e) = self.event_sender.send(Event::OrderCreated(id)).await {
            warn!(error = %e, order_id = %id, "Failed to send order created event");
        }

        Ok(OrderRecord { order, items })
    }

    /// Applies a status transition. The new value must belong to the fixed
    /// vocabulary; beyond that any transition is allowed. On success the order
    /// list view and this order's detail view are invalidated.
    #[instrument(skip(self), fields(order_id = %id, new_status = %new_status))]
    pub async fn update_status(
        &self,
        id: Uuid,
        new_status: &str,
    ) -> Result<OrderRecord, ServiceError> {
        let status = OrderStatus::from_str(new_status)
            .map_err(|_| ServiceError::InvalidStatus(new_status.to_string()))?;

        let order = OrderEntity::find_by_id(id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {id} not found")))?;

        let old_status = order.status.clone();
        let mut model: OrderActiveModel = order.into();
        model.status = Set(status.to_string());
        model.updated_at = Set(Utc::now());

        let updated = model.update(&*self.db).await.map_err(|e| {
            error!(error = %e, order_id = %id, "Failed to update order status");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %id, old_status = %old_status, new_status = %status, "Order status updated");
        self.views.invalidate_prefix(views::ORDERS);
        if let Err(e) = self
            .event_sender
            .send(Event::OrderStatusChanged {
                order_id: id,
                old_status,
                new_status: status.to_string(),
            })
            .await
        {
            warn!(error = %e, order_id = %id, "Failed to send status changed event");
        }

        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(id))
            .all(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(OrderRecord {
            order: updated,
            items,
        })
    }

    /// Bulk-loads line items for a page of orders, preserving order.
    async fn attach_items(
        &self,
        orders: Vec<order::Model>,
    ) -> Result<Vec<OrderRecord>, ServiceError> {
        let items = orders
            .load_many(OrderItemEntity, &*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(orders
            .into_iter()
            .zip(items)
            .map(|(order, items)| OrderRecord { order, items })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn blank_search_means_no_filter() {
        assert_eq!(OrderSearchTerm::parse(""), None);
        assert_eq!(OrderSearchTerm::parse("   "), None);
    }

    #[test]
    fn terms_with_at_sign_are_email_searches_lowercased() {
        assert_eq!(
            OrderSearchTerm::parse("  Jane@Example.COM "),
            Some(OrderSearchTerm::CustomerEmail("jane@example.com".into()))
        );
    }

    #[test]
    fn other_terms_are_order_number_searches() {
        assert_eq!(
            OrderSearchTerm::parse("ORD-00042"),
            Some(OrderSearchTerm::OrderNumber("ORD-00042".into()))
        );
    }

    #[test]
    fn create_input_rejects_bad_email_and_empty_number() {
        let input = CreateOrderInput {
            order_number: "".into(),
            customer_email: "not-an-email".into(),
            items: vec![],
            total_amount: dec!(10),
            status: None,
            created_at: None,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn create_input_rejects_zero_quantity_items() {
        let input = CreateOrderInput {
            order_number: "ORD-1".into(),
            customer_email: "a@x.com".into(),
            items: vec![OrderItemInput {
                product_id: None,
                product_name: "Lamp".into(),
                quantity: 0,
                price: dec!(5),
            }],
            total_amount: dec!(0),
            status: None,
            created_at: None,
        };
        assert!(input.validate().is_err());
    }
}
