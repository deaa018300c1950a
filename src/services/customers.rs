use crate::{
    db::DbPool,
    entities::{
        order::{self, Entity as OrderEntity},
        order_item::Entity as OrderItemEntity,
    },
    errors::ServiceError,
    pagination::{self, PageWindow},
    services::orders::{OrderDto, OrderRecord},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, LoaderTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

/// One derived customer row: there is no customer table, only orders grouped
/// by email.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub email: String,
    pub total_orders: u64,
    pub lifetime_value: Decimal,
    pub last_order_date: DateTime<Utc>,
    pub first_order_date: DateTime<Utc>,
}

/// Detail header for one customer, derived from their orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetail {
    pub email: String,
    pub total_orders: u64,
    pub lifetime_value: Decimal,
    pub average_order_value: Decimal,
    pub last_order_date: DateTime<Utc>,
    pub first_order_date: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_customers: u64,
    pub has_more: bool,
}

impl From<PageWindow> for CustomerPagination {
    fn from(w: PageWindow) -> Self {
        Self {
            current_page: w.current_page,
            total_pages: w.total_pages,
            total_customers: w.total,
            has_more: w.has_more,
        }
    }
}

impl CustomerPagination {
    fn zeroed() -> Self {
        Self {
            current_page: 1,
            total_pages: 0,
            total_customers: 0,
            has_more: false,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerListResponse {
    pub success: bool,
    pub customers: Vec<CustomerSummary>,
    pub pagination: CustomerPagination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CustomerListResponse {
    pub fn ok(customers: Vec<CustomerSummary>, window: PageWindow) -> Self {
        Self {
            success: true,
            customers,
            pagination: window.into(),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            customers: Vec::new(),
            pagination: CustomerPagination::zeroed(),
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetailResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerDetail>,
    pub orders: Vec<OrderDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CustomerDetailResponse {
    pub fn ok(customer: CustomerDetail, orders: Vec<OrderRecord>) -> Self {
        Self {
            success: true,
            customer: Some(customer),
            orders: orders.into_iter().map(OrderDto::from).collect(),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            customer: None,
            orders: Vec::new(),
            error: Some(message.into()),
        }
    }
}

/// Groups orders by customer email, accumulating count, lifetime value, and
/// the first/last order timestamps, sorted by lifetime value descending
/// (email ascending as a deterministic tiebreak).
pub fn group_by_email(orders: &[order::Model]) -> Vec<CustomerSummary> {
    let mut groups: HashMap<&str, CustomerSummary> = HashMap::new();

    for order in orders {
        groups
            .entry(order.customer_email.as_str())
            .and_modify(|summary| {
                summary.total_orders += 1;
                summary.lifetime_value += order.total_amount;
                summary.last_order_date = summary.last_order_date.max(order.created_at);
                summary.first_order_date = summary.first_order_date.min(order.created_at);
            })
            .or_insert_with(|| CustomerSummary {
                email: order.customer_email.clone(),
                total_orders: 1,
                lifetime_value: order.total_amount,
                last_order_date: order.created_at,
                first_order_date: order.created_at,
            });
    }

    let mut customers: Vec<CustomerSummary> = groups.into_values().collect();
    customers.sort_by(|a, b| {
        b.lifetime_value
            .cmp(&a.lifetime_value)
            .then_with(|| a.email.cmp(&b.email))
    });
    customers
}

/// Read-time aggregation over the order store; customers are never persisted,
/// so the figures cannot drift from the orders they derive from.
#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DbPool>,
}

impl CustomerService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Lists derived customers by lifetime value. An exact-email search
    /// filters orders before grouping and bypasses pagination.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        limit: u64,
        search: &str,
    ) -> Result<(Vec<CustomerSummary>, PageWindow), ServiceError> {
        let (page, limit) = pagination::clamp(page, limit);
        let db = &*self.db;
        let term = search.trim().to_lowercase();

        if term.is_empty() {
            let orders = OrderEntity::find()
                .all(db)
                .await
                .map_err(ServiceError::DatabaseError)?;
            let customers = group_by_email(&orders);

            let total = customers.len() as u64;
            let skip = pagination::skip(page, limit) as usize;
            let page_items: Vec<CustomerSummary> = customers
                .into_iter()
                .skip(skip)
                .take(limit as usize)
                .collect();
            let window = pagination::window(page, limit, total, page_items.len());
            Ok((page_items, window))
        } else {
            // Filtering first then grouping is equivalent to grouping then
            // filtering for a single email: the group is a singleton.
            let orders = OrderEntity::find()
                .filter(order::Column::CustomerEmail.eq(term))
                .all(db)
                .await
                .map_err(ServiceError::DatabaseError)?;
            let customers = group_by_email(&orders);

            let total = customers.len() as u64;
            let returned = customers.len();
            let window = pagination::single_page(page, total, returned);
            Ok((customers, window))
        }
    }

    /// Detail view for one customer: their orders newest-first plus derived
    /// stats. Unknown email is a not-found failure.
    #[instrument(skip(self))]
    pub async fn detail(
        &self,
        email: &str,
    ) -> Result<(CustomerDetail, Vec<OrderRecord>), ServiceError> {
        let db = &*self.db;
        let normalized = email.trim().to_lowercase();

        let orders = OrderEntity::find()
            .filter(order::Column::CustomerEmail.eq(normalized.clone()))
            .order_by_desc(order::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if orders.is_empty() {
            return Err(ServiceError::NotFound("Customer not found".to_string()));
        }

        let total_orders = orders.len() as u64;
        let lifetime_value: Decimal = orders.iter().map(|o| o.total_amount).sum();
        // Division is safe: the empty case returned NotFound above.
        let average_order_value = lifetime_value / Decimal::from(total_orders);
        let last_order_date = orders[0].created_at;
        let first_order_date = orders[orders.len() - 1].created_at;

        let items = orders
            .load_many(OrderItemEntity, db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        let records: Vec<OrderRecord> = orders
            .into_iter()
            .zip(items)
            .map(|(order, items)| OrderRecord { order, items })
            .collect();

        let detail = CustomerDetail {
            email: normalized,
            total_orders,
            lifetime_value,
            average_order_value,
            last_order_date,
            first_order_date,
        };

        Ok((detail, records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn order_for(email: &str, total: Decimal, day: u32) -> order::Model {
        let created = Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap();
        order::Model {
            id: Uuid::new_v4(),
            order_number: format!("ORD-{}", Uuid::new_v4()),
            customer_email: email.to_string(),
            total_amount: total,
            status: "pending".to_string(),
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn lifetime_value_is_the_sum_of_order_totals() {
        let orders = vec![
            order_for("a@x.com", dec!(15.00), 1),
            order_for("a@x.com", dec!(25.00), 5),
            order_for("b@x.com", dec!(10.00), 3),
        ];

        let customers = group_by_email(&orders);
        assert_eq!(customers.len(), 2);

        let a = customers.iter().find(|c| c.email == "a@x.com").unwrap();
        assert_eq!(a.total_orders, 2);
        assert_eq!(a.lifetime_value, dec!(40.00));
    }

    #[test]
    fn customers_sort_by_lifetime_value_descending() {
        let orders = vec![
            order_for("small@x.com", dec!(5), 1),
            order_for("big@x.com", dec!(500), 2),
            order_for("mid@x.com", dec!(50), 3),
        ];

        let customers = group_by_email(&orders);
        let emails: Vec<&str> = customers.iter().map(|c| c.email.as_str()).collect();
        assert_eq!(emails, vec!["big@x.com", "mid@x.com", "small@x.com"]);
    }

    #[test]
    fn first_and_last_order_dates_span_the_group() {
        let orders = vec![
            order_for("a@x.com", dec!(1), 2),
            order_for("a@x.com", dec!(1), 20),
            order_for("a@x.com", dec!(1), 9),
        ];

        let customers = group_by_email(&orders);
        let a = &customers[0];
        assert_eq!(a.first_order_date.day(), 2);
        assert_eq!(a.last_order_date.day(), 20);
    }

    #[test]
    fn grouping_no_orders_yields_no_customers() {
        assert!(group_by_email(&[]).is_empty());
    }
}
