use crate::{
    db::DbPool,
    entities::{order::Entity as OrderEntity, product::Entity as ProductEntity},
    errors::ServiceError,
};
use chrono::{DateTime, Datelike, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

use crate::entities::order;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// One month of the trailing six-month chart window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyDatum {
    pub month: String,
    /// Summed sales, rounded to the nearest whole unit for display.
    pub sales: i64,
    pub orders: u64,
}

/// Dashboard KPI payload. Field names are the wire contract with the
/// presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_revenue: Decimal,
    pub total_orders: u64,
    /// Exact quotient; deliberately not rounded.
    pub avg_order_value: Decimal,
    pub total_products: u64,
    pub monthly_data: Vec<MonthlyDatum>,
    /// Month-over-month sales growth, derived from `monthly_data`.
    pub growth_percentage: f64,
}

impl AnalyticsSummary {
    /// The all-zero summary served when persistence fails: the dashboard must
    /// always render.
    pub fn zeroed() -> Self {
        Self {
            total_revenue: Decimal::ZERO,
            total_orders: 0,
            avg_order_value: Decimal::ZERO,
            total_products: 0,
            monthly_data: Vec::new(),
            growth_percentage: 0.0,
        }
    }
}

/// Derives the six calendar-month window ending at `now`, oldest first.
fn month_window(now: DateTime<Utc>) -> [(i32, u32); 6] {
    let mut window = [(0i32, 0u32); 6];
    let (mut year, mut month) = (now.year(), now.month());
    for slot in window.iter_mut().rev() {
        *slot = (year, month);
        if month == 1 {
            year -= 1;
            month = 12;
        } else {
            month -= 1;
        }
    }
    window
}

/// Buckets orders into the six-month window ending at `now`. Months with no
/// orders report zero rather than being omitted.
pub fn monthly_data(orders: &[order::Model], now: DateTime<Utc>) -> Vec<MonthlyDatum> {
    month_window(now)
        .iter()
        .map(|&(year, month)| {
            let bucket: Vec<&order::Model> = orders
                .iter()
                .filter(|o| o.created_at.year() == year && o.created_at.month() == month)
                .collect();
            let sales: Decimal = bucket.iter().map(|o| o.total_amount).sum();
            MonthlyDatum {
                month: MONTH_LABELS[(month - 1) as usize].to_string(),
                sales: sales
                    .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                    .to_i64()
                    .unwrap_or(0),
                orders: bucket.len() as u64,
            }
        })
        .collect()
}

/// Month-over-month growth between the two most recent non-zero months, as a
/// percentage rounded to one decimal place. Fewer than two non-zero months
/// reports 0. The `previous == 0 -> divide by 1` fallback is kept for
/// compatibility with the chart consumer.
pub fn growth_percentage(monthly: &[MonthlyDatum]) -> f64 {
    let non_zero: Vec<f64> = monthly
        .iter()
        .filter(|m| m.sales != 0)
        .map(|m| m.sales as f64)
        .collect();

    if non_zero.len() < 2 {
        return 0.0;
    }

    let latest = non_zero[non_zero.len() - 1];
    let previous = non_zero[non_zero.len() - 2];
    let denominator = if previous == 0.0 { 1.0 } else { previous };
    let pct = (latest - previous) / denominator * 100.0;
    (pct * 10.0).round() / 10.0
}

/// Pure reduction from already-fetched rows to the KPI payload.
pub fn summarize(
    orders: &[order::Model],
    total_products: u64,
    now: DateTime<Utc>,
) -> AnalyticsSummary {
    let total_orders = orders.len() as u64;
    let total_revenue: Decimal = orders.iter().map(|o| o.total_amount).sum();
    let avg_order_value = if total_orders > 0 {
        total_revenue / Decimal::from(total_orders)
    } else {
        Decimal::ZERO
    };

    let monthly = monthly_data(orders, now);
    let growth = growth_percentage(&monthly);

    AnalyticsSummary {
        total_revenue,
        total_orders,
        avg_order_value,
        total_products,
        monthly_data: monthly,
        growth_percentage: growth,
    }
}

/// Derives the dashboard KPIs with a full scan over orders: the data set is
/// small and the result is cached at the handler boundary.
#[derive(Clone)]
pub struct AnalyticsService {
    db: Arc<DbPool>,
}

impl AnalyticsService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn compute_summary(&self) -> Result<AnalyticsSummary, ServiceError> {
        let db = &*self.db;

        let orders = OrderEntity::find()
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        let total_products = ProductEntity::find()
            .count(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(summarize(&orders, total_products, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use test_case::test_case;
    use uuid::Uuid;

    fn order_at(total: Decimal, created_at: DateTime<Utc>) -> order::Model {
        order::Model {
            id: Uuid::new_v4(),
            order_number: format!("ORD-{}", Uuid::new_v4()),
            customer_email: "buyer@example.com".to_string(),
            total_amount: total,
            status: "pending".to_string(),
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn window_spans_six_months_ending_now_oldest_first() {
        let now = Utc.with_ymd_and_hms(2026, 8, 25, 10, 0, 0).unwrap();
        let window = month_window(now);
        assert_eq!(window[0], (2026, 3));
        assert_eq!(window[5], (2026, 8));
    }

    #[test]
    fn window_crosses_year_boundaries() {
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let window = month_window(now);
        assert_eq!(window[0], (2025, 9));
        assert_eq!(window[5], (2026, 2));
    }

    #[test]
    fn three_current_month_orders_fill_only_the_last_bucket() {
        let now = Utc.with_ymd_and_hms(2026, 8, 25, 10, 0, 0).unwrap();
        let orders = vec![
            order_at(dec!(10), now),
            order_at(dec!(20), now),
            order_at(dec!(30), now),
        ];

        let summary = summarize(&orders, 7, now);
        assert_eq!(summary.total_revenue, dec!(60));
        assert_eq!(summary.total_orders, 3);
        assert_eq!(summary.avg_order_value, dec!(20));
        assert_eq!(summary.total_products, 7);

        assert_eq!(summary.monthly_data.len(), 6);
        let current = &summary.monthly_data[5];
        assert_eq!(current.month, "Aug");
        assert_eq!(current.sales, 60);
        assert_eq!(current.orders, 3);
        for earlier in &summary.monthly_data[..5] {
            assert_eq!(earlier.sales, 0);
            assert_eq!(earlier.orders, 0);
        }
        // A single non-zero month has nothing to compare against.
        assert_eq!(summary.growth_percentage, 0.0);
    }

    #[test]
    fn summary_growth_compares_the_two_most_recent_non_zero_months() {
        let now = Utc.with_ymd_and_hms(2026, 8, 25, 10, 0, 0).unwrap();
        let last_month = Utc.with_ymd_and_hms(2026, 7, 10, 10, 0, 0).unwrap();
        let orders = vec![order_at(dec!(100), last_month), order_at(dec!(40), now)];

        let summary = summarize(&orders, 0, now);
        assert_eq!(summary.growth_percentage, -60.0);
    }

    #[test]
    fn no_orders_yields_zero_average_not_a_division() {
        let now = Utc.with_ymd_and_hms(2026, 8, 25, 10, 0, 0).unwrap();
        let summary = summarize(&[], 0, now);
        assert_eq!(summary.avg_order_value, Decimal::ZERO);
        assert_eq!(summary.total_revenue, Decimal::ZERO);
        assert_eq!(summary.monthly_data.len(), 6);
    }

    #[test]
    fn sales_round_half_away_from_zero() {
        let now = Utc.with_ymd_and_hms(2026, 8, 25, 10, 0, 0).unwrap();
        let orders = vec![order_at(dec!(10.50), now)];
        let data = monthly_data(&orders, now);
        assert_eq!(data[5].sales, 11);
    }

    #[test]
    fn average_is_not_rounded() {
        let now = Utc.with_ymd_and_hms(2026, 8, 25, 10, 0, 0).unwrap();
        let orders = vec![order_at(dec!(10), now), order_at(dec!(5), now)];
        let summary = summarize(&orders, 0, now);
        assert_eq!(summary.avg_order_value, dec!(7.5));
    }

    fn datum(month: &str, sales: i64) -> MonthlyDatum {
        MonthlyDatum {
            month: month.to_string(),
            sales,
            orders: if sales == 0 { 0 } else { 1 },
        }
    }

    #[test_case(&[100, 110] => 10.0 ; "ten percent up")]
    #[test_case(&[75, 50] => -33.3 ; "decline rounds to one decimal")]
    #[test_case(&[30, 40] => 33.3 ; "growth rounds to one decimal")]
    #[test_case(&[0, 40, 0, 44] => 10.0 ; "zero months are skipped")]
    #[test_case(&[0, 0, 50] => 0.0 ; "single non-zero month reports zero")]
    #[test_case(&[] => 0.0 ; "empty series reports zero")]
    fn growth_cases(sales: &[i64]) -> f64 {
        let series: Vec<MonthlyDatum> = sales
            .iter()
            .enumerate()
            .map(|(i, &s)| datum(MONTH_LABELS[i], s))
            .collect();
        growth_percentage(&series)
    }
}
