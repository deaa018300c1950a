mod common;

use chrono::{Months, Utc};
use common::{decimal_field, TestApp};
use rust_decimal_macros::dec;

#[tokio::test]
async fn empty_database_reports_zeros_with_six_month_buckets() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/analytics").await;
    assert_eq!(status, 200);
    assert_eq!(decimal_field(&body["totalRevenue"]), dec!(0));
    assert_eq!(body["totalOrders"], 0);
    assert_eq!(decimal_field(&body["avgOrderValue"]), dec!(0));
    assert_eq!(body["totalProducts"], 0);

    let monthly = body["monthlyData"].as_array().unwrap();
    assert_eq!(monthly.len(), 6);
    for bucket in monthly {
        assert_eq!(bucket["sales"], 0);
        assert_eq!(bucket["orders"], 0);
    }
    assert_eq!(body["growthPercentage"], 0.0);
}

#[tokio::test]
async fn summary_totals_and_current_month_bucket() {
    let app = TestApp::new().await;
    let now = Utc::now();
    app.seed_order("ORD-1", "jane@example.com", dec!(10), now)
        .await;
    app.seed_order("ORD-2", "jane@example.com", dec!(20), now)
        .await;
    app.seed_order("ORD-3", "sam@example.com", dec!(30), now)
        .await;
    app.seed_product("Brass lamp", "lighting", "Dimmable desk lamp", dec!(79.50), 10)
        .await;

    let (_, body) = app.get("/api/analytics").await;
    assert_eq!(decimal_field(&body["totalRevenue"]), dec!(60));
    assert_eq!(body["totalOrders"], 3);
    assert_eq!(decimal_field(&body["avgOrderValue"]), dec!(20));
    assert_eq!(body["totalProducts"], 1);

    let monthly = body["monthlyData"].as_array().unwrap();
    assert_eq!(monthly.len(), 6);
    let current = &monthly[5];
    assert_eq!(current["sales"], 60);
    assert_eq!(current["orders"], 3);
}

#[tokio::test]
async fn orders_bucket_into_their_calendar_month() {
    let app = TestApp::new().await;
    let now = Utc::now();
    let last_month = now
        .checked_sub_months(Months::new(1))
        .expect("date arithmetic failed");

    app.seed_order("ORD-1", "jane@example.com", dec!(100), last_month)
        .await;
    app.seed_order("ORD-2", "jane@example.com", dec!(40), now)
        .await;

    let (_, body) = app.get("/api/analytics").await;
    let monthly = body["monthlyData"].as_array().unwrap();
    assert_eq!(monthly[4]["sales"], 100);
    assert_eq!(monthly[4]["orders"], 1);
    assert_eq!(monthly[5]["sales"], 40);
    assert_eq!(monthly[5]["orders"], 1);
    assert_eq!(body["growthPercentage"], -60.0);
}

#[tokio::test]
async fn order_creation_invalidates_the_cached_summary() {
    let app = TestApp::new().await;
    let now = Utc::now();
    app.seed_order("ORD-1", "jane@example.com", dec!(10), now)
        .await;

    let (_, first) = app.get("/api/analytics").await;
    assert_eq!(first["totalOrders"], 1);

    // Cached until a write invalidates it.
    let (_, cached) = app.get("/api/analytics").await;
    assert_eq!(cached["totalOrders"], 1);

    app.seed_order("ORD-2", "jane@example.com", dec!(20), now)
        .await;

    let (_, refreshed) = app.get("/api/analytics").await;
    assert_eq!(refreshed["totalOrders"], 2);
    assert_eq!(decimal_field(&refreshed["totalRevenue"]), dec!(30));
}
