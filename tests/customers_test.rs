mod common;

use chrono::{Duration, Utc};
use common::{decimal_field, TestApp};
use rust_decimal_macros::dec;

#[tokio::test]
async fn customers_are_derived_from_orders_grouped_by_email() {
    let app = TestApp::new().await;
    let now = Utc::now();
    app.seed_order("ORD-1", "jane@example.com", dec!(15), now - Duration::days(10))
        .await;
    app.seed_order("ORD-2", "jane@example.com", dec!(25), now)
        .await;
    app.seed_order("ORD-3", "sam@example.com", dec!(10), now)
        .await;

    let (_, body) = app.get("/api/customers").await;
    assert_eq!(body["success"], true);
    assert_eq!(body["pagination"]["totalCustomers"], 2);

    let jane = &body["customers"][0];
    assert_eq!(jane["email"], "jane@example.com");
    assert_eq!(jane["totalOrders"], 2);
    assert_eq!(decimal_field(&jane["lifetimeValue"]), dec!(40));
}

#[tokio::test]
async fn customers_sort_by_lifetime_value_descending() {
    let app = TestApp::new().await;
    let now = Utc::now();
    app.seed_order("ORD-1", "small@example.com", dec!(5), now)
        .await;
    app.seed_order("ORD-2", "big@example.com", dec!(500), now)
        .await;
    app.seed_order("ORD-3", "mid@example.com", dec!(50), now)
        .await;

    let (_, body) = app.get("/api/customers").await;
    let emails: Vec<&str> = body["customers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["email"].as_str().unwrap())
        .collect();
    assert_eq!(
        emails,
        vec!["big@example.com", "mid@example.com", "small@example.com"]
    );
}

#[tokio::test]
async fn customer_listing_pages_over_the_derived_rows() {
    let app = TestApp::new().await;
    let now = Utc::now();
    for i in 0..5 {
        app.seed_order(
            &format!("ORD-{i}"),
            &format!("c{i}@example.com"),
            dec!(10),
            now,
        )
        .await;
    }

    let (_, page2) = app.get("/api/customers?page=2&limit=2").await;
    assert_eq!(page2["customers"].as_array().unwrap().len(), 2);
    assert_eq!(page2["pagination"]["currentPage"], 2);
    assert_eq!(page2["pagination"]["totalPages"], 3);
    assert_eq!(page2["pagination"]["totalCustomers"], 5);
    assert_eq!(page2["pagination"]["hasMore"], true);
}

#[tokio::test]
async fn exact_email_search_bypasses_pagination() {
    let app = TestApp::new().await;
    let now = Utc::now();
    app.seed_order("ORD-1", "jane@example.com", dec!(15), now)
        .await;
    app.seed_order("ORD-2", "sam@example.com", dec!(10), now)
        .await;

    let (_, body) = app
        .get("/api/customers?limit=1&search=Jane@Example.com")
        .await;
    assert_eq!(body["customers"].as_array().unwrap().len(), 1);
    assert_eq!(body["customers"][0]["email"], "jane@example.com");
    assert_eq!(body["pagination"]["totalPages"], 1);
    assert_eq!(body["pagination"]["totalCustomers"], 1);
}

#[tokio::test]
async fn customer_detail_reports_averages_and_orders_newest_first() {
    let app = TestApp::new().await;
    let now = Utc::now();
    app.seed_order("ORD-1", "jane@example.com", dec!(15), now - Duration::days(30))
        .await;
    app.seed_order("ORD-2", "jane@example.com", dec!(25), now)
        .await;

    let (_, body) = app.get("/api/customers/jane@example.com").await;
    assert_eq!(body["success"], true);

    let customer = &body["customer"];
    assert_eq!(customer["totalOrders"], 2);
    assert_eq!(decimal_field(&customer["lifetimeValue"]), dec!(40));
    assert_eq!(decimal_field(&customer["averageOrderValue"]), dec!(20));

    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["orderNumber"], "ORD-2");
    assert_eq!(orders[1]["orderNumber"], "ORD-1");
}

#[tokio::test]
async fn unknown_customer_reports_not_found() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/customers/nobody@example.com").await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Customer not found");
    assert!(body["orders"].as_array().unwrap().is_empty());
}
