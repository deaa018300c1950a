//! Seeds the database with a sample catalog and order history so the
//! dashboard, trend chart, and customer views have data to show.

use anyhow::Context;
use backoffice_api as api;
use chrono::{Duration as ChronoDuration, Utc};
use clap::Parser;
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use strum::IntoEnumIterator;
use tracing::info;

use api::entities::order::OrderStatus;
use api::services::orders::{CreateOrderInput, OrderItemInput};
use api::services::products::ProductInput;

#[derive(Parser, Debug)]
#[command(about = "Seed the back-office database with sample data")]
struct Args {
    /// Number of orders to create.
    #[arg(long, default_value_t = 60)]
    orders: usize,

    /// Database URL; falls back to the application configuration.
    #[arg(long)]
    database_url: Option<String>,
}

const CATALOG: &[(&str, &str, &str, i32, &str)] = &[
    ("Walnut standing desk", "Solid walnut desk with dual motors", "499.00", 8, "furniture"),
    ("Ergonomic task chair", "Mesh-back chair with lumbar support", "259.00", 15, "furniture"),
    ("Brass desk lamp", "Dimmable lamp with warm LED bulb", "79.50", 30, "lighting"),
    ("Monitor arm", "Single-arm gas spring mount", "119.00", 22, "accessories"),
    ("Felt desk mat", "Grey felt mat, 80x30cm", "34.00", 50, "accessories"),
    ("Ceramic mug", "Stoneware mug, 350ml", "18.00", 64, "kitchen"),
    ("Pour-over kettle", "Gooseneck kettle, 1L", "62.00", 12, "kitchen"),
    ("Linen throw", "Washed linen throw blanket", "88.00", 9, "textiles"),
    ("Wool runner", "Hand-woven runner, 200x70cm", "149.00", 5, "textiles"),
    ("Oak bookshelf", "Five-shelf oak bookcase", "329.00", 6, "furniture"),
    ("Desk organizer", "Walnut organizer with tray", "42.00", 27, "accessories"),
    ("Floor lamp", "Arched floor lamp with linen shade", "139.00", 10, "lighting"),
];

const CUSTOMERS: &[&str] = &[
    "jane@example.com",
    "sam@example.com",
    "priya@example.com",
    "liam@example.com",
    "noor@example.com",
    "olga@example.com",
    "kenji@example.com",
    "maria@example.com",
];

struct OrderPlan {
    email: String,
    items: Vec<OrderItemInput>,
    total: Decimal,
    status: OrderStatus,
    age_days: i64,
    age_minutes: i64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut cfg = api::config::load_config()?;
    if let Some(url) = args.database_url {
        cfg.database_url = url;
    }
    api::config::init_tracing(&cfg.log_level);

    let db = api::db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to the database")?;
    api::db::run_migrations(&db)
        .await
        .context("failed to run migrations")?;
    let db = Arc::new(db);

    let (event_sender, event_rx) = api::events::EventSender::channel(256);
    tokio::spawn(api::events::process_events(event_rx));
    let views = api::cache::ViewCache::new(Duration::from_secs(cfg.dashboard_cache_ttl_secs));
    let services = api::handlers::AppServices::new(db, event_sender, views);

    info!(count = CATALOG.len(), "Seeding products");
    let mut products = Vec::with_capacity(CATALOG.len());
    for (name, description, price, stock, category) in CATALOG {
        let product = services
            .products
            .create(ProductInput {
                name: (*name).to_string(),
                description: (*description).to_string(),
                price: price.parse().context("bad price in catalog")?,
                stock: *stock,
                category: (*category).to_string(),
                images: vec![format!(
                    "https://cdn.example.com/{}.jpg",
                    name.to_lowercase().replace(' ', "-")
                )],
            })
            .await
            .context("failed to seed product")?;
        products.push(product);
    }

    // Spread orders across the trailing six months so every chart bucket has
    // a chance of being non-empty.
    let statuses: Vec<OrderStatus> = OrderStatus::iter().collect();
    let plans: Vec<OrderPlan> = {
        let mut rng = rand::thread_rng();
        (0..args.orders)
            .map(|_| {
                let email = (*CUSTOMERS.choose(&mut rng).expect("customer list is non-empty"))
                    .to_string();
                let item_count = rng.gen_range(1..=3);
                let mut total = dec!(0);
                let items: Vec<OrderItemInput> = (0..item_count)
                    .map(|_| {
                        let product = products
                            .choose(&mut rng)
                            .expect("catalog is non-empty");
                        let quantity = rng.gen_range(1..=3);
                        total += product.price * Decimal::from(quantity);
                        OrderItemInput {
                            product_id: Some(product.id),
                            product_name: product.name.clone(),
                            quantity,
                            price: product.price,
                        }
                    })
                    .collect();
                OrderPlan {
                    email,
                    items,
                    total,
                    status: *statuses.choose(&mut rng).expect("status list is non-empty"),
                    age_days: rng.gen_range(0..180),
                    age_minutes: rng.gen_range(0..1440),
                }
            })
            .collect()
    };

    info!(count = plans.len(), "Seeding orders");
    let now = Utc::now();
    for (i, plan) in plans.into_iter().enumerate() {
        let created_at =
            now - ChronoDuration::days(plan.age_days) - ChronoDuration::minutes(plan.age_minutes);
        services
            .orders
            .create(CreateOrderInput {
                order_number: format!("ORD-{:05}", i + 1),
                customer_email: plan.email,
                items: plan.items,
                total_amount: plan.total,
                status: Some(plan.status),
                created_at: Some(created_at),
            })
            .await
            .context("failed to seed order")?;
    }

    info!("Seed complete");
    Ok(())
}
