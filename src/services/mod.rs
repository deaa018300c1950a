pub mod analytics;
pub mod customers;
pub mod orders;
pub mod products;
