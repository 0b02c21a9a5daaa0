pub mod accounts;
pub mod metrics;
pub mod orders;
pub mod products;
