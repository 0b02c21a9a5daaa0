//! Order aggregator: owns orders and their line items.
//!
//! Writes validate the account and snapshot catalog data before storing the
//! order in one transaction. Reads rebuild nested orders from join rows (see
//! [`reconstruct`]) and refresh their display fields from the catalog.

pub mod client;
pub mod error;
pub mod model;
pub mod postgres;
pub mod reconstruct;
pub mod repository;
pub mod routes;
pub mod service;

pub use client::HttpOrderClient;
pub use error::OrderError;
pub use model::{CreateOrderRequest, LineItem, MAX_QUANTITY, Order, OrderRow, RequestedLine};
pub use postgres::PostgresOrderRepository;
pub use repository::{InMemoryOrderRepository, OrderRepository};
pub use service::{OrderAggregator, OrderApi, merge_lines};
