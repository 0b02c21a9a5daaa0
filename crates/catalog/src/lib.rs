//! Catalog store: owns product records (name, description, price) and exposes
//! create/get/list/list-by-ids/search.

pub mod client;
pub mod model;
pub mod postgres;
pub mod repository;
pub mod routes;
pub mod service;

pub use client::HttpCatalogClient;
pub use model::{ListProductsQuery, NewProduct, Product, ProductIdsRequest};
pub use postgres::PostgresProductRepository;
pub use repository::{InMemoryProductRepository, ProductRepository};
pub use service::{CatalogApi, CatalogService, validate_new_product};
