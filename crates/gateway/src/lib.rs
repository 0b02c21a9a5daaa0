//! Composition gateway.
//!
//! One query and mutation surface over the account, catalog and order
//! services. Account reads fan out to the order service and stitch the
//! results together; partial failures are reported per field.

pub mod gateway;
pub mod model;
pub mod routes;

use std::sync::Arc;

use account::HttpAccountClient;
use axum::Router;
use axum::routing::get;
use catalog::HttpCatalogClient;
use common::ServiceConfig;
use metrics_exporter_prometheus::PrometheusHandle;
use order::HttpOrderClient;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use gateway::{Gateway, validate_order_input};
pub use model::{AccountView, Composed, FieldError, ProductSelector};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(gateway: Arc<Gateway>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(common::http::health))
        .route(
            "/accounts",
            get(routes::accounts::list).post(routes::accounts::create),
        )
        .route("/accounts/{id}", get(routes::accounts::get))
        .route(
            "/products",
            get(routes::products::list).post(routes::products::create),
        )
        .route("/orders", axum::routing::post(routes::orders::create))
        .with_state(gateway)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Builds a gateway that reaches every service over HTTP.
pub fn remote_gateway(config: &ServiceConfig) -> Gateway {
    let timeout = config.upstream_timeout;
    Gateway::new(
        Arc::new(HttpAccountClient::new(&config.account_url, timeout)),
        Arc::new(HttpCatalogClient::new(&config.catalog_url, timeout)),
        Arc::new(HttpOrderClient::new(&config.order_url, timeout)),
        timeout,
    )
}
