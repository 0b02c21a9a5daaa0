//! Order service entry point.

use std::sync::Arc;

use account::HttpAccountClient;
use catalog::HttpCatalogClient;
use common::ServiceConfig;
use order::{InMemoryOrderRepository, OrderAggregator, PostgresOrderRepository};

#[tokio::main]
async fn main() {
    // 1. Configuration and tracing
    let config = ServiceConfig::from_env(8083);
    common::telemetry::init(&config);

    // 2. Peer services, built once and shared by every request
    let accounts = HttpAccountClient::new(&config.account_url, config.upstream_timeout);
    let catalog = HttpCatalogClient::new(&config.catalog_url, config.upstream_timeout);
    tracing::info!(
        account_url = %config.account_url,
        catalog_url = %config.catalog_url,
        timeout_ms = config.upstream_timeout.as_millis() as u64,
        "peer services configured"
    );

    // 3. Storage: PostgreSQL when configured, otherwise in-memory
    let app = match &config.database_url {
        Some(url) => {
            let pool = common::db::connect_with_retry(url, config.database_connect_attempts)
                .await
                .expect("failed to connect to database");
            let repository = PostgresOrderRepository::new(pool);
            repository
                .run_migrations()
                .await
                .expect("failed to run migrations");
            order::routes::router(Arc::new(OrderAggregator::new(repository, accounts, catalog)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory order store");
            order::routes::router(Arc::new(OrderAggregator::new(
                InMemoryOrderRepository::new(),
                accounts,
                catalog,
            )))
        }
    };

    // 4. Serve
    common::http::serve(app, &config.addr())
        .await
        .expect("server error");
}
