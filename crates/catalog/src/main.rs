//! Catalog service entry point.

use std::sync::Arc;

use catalog::{CatalogService, InMemoryProductRepository, PostgresProductRepository};
use common::ServiceConfig;

#[tokio::main]
async fn main() {
    // 1. Configuration and tracing
    let config = ServiceConfig::from_env(8082);
    common::telemetry::init(&config);

    // 2. Storage: PostgreSQL when configured, otherwise in-memory
    let app = match &config.database_url {
        Some(url) => {
            let pool = common::db::connect_with_retry(url, config.database_connect_attempts)
                .await
                .expect("failed to connect to database");
            let repository = PostgresProductRepository::new(pool);
            repository
                .run_migrations()
                .await
                .expect("failed to run migrations");
            catalog::routes::router(Arc::new(CatalogService::new(repository)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory catalog store");
            catalog::routes::router(Arc::new(CatalogService::new(
                InMemoryProductRepository::new(),
            )))
        }
    };

    // 3. Serve
    common::http::serve(app, &config.addr())
        .await
        .expect("server error");
}
