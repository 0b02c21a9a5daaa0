//! Account service entry point.

use std::sync::Arc;

use account::{AccountService, InMemoryAccountRepository, PostgresAccountRepository};
use common::ServiceConfig;

#[tokio::main]
async fn main() {
    // 1. Configuration and tracing
    let config = ServiceConfig::from_env(8081);
    common::telemetry::init(&config);

    // 2. Storage: PostgreSQL when configured, otherwise in-memory
    let app = match &config.database_url {
        Some(url) => {
            let pool = common::db::connect_with_retry(url, config.database_connect_attempts)
                .await
                .expect("failed to connect to database");
            let repository = PostgresAccountRepository::new(pool);
            repository
                .run_migrations()
                .await
                .expect("failed to run migrations");
            account::routes::router(Arc::new(AccountService::new(repository)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory account store");
            account::routes::router(Arc::new(AccountService::new(
                InMemoryAccountRepository::new(),
            )))
        }
    };

    // 3. Serve
    common::http::serve(app, &config.addr())
        .await
        .expect("server error");
}
