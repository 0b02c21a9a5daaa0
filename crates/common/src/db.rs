//! PostgreSQL pool bootstrap.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Connects to PostgreSQL, retrying while the database comes up.
///
/// Gives up after `attempts` tries (at least one) and returns the last error.
pub async fn connect_with_retry(url: &str, attempts: u32) -> Result<PgPool, sqlx::Error> {
    let attempts = attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        let result = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await;
        match result {
            Ok(pool) => {
                tracing::info!(attempt, "connected to database");
                return Ok(pool);
            }
            Err(e) if attempt < attempts => {
                tracing::warn!(attempt, attempts, error = %e, "database not ready, retrying");
                tokio::time::sleep(RETRY_DELAY).await;
            }
            Err(e) => return Err(e),
        }
    }
}
