//! Per-call deadlines for outbound requests.

use std::future::Future;
use std::time::Duration;

use crate::error::ServiceError;

/// Default deadline for a single call to a peer service.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(3);

/// Runs `fut` under its own deadline.
///
/// An elapsed deadline drops the in-flight call and is reported as
/// [`ServiceError::Unavailable`]. Sibling calls are unaffected.
pub async fn with_deadline<F, T>(
    deadline: Duration,
    operation: &'static str,
    fut: F,
) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, deadline_ms = deadline.as_millis() as u64, "deadline exceeded");
            metrics::counter!("upstream_deadline_exceeded_total", "operation" => operation)
                .increment(1);
            Err(ServiceError::Unavailable(format!(
                "{operation}: deadline exceeded after {}ms",
                deadline.as_millis()
            )))
        }
    }
}
