//! JSON-over-HTTP plumbing shared by every service: the error envelope, its
//! HTTP status mapping, and a small client for calling peer services.

use std::borrow::Cow;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::deadline::with_deadline;
use crate::error::{ErrorKind, ServiceError};

/// Wire representation of an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorKind {
    /// HTTP status used for this kind.
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<&ServiceError> for ErrorBody {
    fn from(err: &ServiceError) -> Self {
        ErrorBody {
            error: ErrorDetail {
                kind: err.kind(),
                message: err.message().to_string(),
            },
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        if kind == ErrorKind::Internal {
            tracing::error!(error = %self, "internal server error");
        }
        (kind.status(), axum::Json(ErrorBody::from(&self))).into_response()
    }
}

/// Binds `addr` and serves `app` until SIGINT/SIGTERM.
pub async fn serve(app: axum::Router, addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(crate::telemetry::shutdown_signal())
        .await?;
    tracing::info!("server shut down gracefully");
    Ok(())
}

/// GET /health — liveness probe.
pub async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

/// Percent-encodes one path segment so an opaque id cannot add segments,
/// a query or a fragment to the request URL.
pub fn segment(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

/// HTTP client for one peer service.
///
/// Built once at start-up and cloned into whatever needs it; the underlying
/// connection pool is shared between clones. Every request runs under the
/// client's own deadline.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    service: &'static str,
    base_url: String,
    http: reqwest::Client,
    timeout: Duration,
}

impl RemoteClient {
    /// Creates a client for `service` rooted at `base_url`.
    pub fn new(service: &'static str, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            service,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            timeout,
        }
    }

    /// Name of the peer service, used in logs and metrics.
    pub fn service(&self) -> &'static str {
        self.service
    }

    /// Per-call deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Issues a GET request with query parameters.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ServiceError> {
        let request = self.http.get(self.url(path)).query(query);
        self.send(request).await
    }

    /// Issues a POST request with a JSON body.
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        let request = self.http.post(self.url(path)).json(body);
        self.send(request).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ServiceError> {
        let service = self.service;
        let started = Instant::now();
        let result = with_deadline(self.timeout, service, async move {
            let response = request.send().await.map_err(|e| {
                tracing::warn!(service, error = %e, "upstream request failed");
                ServiceError::Unavailable(format!("{service} service unreachable"))
            })?;
            decode(service, response).await
        })
        .await;
        metrics::histogram!("upstream_request_duration_seconds", "service" => service)
            .record(started.elapsed().as_secs_f64());
        result
    }
}

async fn decode<T: DeserializeOwned>(
    service: &'static str,
    response: reqwest::Response,
) -> Result<T, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return response.json::<T>().await.map_err(|e| {
            tracing::error!(service, error = %e, "malformed upstream response");
            ServiceError::Internal(format!("malformed response from {service} service"))
        });
    }

    match response.json::<ErrorBody>().await {
        Ok(body) => Err(ServiceError::from_parts(body.error.kind, body.error.message)),
        Err(_) if status.is_server_error() => Err(ServiceError::Unavailable(format!(
            "{service} service returned {status}"
        ))),
        Err(_) => Err(ServiceError::Internal(format!(
            "{service} service returned {status}"
        ))),
    }
}
