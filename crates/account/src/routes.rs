//! Account HTTP endpoints.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use common::{AccountId, Pagination, ServiceError};
use tower_http::trace::TraceLayer;

use crate::model::{Account, CreateAccountRequest};
use crate::service::AccountApi;

/// Builds the account service router.
pub fn router<S: AccountApi + 'static>(service: Arc<S>) -> Router {
    Router::new()
        .route("/health", get(common::http::health))
        .route("/accounts", get(list::<S>).post(create::<S>))
        .route("/accounts/{id}", get(fetch::<S>))
        .with_state(service)
        .layer(TraceLayer::new_for_http())
}

/// POST /accounts — create an account.
#[tracing::instrument(skip(service, req))]
async fn create<S: AccountApi>(
    State(service): State<Arc<S>>,
    Json(req): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<Account>), ServiceError> {
    let account = service.create_account(req.name).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// GET /accounts/:id — fetch one account.
#[tracing::instrument(skip(service))]
async fn fetch<S: AccountApi>(
    State(service): State<Arc<S>>,
    Path(id): Path<String>,
) -> Result<Json<Account>, ServiceError> {
    Ok(Json(service.get_account(&AccountId::new(id)).await?))
}

/// GET /accounts — list accounts.
#[tracing::instrument(skip(service))]
async fn list<S: AccountApi>(
    State(service): State<Arc<S>>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Account>>, ServiceError> {
    Ok(Json(service.list_accounts(page).await?))
}
