//! Account queries and mutations.

use std::sync::Arc;

use account::Account;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{AccountId, ServiceError};

use crate::gateway::Gateway;
use crate::model::{AccountQuery, AccountView, AccountsQuery, Composed, CreateAccountInput};

/// GET /accounts — one account by `id`, or a page of accounts, with orders.
#[tracing::instrument(skip(gateway))]
pub async fn list(
    State(gateway): State<Arc<Gateway>>,
    Query(query): Query<AccountsQuery>,
) -> Result<Json<Composed<Vec<AccountView>>>, ServiceError> {
    Ok(Json(gateway.accounts(query).await?))
}

/// GET /accounts/:id — one account with its orders.
#[tracing::instrument(skip(gateway))]
pub async fn get(
    State(gateway): State<Arc<Gateway>>,
    Path(id): Path<String>,
    Query(query): Query<AccountQuery>,
) -> Result<Json<Composed<AccountView>>, ServiceError> {
    let composed = gateway
        .account(&AccountId::new(id), query.orders.unwrap_or(true))
        .await?;
    Ok(Json(composed))
}

/// POST /accounts — create an account.
#[tracing::instrument(skip(gateway, input))]
pub async fn create(
    State(gateway): State<Arc<Gateway>>,
    Json(input): Json<CreateAccountInput>,
) -> Result<(StatusCode, Json<Account>), ServiceError> {
    let account = gateway.create_account(&input.name).await?;
    Ok((StatusCode::CREATED, Json(account)))
}
