//! Order mutation.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::ServiceError;
use order::{CreateOrderRequest, Order};

use crate::gateway::Gateway;

/// POST /orders — place an order for an account.
#[tracing::instrument(skip(gateway, req), fields(account_id = %req.account_id))]
pub async fn create(
    State(gateway): State<Arc<Gateway>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ServiceError> {
    let order = gateway.create_order(req.account_id, req.products).await?;
    Ok((StatusCode::CREATED, Json(order)))
}
