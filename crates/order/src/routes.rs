//! Order HTTP endpoints.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use common::{AccountId, OrderId, Pagination, ServiceError};
use tower_http::trace::TraceLayer;

use crate::model::{CreateOrderRequest, Order};
use crate::service::OrderApi;

/// Builds the order service router.
pub fn router<S: OrderApi + 'static>(service: Arc<S>) -> Router {
    Router::new()
        .route("/health", get(common::http::health))
        .route("/orders", get(list::<S>).post(create::<S>))
        .route("/orders/{id}", get(fetch::<S>))
        .route("/accounts/{id}/orders", get(for_account::<S>))
        .with_state(service)
        .layer(TraceLayer::new_for_http())
}

/// POST /orders — place an order.
#[tracing::instrument(skip(service, req), fields(account_id = %req.account_id))]
async fn create<S: OrderApi>(
    State(service): State<Arc<S>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ServiceError> {
    let order = service.create_order(req.account_id, req.products).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders/:id — fetch one order.
#[tracing::instrument(skip(service))]
async fn fetch<S: OrderApi>(
    State(service): State<Arc<S>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ServiceError> {
    Ok(Json(service.get_order(&OrderId::new(id)).await?))
}

/// GET /orders — list orders.
#[tracing::instrument(skip(service))]
async fn list<S: OrderApi>(
    State(service): State<Arc<S>>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Order>>, ServiceError> {
    Ok(Json(service.list_orders(page).await?))
}

/// GET /accounts/:id/orders — every order of one account.
#[tracing::instrument(skip(service))]
async fn for_account<S: OrderApi>(
    State(service): State<Arc<S>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Order>>, ServiceError> {
    Ok(Json(
        service.get_orders_for_account(&AccountId::new(id)).await?,
    ))
}
