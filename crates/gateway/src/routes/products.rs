//! Product queries and mutations.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use catalog::{NewProduct, Product};
use common::ServiceError;

use crate::gateway::Gateway;
use crate::model::ProductsQuery;

/// GET /products — by `id`, by text `query`, by `ids`, or a plain listing.
#[tracing::instrument(skip(gateway))]
pub async fn list(
    State(gateway): State<Arc<Gateway>>,
    Query(query): Query<ProductsQuery>,
) -> Result<Json<Vec<Product>>, ServiceError> {
    Ok(Json(gateway.products(query).await?))
}

/// POST /products — create a product.
#[tracing::instrument(skip(gateway, input), fields(name = %input.name))]
pub async fn create(
    State(gateway): State<Arc<Gateway>>,
    Json(input): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ServiceError> {
    let product = gateway.create_product(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}
