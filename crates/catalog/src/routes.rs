//! Catalog HTTP endpoints.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use common::{Pagination, ProductId, ServiceError};
use tower_http::trace::TraceLayer;

use crate::model::{ListProductsQuery, NewProduct, Product, ProductIdsRequest};
use crate::service::CatalogApi;

/// Builds the catalog service router.
pub fn router<S: CatalogApi + 'static>(service: Arc<S>) -> Router {
    Router::new()
        .route("/health", get(common::http::health))
        .route("/products", get(list::<S>).post(create::<S>))
        .route("/products/batch", post(batch::<S>))
        .route("/products/{id}", get(fetch::<S>))
        .with_state(service)
        .layer(TraceLayer::new_for_http())
}

/// POST /products — create a product.
#[tracing::instrument(skip(service, req))]
async fn create<S: CatalogApi>(
    State(service): State<Arc<S>>,
    Json(req): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ServiceError> {
    let product = service.create_product(req).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /products/:id — fetch one product.
#[tracing::instrument(skip(service))]
async fn fetch<S: CatalogApi>(
    State(service): State<Arc<S>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ServiceError> {
    Ok(Json(service.get_product(&ProductId::new(id)).await?))
}

/// GET /products — list, or search when `query` is present.
#[tracing::instrument(skip(service))]
async fn list<S: CatalogApi>(
    State(service): State<Arc<S>>,
    Query(params): Query<ListProductsQuery>,
) -> Result<Json<Vec<Product>>, ServiceError> {
    let page = Pagination::new(params.skip, params.take);
    let products = match params.query {
        Some(query) => service.search_products(&query, page).await?,
        None => service.list_products(page).await?,
    };
    Ok(Json(products))
}

/// POST /products/batch — resolve many ids at once.
#[tracing::instrument(skip(service, req), fields(requested = req.ids.len()))]
async fn batch<S: CatalogApi>(
    State(service): State<Arc<S>>,
    Json(req): Json<ProductIdsRequest>,
) -> Result<Json<Vec<Product>>, ServiceError> {
    Ok(Json(service.get_products_by_ids(&req.ids).await?))
}
