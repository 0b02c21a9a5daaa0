use std::time::Duration;

use async_trait::async_trait;
use common::http::segment;
use common::{Pagination, ProductId, RemoteClient, ServiceError};

use crate::model::{NewProduct, Product, ProductIdsRequest};
use crate::service::CatalogApi;

/// Remote catalog service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    remote: RemoteClient,
}

impl HttpCatalogClient {
    /// Creates a client for the catalog service at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            remote: RemoteClient::new("catalog", base_url, timeout),
        }
    }
}

fn page_query(page: Pagination) -> Vec<(&'static str, String)> {
    vec![("skip", page.skip.to_string()), ("take", page.take.to_string())]
}

#[async_trait]
impl CatalogApi for HttpCatalogClient {
    async fn create_product(&self, product: NewProduct) -> Result<Product, ServiceError> {
        self.remote.post("/products", &product).await
    }

    async fn get_product(&self, id: &ProductId) -> Result<Product, ServiceError> {
        self.remote
            .get(&format!("/products/{}", segment(id.as_str())), &[])
            .await
    }

    async fn list_products(&self, page: Pagination) -> Result<Vec<Product>, ServiceError> {
        self.remote.get("/products", &page_query(page)).await
    }

    async fn get_products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, ServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let body = ProductIdsRequest { ids: ids.to_vec() };
        self.remote.post("/products/batch", &body).await
    }

    async fn search_products(
        &self,
        query: &str,
        page: Pagination,
    ) -> Result<Vec<Product>, ServiceError> {
        let mut params = page_query(page);
        params.push(("query", query.to_string()));
        self.remote.get("/products", &params).await
    }
}
