//! The catalog contract and its local implementation.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use common::money::MAX_SCALE;
use common::{Pagination, ProductId, ServiceError};

use crate::model::{NewProduct, Product};
use crate::repository::ProductRepository;

/// Operations the catalog service offers to its callers.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Creates a product with a fresh id.
    async fn create_product(&self, product: NewProduct) -> Result<Product, ServiceError>;

    /// Fetches a product; `NotFound` if it does not exist.
    async fn get_product(&self, id: &ProductId) -> Result<Product, ServiceError>;

    /// Lists products within the clamped window.
    async fn list_products(&self, page: Pagination) -> Result<Vec<Product>, ServiceError>;

    /// Resolves many ids in one round trip. Unknown ids are simply absent
    /// from the result, whose order is unspecified.
    async fn get_products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, ServiceError>;

    /// Text search over name and description within the clamped window.
    async fn search_products(
        &self,
        query: &str,
        page: Pagination,
    ) -> Result<Vec<Product>, ServiceError>;
}

#[async_trait]
impl<T: CatalogApi + ?Sized> CatalogApi for Arc<T> {
    async fn create_product(&self, product: NewProduct) -> Result<Product, ServiceError> {
        (**self).create_product(product).await
    }

    async fn get_product(&self, id: &ProductId) -> Result<Product, ServiceError> {
        (**self).get_product(id).await
    }

    async fn list_products(&self, page: Pagination) -> Result<Vec<Product>, ServiceError> {
        (**self).list_products(page).await
    }

    async fn get_products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, ServiceError> {
        (**self).get_products_by_ids(ids).await
    }

    async fn search_products(
        &self,
        query: &str,
        page: Pagination,
    ) -> Result<Vec<Product>, ServiceError> {
        (**self).search_products(query, page).await
    }
}

/// Checks a product before it reaches a store or a remote service.
pub fn validate_new_product(product: &NewProduct) -> Result<(), ServiceError> {
    if product.name.trim().is_empty() {
        return Err(ServiceError::invalid("product name is required"));
    }
    if product.price.is_negative() {
        return Err(ServiceError::invalid(format!(
            "product price must not be negative, got {}",
            product.price
        )));
    }
    if !product.price.is_storable() {
        return Err(ServiceError::invalid(format!(
            "product price {} exceeds 14 integer or {MAX_SCALE} fractional digits",
            product.price
        )));
    }
    Ok(())
}

/// Catalog service backed by a repository.
#[derive(Debug, Clone)]
pub struct CatalogService<R: ProductRepository> {
    repository: R,
}

impl<R: ProductRepository> CatalogService<R> {
    /// Creates a new catalog service over the given repository.
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Returns a reference to the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }
}

#[async_trait]
impl<R: ProductRepository> CatalogApi for CatalogService<R> {
    #[tracing::instrument(skip(self, product), fields(name = %product.name))]
    async fn create_product(&self, product: NewProduct) -> Result<Product, ServiceError> {
        validate_new_product(&product)?;

        let product = Product {
            id: ProductId::generate(),
            name: product.name.trim().to_string(),
            description: product.description,
            price: product.price,
        };
        self.repository.put_product(&product).await?;

        tracing::info!(product_id = %product.id, price = %product.price, "product created");
        Ok(product)
    }

    #[tracing::instrument(skip(self))]
    async fn get_product(&self, id: &ProductId) -> Result<Product, ServiceError> {
        if id.is_blank() {
            return Err(ServiceError::invalid("product id is required"));
        }
        self.repository
            .get_product(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("product", id))
    }

    #[tracing::instrument(skip(self))]
    async fn list_products(&self, page: Pagination) -> Result<Vec<Product>, ServiceError> {
        let page = page.bounds()?;
        Ok(self.repository.list_products(page).await?)
    }

    #[tracing::instrument(skip(self, ids), fields(requested = ids.len()))]
    async fn get_products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, ServiceError> {
        let mut seen = HashSet::new();
        let distinct: Vec<ProductId> = ids
            .iter()
            .filter(|id| seen.insert(*id))
            .cloned()
            .collect();
        if distinct.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.repository.get_products_by_ids(&distinct).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn search_products(
        &self,
        query: &str,
        page: Pagination,
    ) -> Result<Vec<Product>, ServiceError> {
        let page = page.bounds()?;
        if query.trim().is_empty() {
            return Ok(self.repository.list_products(page).await?);
        }
        Ok(self.repository.search_products(query, page).await?)
    }
}
