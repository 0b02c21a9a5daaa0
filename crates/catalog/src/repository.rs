use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use common::{Money, Pagination, ProductId, StoreError};
use tokio::sync::RwLock;

use crate::model::Product;

/// Persistence for product records.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Inserts a new product. Fails with `Conflict` if the id is taken.
    async fn put_product(&self, product: &Product) -> Result<(), StoreError>;

    /// Fetches a product by id.
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError>;

    /// Lists products ordered by id, newest first.
    async fn list_products(&self, page: Pagination) -> Result<Vec<Product>, StoreError>;

    /// Fetches every product whose id is in `ids`. Missing ids are skipped;
    /// result order is unspecified.
    async fn get_products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, StoreError>;

    /// Lists products whose name or description match `query`.
    async fn search_products(
        &self,
        query: &str,
        page: Pagination,
    ) -> Result<Vec<Product>, StoreError>;
}

/// In-memory product repository for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductRepository {
    products: Arc<RwLock<BTreeMap<ProductId, Product>>>,
}

impl InMemoryProductRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Changes the current price of a product. Returns false if it is unknown.
    pub async fn set_price(&self, id: &ProductId, price: Money) -> bool {
        match self.products.write().await.get_mut(id) {
            Some(product) => {
                product.price = price;
                true
            }
            None => false,
        }
    }

    /// Removes a product, as if it had been retired from the catalog.
    pub async fn remove_product(&self, id: &ProductId) -> Option<Product> {
        self.products.write().await.remove(id)
    }

    /// Returns the number of stored products.
    pub async fn product_count(&self) -> usize {
        self.products.read().await.len()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn put_product(&self, product: &Product) -> Result<(), StoreError> {
        let mut products = self.products.write().await;
        if products.contains_key(&product.id) {
            return Err(StoreError::Conflict(product.id.to_string()));
        }
        products.insert(product.id.clone(), product.clone());
        Ok(())
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.products.read().await.get(id).cloned())
    }

    async fn list_products(&self, page: Pagination) -> Result<Vec<Product>, StoreError> {
        let products = self.products.read().await;
        Ok(page.window(products.values().rev()).cloned().collect())
    }

    async fn get_products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, StoreError> {
        let wanted: HashSet<&ProductId> = ids.iter().collect();
        let products = self.products.read().await;
        Ok(products
            .values()
            .filter(|p| wanted.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn search_products(
        &self,
        query: &str,
        page: Pagination,
    ) -> Result<Vec<Product>, StoreError> {
        let products = self.products.read().await;
        let hits = products.values().rev().filter(|p| p.matches(query));
        Ok(page.window(hits).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, name: &str, cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            description: String::new(),
            price: Money::from_cents(cents),
        }
    }

    #[tokio::test]
    async fn bulk_lookup_skips_missing_ids() {
        let repo = InMemoryProductRepository::new();
        repo.put_product(&product("P1", "Widget", 999)).await.unwrap();
        repo.put_product(&product("P2", "Gadget", 450)).await.unwrap();

        let found = repo
            .get_products_by_ids(&[ProductId::new("P2"), ProductId::new("P9")])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, ProductId::new("P2"));
    }

    #[tokio::test]
    async fn search_filters_then_windows() {
        let repo = InMemoryProductRepository::new();
        repo.put_product(&product("P1", "Red Widget", 100)).await.unwrap();
        repo.put_product(&product("P2", "Blue Widget", 100)).await.unwrap();
        repo.put_product(&product("P3", "Gadget", 100)).await.unwrap();

        let hits = repo
            .search_products("widget", Pagination::new(0, 10))
            .await
            .unwrap();
        let ids: Vec<_> = hits.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["P2", "P1"]);
    }

    #[tokio::test]
    async fn price_changes_and_removal() {
        let repo = InMemoryProductRepository::new();
        repo.put_product(&product("P1", "Widget", 999)).await.unwrap();

        assert!(repo.set_price(&ProductId::new("P1"), Money::from_cents(1299)).await);
        let p = repo.get_product(&ProductId::new("P1")).await.unwrap().unwrap();
        assert_eq!(p.price, Money::from_cents(1299));

        assert!(repo.remove_product(&ProductId::new("P1")).await.is_some());
        assert_eq!(repo.product_count().await, 0);
        assert!(!repo.set_price(&ProductId::new("P1"), Money::zero()).await);
    }
}
