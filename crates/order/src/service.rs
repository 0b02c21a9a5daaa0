//! The order contract and the aggregator that implements it.
//!
//! Placing an order validates the account and resolves every product before
//! anything is written. Reads rebuild orders from storage rows and refresh
//! their display fields with one bulk catalog call.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use account::AccountApi;
use async_trait::async_trait;
use catalog::{CatalogApi, Product};
use chrono::Utc;
use common::{AccountId, OrderId, Pagination, ProductId, ServiceError};

use crate::error::OrderError;
use crate::model::{LineItem, MAX_QUANTITY, Order, RequestedLine};
use crate::reconstruct::{apply_catalog, reconstruct, referenced_products};
use crate::repository::OrderRepository;

/// Operations the order service offers to its callers.
///
/// Implemented locally by [`OrderAggregator`] and remotely by
/// [`crate::HttpOrderClient`].
#[async_trait]
pub trait OrderApi: Send + Sync {
    /// Validates and stores a new order for `account_id`.
    async fn create_order(
        &self,
        account_id: AccountId,
        lines: Vec<RequestedLine>,
    ) -> Result<Order, ServiceError>;

    /// Fetches one order; `NotFound` if it does not exist.
    async fn get_order(&self, id: &OrderId) -> Result<Order, ServiceError>;

    /// Every order placed by an account, newest first.
    async fn get_orders_for_account(&self, account_id: &AccountId)
    -> Result<Vec<Order>, ServiceError>;

    /// Orders within the clamped window, newest first.
    async fn list_orders(&self, page: Pagination) -> Result<Vec<Order>, ServiceError>;
}

#[async_trait]
impl<T: OrderApi + ?Sized> OrderApi for Arc<T> {
    async fn create_order(
        &self,
        account_id: AccountId,
        lines: Vec<RequestedLine>,
    ) -> Result<Order, ServiceError> {
        (**self).create_order(account_id, lines).await
    }

    async fn get_order(&self, id: &OrderId) -> Result<Order, ServiceError> {
        (**self).get_order(id).await
    }

    async fn get_orders_for_account(
        &self,
        account_id: &AccountId,
    ) -> Result<Vec<Order>, ServiceError> {
        (**self).get_orders_for_account(account_id).await
    }

    async fn list_orders(&self, page: Pagination) -> Result<Vec<Order>, ServiceError> {
        (**self).list_orders(page).await
    }
}

/// Merges requested lines by product and checks their quantities.
///
/// Quantities of repeated products are summed and the first occurrence keeps
/// its position. Every kept line has a positive quantity.
pub fn merge_lines(lines: &[RequestedLine]) -> Result<Vec<(ProductId, u32)>, OrderError> {
    if lines.is_empty() {
        return Err(OrderError::EmptyOrder);
    }

    let mut merged: Vec<(ProductId, i64)> = Vec::with_capacity(lines.len());
    let mut slots: HashMap<&ProductId, usize> = HashMap::new();

    for (position, line) in lines.iter().enumerate() {
        if line.product_id.is_blank() {
            return Err(OrderError::MissingProduct { position });
        }
        if line.quantity <= 0 {
            return Err(OrderError::InvalidQuantity {
                product_id: line.product_id.clone(),
                quantity: line.quantity,
            });
        }
        match slots.get(&line.product_id) {
            Some(&slot) => merged[slot].1 = merged[slot].1.saturating_add(line.quantity),
            None => {
                slots.insert(&line.product_id, merged.len());
                merged.push((line.product_id.clone(), line.quantity));
            }
        }
    }

    merged
        .into_iter()
        .map(|(product_id, quantity)| match u32::try_from(quantity) {
            Ok(q) if q <= MAX_QUANTITY => Ok((product_id, q)),
            _ => Err(OrderError::InvalidQuantity {
                product_id,
                quantity,
            }),
        })
        .collect()
}

/// Order service that validates against the account and catalog services.
pub struct OrderAggregator<R, A, C>
where
    R: OrderRepository,
    A: AccountApi,
    C: CatalogApi,
{
    repository: R,
    accounts: A,
    catalog: C,
}

impl<R, A, C> OrderAggregator<R, A, C>
where
    R: OrderRepository,
    A: AccountApi,
    C: CatalogApi,
{
    /// Creates an aggregator over a store and the two peer services.
    pub fn new(repository: R, accounts: A, catalog: C) -> Self {
        Self {
            repository,
            accounts,
            catalog,
        }
    }

    /// Returns a reference to the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Places an order, recording success and failure metrics.
    #[tracing::instrument(skip(self, lines), fields(account_id = %account_id, requested = lines.len()))]
    pub async fn place_order(
        &self,
        account_id: AccountId,
        lines: Vec<RequestedLine>,
    ) -> Result<Order, OrderError> {
        let started = Instant::now();
        let result = self.try_place_order(account_id, &lines).await;
        metrics::histogram!("order_create_duration_seconds").record(started.elapsed().as_secs_f64());

        match &result {
            Ok(order) => {
                metrics::counter!("orders_created_total").increment(1);
                tracing::info!(
                    order_id = %order.id,
                    total_price = %order.total_price,
                    line_items = order.line_items.len(),
                    "order created"
                );
            }
            Err(e) => {
                metrics::counter!("order_create_failures_total", "reason" => e.reason())
                    .increment(1);
                tracing::warn!(error = %e, reason = e.reason(), "order rejected");
            }
        }
        result
    }

    async fn try_place_order(
        &self,
        account_id: AccountId,
        lines: &[RequestedLine],
    ) -> Result<Order, OrderError> {
        if account_id.is_blank() {
            return Err(OrderError::MissingAccount);
        }
        let merged = merge_lines(lines)?;

        // 1. The account must exist
        match self.accounts.get_account(&account_id).await {
            Ok(_) => {}
            Err(ServiceError::NotFound(_)) => return Err(OrderError::AccountInvalid(account_id)),
            Err(e) => return Err(OrderError::Upstream(e)),
        }

        // 2. Resolve every product with one call
        let ids: Vec<ProductId> = merged.iter().map(|(id, _)| id.clone()).collect();
        let products = self
            .catalog
            .get_products_by_ids(&ids)
            .await
            .map_err(OrderError::Upstream)?;
        let by_id: HashMap<&ProductId, &Product> = products.iter().map(|p| (&p.id, p)).collect();

        let missing: Vec<ProductId> = ids
            .iter()
            .filter(|id| !by_id.contains_key(id))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(OrderError::ProductsNotFound(missing));
        }

        // 3. Snapshot catalog data into the line items
        let line_items: Vec<LineItem> = merged
            .into_iter()
            .filter_map(|(product_id, quantity)| {
                let product = by_id.get(&product_id)?;
                Some(LineItem {
                    price: product.price,
                    name: product.name.clone(),
                    description: product.description.clone(),
                    product_id,
                    quantity,
                })
            })
            .collect();

        // Prices and total must fit the stored NUMERIC(18,4) columns
        let total_price = Order::line_total(&line_items)
            .filter(|total| {
                total.is_storable() && line_items.iter().all(|item| item.price.is_storable())
            })
            .ok_or(OrderError::TotalOutOfRange)?;

        let order = Order {
            id: OrderId::generate(),
            account_id,
            created_at: Utc::now(),
            total_price,
            line_items,
        };

        // 4. Header and lines in one transaction
        self.repository.put_order(&order).await?;
        Ok(order)
    }

    /// Fetches and enriches one order.
    #[tracing::instrument(skip(self))]
    pub async fn find_order(&self, id: &OrderId) -> Result<Order, OrderError> {
        let rows = self.repository.rows_for_order(id).await?;
        let mut orders = reconstruct(rows);
        if orders.is_empty() {
            return Err(OrderError::NotFound(id.clone()));
        }
        self.enrich(&mut orders).await;
        Ok(orders.swap_remove(0))
    }

    /// Fetches and enriches every order of an account.
    #[tracing::instrument(skip(self))]
    pub async fn orders_for_account(&self, account_id: &AccountId) -> Result<Vec<Order>, OrderError> {
        if account_id.is_blank() {
            return Err(OrderError::MissingAccount);
        }
        let rows = self.repository.rows_for_account(account_id).await?;
        let mut orders = reconstruct(rows);
        self.enrich(&mut orders).await;
        tracing::debug!(orders = orders.len(), "orders loaded");
        Ok(orders)
    }

    /// Fetches and enriches a window of orders.
    #[tracing::instrument(skip(self))]
    pub async fn orders_page(&self, page: Pagination) -> Result<Vec<Order>, OrderError> {
        let page = page
            .bounds()
            .map_err(|e| OrderError::InvalidPage(e.message().to_string()))?;
        let rows = self.repository.list_rows(page).await?;
        let mut orders = reconstruct(rows);
        self.enrich(&mut orders).await;
        Ok(orders)
    }

    /// Refreshes line items from the catalog with one bulk call.
    ///
    /// Never fails: unknown products and an unreachable catalog both leave
    /// the stored snapshot in place.
    async fn enrich(&self, orders: &mut [Order]) {
        let ids = referenced_products(orders);
        if ids.is_empty() {
            return;
        }

        match self.catalog.get_products_by_ids(&ids).await {
            Ok(products) => {
                let missing = apply_catalog(orders, &products);
                if !missing.is_empty() {
                    metrics::counter!("order_enrichment_misses_total")
                        .increment(missing.len() as u64);
                    tracing::warn!(missing = ?missing, "products no longer in catalog, keeping snapshot");
                }
            }
            Err(e) => {
                metrics::counter!("order_enrichment_misses_total").increment(ids.len() as u64);
                tracing::warn!(error = %e, products = ids.len(), "catalog enrichment skipped");
            }
        }
    }
}

#[async_trait]
impl<R, A, C> OrderApi for OrderAggregator<R, A, C>
where
    R: OrderRepository,
    A: AccountApi,
    C: CatalogApi,
{
    async fn create_order(
        &self,
        account_id: AccountId,
        lines: Vec<RequestedLine>,
    ) -> Result<Order, ServiceError> {
        Ok(self.place_order(account_id, lines).await?)
    }

    async fn get_order(&self, id: &OrderId) -> Result<Order, ServiceError> {
        Ok(self.find_order(id).await?)
    }

    async fn get_orders_for_account(
        &self,
        account_id: &AccountId,
    ) -> Result<Vec<Order>, ServiceError> {
        Ok(self.orders_for_account(account_id).await?)
    }

    async fn list_orders(&self, page: Pagination) -> Result<Vec<Order>, ServiceError> {
        Ok(self.orders_page(page).await?)
    }
}
