//! Fan-out and stitching across the account, catalog and order services.
//!
//! Every outbound call runs under its own deadline. A failed root lookup
//! fails the whole request; a failed nested lookup becomes a [`FieldError`]
//! next to the data that did resolve.

use std::sync::Arc;
use std::time::Duration;

use account::{Account, AccountApi};
use catalog::{CatalogApi, NewProduct, Product, validate_new_product};
use common::{AccountId, ProductId, ServiceError, with_deadline};
use futures_util::future::join_all;
use order::{Order, OrderApi, RequestedLine};

use crate::model::{
    AccountView, AccountsQuery, Composed, FieldError, ProductSelector, ProductsQuery,
    page_or_default,
};

/// The composition gateway.
///
/// Holds one client per peer service; clients are built once at start-up and
/// shared by every request.
#[derive(Clone)]
pub struct Gateway {
    accounts: Arc<dyn AccountApi>,
    catalog: Arc<dyn CatalogApi>,
    orders: Arc<dyn OrderApi>,
    deadline: Duration,
}

impl Gateway {
    /// Creates a gateway over the three services with a per-call deadline.
    pub fn new(
        accounts: Arc<dyn AccountApi>,
        catalog: Arc<dyn CatalogApi>,
        orders: Arc<dyn OrderApi>,
        deadline: Duration,
    ) -> Self {
        Self {
            accounts,
            catalog,
            orders,
            deadline,
        }
    }

    /// Per-call deadline.
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Resolves one account and, optionally, its orders.
    #[tracing::instrument(skip(self))]
    pub async fn account(
        &self,
        id: &AccountId,
        with_orders: bool,
    ) -> Result<Composed<AccountView>, ServiceError> {
        let account = self.fetch_account(id).await?;
        let mut composed = Composed::new(AccountView::from(account));
        if with_orders {
            let (orders, error) = self.stitch_orders(&composed.data.id, "account.orders").await;
            composed.data.orders = orders;
            composed.errors.extend(error);
        }
        Ok(composed)
    }

    /// Resolves a single account by id or a page of accounts, each with its
    /// orders loaded concurrently.
    #[tracing::instrument(skip(self))]
    pub async fn accounts(
        &self,
        query: AccountsQuery,
    ) -> Result<Composed<Vec<AccountView>>, ServiceError> {
        let accounts: Vec<Account> = match query.id.as_deref().filter(|id| !id.trim().is_empty()) {
            Some(id) => vec![self.fetch_account(&AccountId::new(id)).await?],
            None => {
                let page = page_or_default(query.skip, query.take);
                with_deadline(
                    self.deadline,
                    "account.list",
                    self.accounts.list_accounts(page),
                )
                .await?
            }
        };

        let mut views: Vec<AccountView> = accounts.into_iter().map(AccountView::from).collect();
        let mut errors = Vec::new();

        if query.orders.unwrap_or(true) {
            let lookups = views.iter().enumerate().map(|(i, view)| {
                let path = format!("accounts[{i}].orders");
                async move { self.stitch_orders(&view.id, &path).await }
            });
            let results = join_all(lookups).await;

            for (view, (orders, error)) in views.iter_mut().zip(results) {
                view.orders = orders;
                errors.extend(error);
            }
        }

        Ok(Composed {
            data: views,
            errors,
        })
    }

    /// Answers a products request with exactly one catalog call.
    #[tracing::instrument(skip(self))]
    pub async fn products(&self, query: ProductsQuery) -> Result<Vec<Product>, ServiceError> {
        let catalog = &self.catalog;
        match query.selector() {
            ProductSelector::ById(id) => {
                let product = with_deadline(
                    self.deadline,
                    "catalog.get",
                    catalog.get_product(&ProductId::new(id)),
                )
                .await?;
                Ok(vec![product])
            }
            ProductSelector::Search(text, page) => {
                with_deadline(
                    self.deadline,
                    "catalog.search",
                    catalog.search_products(&text, page),
                )
                .await
            }
            ProductSelector::ByIds(ids) => {
                let ids: Vec<ProductId> = ids.into_iter().map(ProductId::new).collect();
                with_deadline(
                    self.deadline,
                    "catalog.get_by_ids",
                    catalog.get_products_by_ids(&ids),
                )
                .await
            }
            ProductSelector::List(page) => {
                with_deadline(self.deadline, "catalog.list", catalog.list_products(page)).await
            }
        }
    }

    /// Creates an account.
    #[tracing::instrument(skip(self))]
    pub async fn create_account(&self, name: &str) -> Result<Account, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::invalid("account name is required"));
        }
        with_deadline(
            self.deadline,
            "account.create",
            self.accounts.create_account(name.to_string()),
        )
        .await
    }

    /// Creates a product.
    #[tracing::instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create_product(&self, product: NewProduct) -> Result<Product, ServiceError> {
        validate_new_product(&product)?;
        with_deadline(
            self.deadline,
            "catalog.create",
            self.catalog.create_product(product),
        )
        .await
    }

    /// Places an order.
    #[tracing::instrument(skip(self, lines), fields(requested = lines.len()))]
    pub async fn create_order(
        &self,
        account_id: AccountId,
        lines: Vec<RequestedLine>,
    ) -> Result<Order, ServiceError> {
        validate_order_input(&account_id, &lines)?;
        with_deadline(
            self.deadline,
            "order.create",
            self.orders.create_order(account_id, lines),
        )
        .await
    }

    async fn fetch_account(&self, id: &AccountId) -> Result<Account, ServiceError> {
        if id.is_blank() {
            return Err(ServiceError::invalid("account id is required"));
        }
        with_deadline(self.deadline, "account.get", self.accounts.get_account(id)).await
    }

    /// Loads the orders of one account, turning a failure into a field error.
    async fn stitch_orders(
        &self,
        account_id: &AccountId,
        path: &str,
    ) -> (Option<Vec<Order>>, Option<FieldError>) {
        let result = with_deadline(
            self.deadline,
            "order.for_account",
            self.orders.get_orders_for_account(account_id),
        )
        .await;

        match result {
            Ok(orders) => (Some(orders), None),
            Err(e) => {
                metrics::counter!("gateway_field_errors_total", "field" => "orders").increment(1);
                tracing::warn!(%account_id, path, error = %e, "orders unavailable for account");
                (None, Some(FieldError::new(path, &e)))
            }
        }
    }
}

/// Rejects order input that no service would accept.
pub fn validate_order_input(
    account_id: &AccountId,
    lines: &[RequestedLine],
) -> Result<(), ServiceError> {
    if account_id.is_blank() {
        return Err(ServiceError::invalid("account id is required"));
    }
    if lines.is_empty() {
        return Err(ServiceError::invalid("order must contain at least one product"));
    }
    for line in lines {
        if line.product_id.is_blank() {
            return Err(ServiceError::invalid("product id is required"));
        }
        if line.quantity <= 0 {
            return Err(ServiceError::invalid(format!(
                "invalid quantity {} for product {}",
                line.quantity, line.product_id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_input_validation() {
        let account = AccountId::new("A1");
        assert!(validate_order_input(&account, &[RequestedLine::new("P1", 1)]).is_ok());
        assert!(validate_order_input(&account, &[]).is_err());
        assert!(validate_order_input(&account, &[RequestedLine::new("P1", 0)]).is_err());
        assert!(validate_order_input(&account, &[RequestedLine::new("P1", -1)]).is_err());
        assert!(validate_order_input(&AccountId::new(" "), &[RequestedLine::new("P1", 1)]).is_err());
    }
}
