use std::time::Duration;

use async_trait::async_trait;
use common::http::segment;
use common::{AccountId, OrderId, Pagination, RemoteClient, ServiceError};

use crate::model::{CreateOrderRequest, Order, RequestedLine};
use crate::service::OrderApi;

/// Remote order service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpOrderClient {
    remote: RemoteClient,
}

impl HttpOrderClient {
    /// Creates a client for the order service at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            remote: RemoteClient::new("order", base_url, timeout),
        }
    }
}

#[async_trait]
impl OrderApi for HttpOrderClient {
    async fn create_order(
        &self,
        account_id: AccountId,
        lines: Vec<RequestedLine>,
    ) -> Result<Order, ServiceError> {
        let body = CreateOrderRequest {
            account_id,
            products: lines,
        };
        self.remote.post("/orders", &body).await
    }

    async fn get_order(&self, id: &OrderId) -> Result<Order, ServiceError> {
        self.remote
            .get(&format!("/orders/{}", segment(id.as_str())), &[])
            .await
    }

    async fn get_orders_for_account(
        &self,
        account_id: &AccountId,
    ) -> Result<Vec<Order>, ServiceError> {
        let path = format!("/accounts/{}/orders", segment(account_id.as_str()));
        self.remote.get(&path, &[]).await
    }

    async fn list_orders(&self, page: Pagination) -> Result<Vec<Order>, ServiceError> {
        self.remote
            .get(
                "/orders",
                &[("skip", page.skip.to_string()), ("take", page.take.to_string())],
            )
            .await
    }
}
