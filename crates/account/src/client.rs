use std::time::Duration;

use async_trait::async_trait;
use common::http::segment;
use common::{AccountId, Pagination, RemoteClient, ServiceError};

use crate::model::{Account, CreateAccountRequest};
use crate::service::AccountApi;

/// Remote account service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpAccountClient {
    remote: RemoteClient,
}

impl HttpAccountClient {
    /// Creates a client for the account service at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            remote: RemoteClient::new("account", base_url, timeout),
        }
    }
}

#[async_trait]
impl AccountApi for HttpAccountClient {
    async fn create_account(&self, name: String) -> Result<Account, ServiceError> {
        self.remote
            .post("/accounts", &CreateAccountRequest { name })
            .await
    }

    async fn get_account(&self, id: &AccountId) -> Result<Account, ServiceError> {
        self.remote
            .get(&format!("/accounts/{}", segment(id.as_str())), &[])
            .await
    }

    async fn list_accounts(&self, page: Pagination) -> Result<Vec<Account>, ServiceError> {
        self.remote
            .get(
                "/accounts",
                &[("skip", page.skip.to_string()), ("take", page.take.to_string())],
            )
            .await
    }
}
