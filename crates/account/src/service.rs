//! The account contract and its local implementation.

use std::sync::Arc;

use async_trait::async_trait;
use common::{AccountId, Pagination, ServiceError};

use crate::model::Account;
use crate::repository::AccountRepository;

/// Operations the account service offers to its callers.
///
/// Implemented locally by [`AccountService`] and remotely by
/// [`crate::HttpAccountClient`], so callers can hold either.
#[async_trait]
pub trait AccountApi: Send + Sync {
    /// Creates an account with a fresh id.
    async fn create_account(&self, name: String) -> Result<Account, ServiceError>;

    /// Fetches an account; `NotFound` if it does not exist.
    async fn get_account(&self, id: &AccountId) -> Result<Account, ServiceError>;

    /// Lists accounts within the clamped window.
    async fn list_accounts(&self, page: Pagination) -> Result<Vec<Account>, ServiceError>;
}

#[async_trait]
impl<T: AccountApi + ?Sized> AccountApi for Arc<T> {
    async fn create_account(&self, name: String) -> Result<Account, ServiceError> {
        (**self).create_account(name).await
    }

    async fn get_account(&self, id: &AccountId) -> Result<Account, ServiceError> {
        (**self).get_account(id).await
    }

    async fn list_accounts(&self, page: Pagination) -> Result<Vec<Account>, ServiceError> {
        (**self).list_accounts(page).await
    }
}

/// Account service backed by a repository.
#[derive(Debug, Clone)]
pub struct AccountService<R: AccountRepository> {
    repository: R,
}

impl<R: AccountRepository> AccountService<R> {
    /// Creates a new account service over the given repository.
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Returns a reference to the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }
}

#[async_trait]
impl<R: AccountRepository> AccountApi for AccountService<R> {
    #[tracing::instrument(skip(self))]
    async fn create_account(&self, name: String) -> Result<Account, ServiceError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::invalid("account name is required"));
        }

        let account = Account {
            id: AccountId::generate(),
            name,
        };
        self.repository.put_account(&account).await?;

        tracing::info!(account_id = %account.id, "account created");
        Ok(account)
    }

    #[tracing::instrument(skip(self))]
    async fn get_account(&self, id: &AccountId) -> Result<Account, ServiceError> {
        if id.is_blank() {
            return Err(ServiceError::invalid("account id is required"));
        }
        self.repository
            .get_account(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("account", id))
    }

    #[tracing::instrument(skip(self))]
    async fn list_accounts(&self, page: Pagination) -> Result<Vec<Account>, ServiceError> {
        let page = page.bounds()?;
        Ok(self.repository.list_accounts(page).await?)
    }
}
