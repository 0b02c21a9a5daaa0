use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{AccountId, Pagination, StoreError};
use tokio::sync::RwLock;

use crate::model::Account;

/// Persistence for account records.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Inserts a new account. Fails with `Conflict` if the id is taken.
    async fn put_account(&self, account: &Account) -> Result<(), StoreError>;

    /// Fetches an account by id.
    async fn get_account(&self, id: &AccountId) -> Result<Option<Account>, StoreError>;

    /// Lists accounts ordered by id, newest first.
    async fn list_accounts(&self, page: Pagination) -> Result<Vec<Account>, StoreError>;
}

/// In-memory account repository for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccountRepository {
    accounts: Arc<RwLock<BTreeMap<AccountId, Account>>>,
}

impl InMemoryAccountRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored accounts.
    pub async fn account_count(&self) -> usize {
        self.accounts.read().await.len()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn put_account(&self, account: &Account) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&account.id) {
            return Err(StoreError::Conflict(account.id.to_string()));
        }
        accounts.insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn get_account(&self, id: &AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.read().await.get(id).cloned())
    }

    async fn list_accounts(&self, page: Pagination) -> Result<Vec<Account>, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(page.window(accounts.values().rev()).cloned().collect())
    }
}
