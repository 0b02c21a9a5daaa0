use async_trait::async_trait;
use common::{AccountId, Pagination, StoreError};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::model::Account;
use crate::repository::AccountRepository;

/// PostgreSQL-backed account repository.
#[derive(Clone)]
pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    /// Creates a new PostgreSQL account repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::migrate!("../../migrations/account")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    fn row_to_account(row: PgRow) -> Result<Account, StoreError> {
        Ok(Account {
            id: AccountId::new(row.try_get::<String, _>("id")?),
            name: row.try_get("name")?,
        })
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn put_account(&self, account: &Account) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO accounts (id, name) VALUES ($1, $2)")
            .bind(account.id.as_str())
            .bind(&account.name)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return StoreError::Conflict(account.id.to_string());
                }
                StoreError::Database(e)
            })?;
        Ok(())
    }

    async fn get_account(&self, id: &AccountId) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query("SELECT id, name FROM accounts WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_account).transpose()
    }

    async fn list_accounts(&self, page: Pagination) -> Result<Vec<Account>, StoreError> {
        let rows = sqlx::query("SELECT id, name FROM accounts ORDER BY id DESC OFFSET $1 LIMIT $2")
            .bind(page.offset())
            .bind(page.limit())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_account).collect()
    }
}
