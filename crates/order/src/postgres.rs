use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AccountId, Money, OrderId, Pagination, ProductId, StoreError};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::model::{Order, OrderRow};
use crate::repository::OrderRepository;

const ROW_COLUMNS: &str = r#"
    SELECT o.id, o.account_id, o.created_at, o.total_price,
           op.product_id, op.quantity, op.price, op.name, op.description
    FROM orders o
    JOIN order_products op ON op.order_id = o.id
"#;

/// PostgreSQL-backed order repository.
#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    /// Creates a new PostgreSQL order repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::migrate!("../../migrations/order")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    fn row_to_order_row(row: PgRow) -> Result<OrderRow, StoreError> {
        let quantity: i32 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity).map_err(|e| {
            StoreError::Database(sqlx::Error::ColumnDecode {
                index: "quantity".to_string(),
                source: Box::new(e),
            })
        })?;

        Ok(OrderRow {
            order_id: OrderId::new(row.try_get::<String, _>("id")?),
            account_id: AccountId::new(row.try_get::<String, _>("account_id")?),
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            total_price: Money::new(row.try_get::<Decimal, _>("total_price")?.normalize()),
            product_id: ProductId::new(row.try_get::<String, _>("product_id")?),
            quantity,
            price: row
                .try_get::<Option<Decimal>, _>("price")?
                .map(|p| Money::new(p.normalize())),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
        })
    }

    fn into_rows(rows: Vec<PgRow>) -> Result<Vec<OrderRow>, StoreError> {
        rows.into_iter().map(Self::row_to_order_row).collect()
    }
}

fn map_unique_violation(e: sqlx::Error, key: impl FnOnce() -> String) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return StoreError::Conflict(key());
    }
    StoreError::Database(e)
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id, lines = order.line_items.len()))]
    async fn put_order(&self, order: &Order) -> Result<(), StoreError> {
        // dropping the transaction without commit rolls it back
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders (id, account_id, created_at, total_price) VALUES ($1, $2, $3, $4)",
        )
        .bind(order.id.as_str())
        .bind(order.account_id.as_str())
        .bind(order.created_at)
        .bind(order.total_price.amount())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, || order.id.to_string()))?;

        for (position, item) in order.line_items.iter().enumerate() {
            let quantity = i32::try_from(item.quantity).map_err(|_| {
                StoreError::Aborted(format!("quantity out of range for {}", item.product_id))
            })?;
            sqlx::query(
                r#"
                INSERT INTO order_products
                    (order_id, product_id, position, quantity, price, name, description)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(order.id.as_str())
            .bind(item.product_id.as_str())
            .bind(position as i32)
            .bind(quantity)
            .bind(item.price.amount())
            .bind(&item.name)
            .bind(&item.description)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_unique_violation(e, || format!("{}/{}", order.id, item.product_id)))?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn rows_for_order(&self, id: &OrderId) -> Result<Vec<OrderRow>, StoreError> {
        let sql = format!("{ROW_COLUMNS} WHERE o.id = $1 ORDER BY op.position");
        let rows = sqlx::query(&sql)
            .bind(id.as_str())
            .fetch_all(&self.pool)
            .await?;
        Self::into_rows(rows)
    }

    async fn rows_for_account(&self, account_id: &AccountId) -> Result<Vec<OrderRow>, StoreError> {
        let sql =
            format!("{ROW_COLUMNS} WHERE o.account_id = $1 ORDER BY o.id DESC, op.position");
        let rows = sqlx::query(&sql)
            .bind(account_id.as_str())
            .fetch_all(&self.pool)
            .await?;
        Self::into_rows(rows)
    }

    async fn list_rows(&self, page: Pagination) -> Result<Vec<OrderRow>, StoreError> {
        let sql = format!(
            r#"{ROW_COLUMNS}
            WHERE o.id IN (SELECT id FROM orders ORDER BY id DESC OFFSET $1 LIMIT $2)
            ORDER BY o.id DESC, op.position"#
        );
        let rows = sqlx::query(&sql)
            .bind(page.offset())
            .bind(page.limit())
            .fetch_all(&self.pool)
            .await?;
        Self::into_rows(rows)
    }
}
