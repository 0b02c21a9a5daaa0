use async_trait::async_trait;
use common::{Money, Pagination, ProductId, StoreError};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::model::Product;
use crate::repository::ProductRepository;

/// PostgreSQL-backed product repository.
#[derive(Clone)]
pub struct PostgresProductRepository {
    pool: PgPool,
}

impl PostgresProductRepository {
    /// Creates a new PostgreSQL product repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::migrate!("../../migrations/catalog")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    fn row_to_product(row: PgRow) -> Result<Product, StoreError> {
        Ok(Product {
            id: ProductId::new(row.try_get::<String, _>("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            // NUMERIC pads to the column scale
            price: Money::new(row.try_get::<Decimal, _>("price")?.normalize()),
        })
    }
}

#[async_trait]
impl ProductRepository for PostgresProductRepository {
    async fn put_product(&self, product: &Product) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO products (id, name, description, price) VALUES ($1, $2, $3, $4)")
            .bind(product.id.as_str())
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price.amount())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return StoreError::Conflict(product.id.to_string());
                }
                StoreError::Database(e)
            })?;
        Ok(())
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query("SELECT id, name, description, price FROM products WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn list_products(&self, page: Pagination) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, price
            FROM products
            ORDER BY id DESC
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(page.offset())
        .bind(page.limit())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn get_products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, StoreError> {
        let ids: Vec<&str> = ids.iter().map(ProductId::as_str).collect();
        let rows =
            sqlx::query("SELECT id, name, description, price FROM products WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn search_products(
        &self,
        query: &str,
        page: Pagination,
    ) -> Result<Vec<Product>, StoreError> {
        // every term must appear in the name or the description
        let patterns: Vec<String> = query
            .split_whitespace()
            .map(|term| format!("%{}%", escape_like(term)))
            .collect();

        let rows = sqlx::query(
            r#"
            SELECT id, name, description, price
            FROM products p
            WHERE NOT EXISTS (
                SELECT 1 FROM unnest($1::text[]) AS t(pattern)
                WHERE p.name NOT ILIKE t.pattern AND p.description NOT ILIKE t.pattern
            )
            ORDER BY id DESC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(patterns)
        .bind(page.offset())
        .bind(page.limit())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
