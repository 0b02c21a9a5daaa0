//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p order --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use chrono::{DurationRound, TimeDelta, Utc};
use common::{AccountId, Money, OrderId, Pagination, ProductId, StoreError};
use order::reconstruct::reconstruct;
use order::{LineItem, Order, OrderRepository, PostgresOrderRepository};
use serial_test::serial;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();
            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();
            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let pool = sqlx::PgPool::connect(&connection_string).await.unwrap();
            PostgresOrderRepository::new(pool.clone())
                .run_migrations()
                .await
                .unwrap();
            pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

async fn get_test_repository() -> PostgresOrderRepository {
    let info = get_container_info().await;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE order_products, orders")
        .execute(&pool)
        .await
        .unwrap();

    PostgresOrderRepository::new(pool)
}

fn line(product: &str, quantity: u32, cents: i64) -> LineItem {
    LineItem {
        product_id: ProductId::new(product),
        quantity,
        price: Money::from_cents(cents),
        name: format!("{product} name"),
        description: String::new(),
    }
}

fn order(id: &str, account: &str, line_items: Vec<LineItem>) -> Order {
    Order {
        id: OrderId::new(id),
        account_id: AccountId::new(account),
        // PostgreSQL keeps microseconds
        created_at: Utc::now()
            .duration_trunc(TimeDelta::microseconds(1))
            .unwrap(),
        total_price: Order::line_total(&line_items).unwrap(),
        line_items,
    }
}

async fn order_count(repo: &PostgresOrderRepository) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(repo.pool())
        .await
        .unwrap()
}

#[tokio::test]
#[serial]
async fn stored_order_reconstructs_identically() {
    let repo = get_test_repository().await;
    let placed = order("O1", "A1", vec![line("P2", 2, 999), line("P1", 1, 450)]);
    repo.put_order(&placed).await.unwrap();

    let rows = repo.rows_for_order(&placed.id).await.unwrap();
    let orders = reconstruct(rows);
    assert_eq!(orders, vec![placed]);
    assert_eq!(orders[0].total_price.to_string(), "24.48");
}

#[tokio::test]
#[serial]
async fn account_rows_are_newest_first_with_lines_in_insertion_order() {
    let repo = get_test_repository().await;
    repo.put_order(&order("O1", "A1", vec![line("P1", 1, 100)]))
        .await
        .unwrap();
    repo.put_order(&order("O2", "A1", vec![line("P9", 1, 100), line("P3", 1, 100)]))
        .await
        .unwrap();
    repo.put_order(&order("O3", "A2", vec![line("P1", 1, 100)]))
        .await
        .unwrap();

    let orders = reconstruct(repo.rows_for_account(&AccountId::new("A1")).await.unwrap());
    let ids: Vec<_> = orders.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, vec!["O2", "O1"]);
    let lines: Vec<_> = orders[0]
        .line_items
        .iter()
        .map(|l| l.product_id.as_str())
        .collect();
    assert_eq!(lines, vec!["P9", "P3"]);
}

#[tokio::test]
#[serial]
async fn list_paginates_orders_not_rows() {
    let repo = get_test_repository().await;
    repo.put_order(&order("O1", "A1", vec![line("P1", 1, 100), line("P2", 1, 100)]))
        .await
        .unwrap();
    repo.put_order(&order("O2", "A1", vec![line("P1", 1, 100), line("P2", 1, 100)]))
        .await
        .unwrap();
    repo.put_order(&order("O3", "A1", vec![line("P1", 1, 100)]))
        .await
        .unwrap();

    let orders = reconstruct(repo.list_rows(Pagination::new(1, 2)).await.unwrap());
    let ids: Vec<_> = orders.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, vec!["O2", "O1"]);
    assert_eq!(orders[1].line_items.len(), 2);
}

#[tokio::test]
#[serial]
async fn failed_line_insert_rolls_back_the_header() {
    let repo = get_test_repository().await;
    // the second line collides with the first on (order_id, product_id)
    let broken = order("O1", "A1", vec![line("P1", 1, 100), line("P1", 2, 100)]);

    let result = repo.put_order(&broken).await;
    assert!(matches!(result, Err(StoreError::Conflict(_))));
    assert_eq!(order_count(&repo).await, 0);
    assert!(repo.rows_for_order(&broken.id).await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn duplicate_order_id_is_conflict() {
    let repo = get_test_repository().await;
    repo.put_order(&order("O1", "A1", vec![line("P1", 1, 100)]))
        .await
        .unwrap();
    let result = repo
        .put_order(&order("O1", "A1", vec![line("P2", 1, 100)]))
        .await;
    assert!(matches!(result, Err(StoreError::Conflict(_))));
}
