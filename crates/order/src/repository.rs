use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AccountId, Money, OrderId, Pagination, StoreError};
use tokio::sync::RwLock;

use crate::model::{LineItem, Order, OrderRow};

/// Persistence for orders and their line items.
///
/// Reads return flattened join rows ordered by order id descending, with
/// line items in insertion order within each order.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Stores the order header and every line item atomically.
    async fn put_order(&self, order: &Order) -> Result<(), StoreError>;

    /// Rows of a single order.
    async fn rows_for_order(&self, id: &OrderId) -> Result<Vec<OrderRow>, StoreError>;

    /// Rows of every order placed by an account.
    async fn rows_for_account(&self, account_id: &AccountId) -> Result<Vec<OrderRow>, StoreError>;

    /// Rows of the orders within `page`; the window applies to orders.
    async fn list_rows(&self, page: Pagination) -> Result<Vec<OrderRow>, StoreError>;
}

#[derive(Debug, Clone)]
struct OrderHeader {
    account_id: AccountId,
    created_at: DateTime<Utc>,
    total_price: Money,
}

#[derive(Debug, Default)]
struct InMemoryOrderState {
    headers: BTreeMap<OrderId, OrderHeader>,
    lines: BTreeMap<OrderId, Vec<LineItem>>,
    fail_after_header: bool,
}

impl InMemoryOrderState {
    fn rows_of(&self, id: &OrderId, header: &OrderHeader) -> Vec<OrderRow> {
        self.lines
            .get(id)
            .map(|items| {
                items
                    .iter()
                    .map(|item| OrderRow {
                        order_id: id.clone(),
                        account_id: header.account_id.clone(),
                        created_at: header.created_at,
                        total_price: header.total_price,
                        product_id: item.product_id.clone(),
                        quantity: item.quantity,
                        price: Some(item.price),
                        name: Some(item.name.clone()),
                        description: Some(item.description.clone()),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// In-memory order repository for tests and local runs.
///
/// Writes follow the same header-then-lines sequence as the database and
/// undo the header when the lines cannot be stored.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderRepository {
    state: Arc<RwLock<InMemoryOrderState>>,
}

impl InMemoryOrderRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent writes fail after the header has been stored.
    pub async fn set_fail_after_header(&self, fail: bool) {
        self.state.write().await.fail_after_header = fail;
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.headers.len()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn put_order(&self, order: &Order) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.headers.contains_key(&order.id) {
            return Err(StoreError::Conflict(order.id.to_string()));
        }

        state.headers.insert(
            order.id.clone(),
            OrderHeader {
                account_id: order.account_id.clone(),
                created_at: order.created_at,
                total_price: order.total_price,
            },
        );

        let mut seen = HashSet::new();
        let duplicate = order
            .line_items
            .iter()
            .find(|item| !seen.insert(&item.product_id));
        let failure = match duplicate {
            Some(item) => Some(StoreError::Conflict(format!(
                "{}/{}",
                order.id, item.product_id
            ))),
            None if state.fail_after_header => {
                Some(StoreError::Aborted("line items rejected".to_string()))
            }
            None => None,
        };

        if let Some(err) = failure {
            // roll back
            state.headers.remove(&order.id);
            return Err(err);
        }

        state.lines.insert(order.id.clone(), order.line_items.clone());
        Ok(())
    }

    async fn rows_for_order(&self, id: &OrderId) -> Result<Vec<OrderRow>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .headers
            .get(id)
            .map(|header| state.rows_of(id, header))
            .unwrap_or_default())
    }

    async fn rows_for_account(&self, account_id: &AccountId) -> Result<Vec<OrderRow>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .headers
            .iter()
            .rev()
            .filter(|(_, header)| &header.account_id == account_id)
            .flat_map(|(id, header)| state.rows_of(id, header))
            .collect())
    }

    async fn list_rows(&self, page: Pagination) -> Result<Vec<OrderRow>, StoreError> {
        let state = self.state.read().await;
        Ok(page
            .window(state.headers.iter().rev())
            .flat_map(|(id, header)| state.rows_of(id, header))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use common::ProductId;

    use super::*;

    fn order(id: &str, account: &str, products: &[&str]) -> Order {
        let line_items: Vec<LineItem> = products
            .iter()
            .map(|p| LineItem {
                product_id: ProductId::new(*p),
                quantity: 1,
                price: Money::from_cents(100),
                name: p.to_string(),
                description: String::new(),
            })
            .collect();
        Order {
            id: OrderId::new(id),
            account_id: AccountId::new(account),
            created_at: Utc::now(),
            total_price: Order::line_total(&line_items).unwrap(),
            line_items,
        }
    }

    fn order_ids(rows: &[OrderRow]) -> Vec<&str> {
        let mut ids: Vec<&str> = rows.iter().map(|r| r.order_id.as_str()).collect();
        ids.dedup();
        ids
    }

    #[tokio::test]
    async fn rows_are_newest_first_with_lines_in_order() {
        let repo = InMemoryOrderRepository::new();
        repo.put_order(&order("O1", "A1", &["P1"])).await.unwrap();
        repo.put_order(&order("O2", "A1", &["P3", "P2"])).await.unwrap();
        repo.put_order(&order("O3", "A2", &["P1"])).await.unwrap();

        let rows = repo.rows_for_account(&AccountId::new("A1")).await.unwrap();
        assert_eq!(order_ids(&rows), vec!["O2", "O1"]);
        let products: Vec<_> = rows.iter().map(|r| r.product_id.as_str()).collect();
        assert_eq!(products, vec!["P3", "P2", "P1"]);
    }

    #[tokio::test]
    async fn list_windows_orders_not_rows() {
        let repo = InMemoryOrderRepository::new();
        repo.put_order(&order("O1", "A1", &["P1", "P2"])).await.unwrap();
        repo.put_order(&order("O2", "A1", &["P1", "P2", "P3"])).await.unwrap();
        repo.put_order(&order("O3", "A1", &["P1"])).await.unwrap();

        let rows = repo.list_rows(Pagination::new(1, 2)).await.unwrap();
        assert_eq!(order_ids(&rows), vec!["O2", "O1"]);
        assert_eq!(rows.len(), 5);
    }

    #[tokio::test]
    async fn failure_after_header_leaves_nothing_behind() {
        let repo = InMemoryOrderRepository::new();
        repo.set_fail_after_header(true).await;

        let result = repo.put_order(&order("O1", "A1", &["P1"])).await;
        assert!(matches!(result, Err(StoreError::Aborted(_))));
        assert_eq!(repo.order_count().await, 0);
        assert!(repo.rows_for_order(&OrderId::new("O1")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_line_identity_rolls_back() {
        let repo = InMemoryOrderRepository::new();
        let result = repo.put_order(&order("O1", "A1", &["P1", "P1"])).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert_eq!(repo.order_count().await, 0);
    }
}
