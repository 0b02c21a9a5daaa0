//! Order error types.

use common::{AccountId, OrderId, ProductId, ServiceError, StoreError};
use thiserror::Error;

/// Errors that can occur while placing or reading orders.
#[derive(Debug, Error)]
pub enum OrderError {
    /// No account id was supplied.
    #[error("account id is required")]
    MissingAccount,

    /// The referenced account does not exist.
    #[error("account invalid: {0}")]
    AccountInvalid(AccountId),

    /// The order had no product lines.
    #[error("order must contain at least one product")]
    EmptyOrder,

    /// A line named no product.
    #[error("product id is required (line {position})")]
    MissingProduct { position: usize },

    /// A line had a non-positive or oversized quantity.
    #[error("invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: ProductId, quantity: i64 },

    /// Some requested products are unknown to the catalog.
    #[error("products not found: {}", join_ids(.0))]
    ProductsNotFound(Vec<ProductId>),

    /// The order total does not fit a stored amount.
    #[error("order total is out of range")]
    TotalOutOfRange,

    /// The requested page is outside the accepted bounds.
    #[error("{0}")]
    InvalidPage(String),

    /// The addressed order does not exist.
    #[error("order not found: {0}")]
    NotFound(OrderId),

    /// A peer service failed.
    #[error(transparent)]
    Upstream(ServiceError),

    /// The order store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl OrderError {
    /// Short label used as the `reason` of failure metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            OrderError::MissingAccount
            | OrderError::EmptyOrder
            | OrderError::MissingProduct { .. }
            | OrderError::InvalidQuantity { .. }
            | OrderError::TotalOutOfRange
            | OrderError::InvalidPage(_) => "invalid_request",
            OrderError::AccountInvalid(_) => "account_invalid",
            OrderError::ProductsNotFound(_) => "products_not_found",
            OrderError::NotFound(_) => "not_found",
            OrderError::Upstream(_) => "upstream",
            OrderError::Storage(_) => "storage",
        }
    }
}

fn join_ids(ids: &[ProductId]) -> String {
    ids.iter()
        .map(ProductId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<OrderError> for ServiceError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::MissingAccount
            | OrderError::EmptyOrder
            | OrderError::MissingProduct { .. }
            | OrderError::InvalidQuantity { .. }
            | OrderError::TotalOutOfRange
            | OrderError::InvalidPage(_) => ServiceError::InvalidArgument(err.to_string()),
            OrderError::AccountInvalid(_)
            | OrderError::ProductsNotFound(_)
            | OrderError::NotFound(_) => ServiceError::NotFound(err.to_string()),
            OrderError::Upstream(inner) => inner,
            OrderError::Storage(store) => store.into(),
        }
    }
}
