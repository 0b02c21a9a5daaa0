//! Response graphs and query parameters of the gateway.

use account::Account;
use common::{AccountId, ErrorKind, Pagination, ServiceError};
use order::Order;
use serde::{Deserialize, Serialize};

/// Page used when a listing request carries no pagination at all.
pub const DEFAULT_PAGE: Pagination = Pagination { skip: 0, take: 10 };

/// A failure confined to one field of a composed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Location of the failed field, e.g. `accounts[1].orders`.
    pub path: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, err: &ServiceError) -> Self {
        Self {
            path: path.into(),
            kind: err.kind(),
            message: err.message().to_string(),
        }
    }
}

/// A composed response: the data that could be resolved plus per-field
/// errors for the parts that could not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Composed<T> {
    pub data: T,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl<T> Composed<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            errors: Vec::new(),
        }
    }
}

/// An account with its orders stitched in.
///
/// `orders` is `None` when they were not requested or could not be loaded;
/// the latter is reported through [`Composed::errors`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountView {
    pub id: AccountId,
    pub name: String,
    pub orders: Option<Vec<Order>>,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            orders: None,
        }
    }
}

/// Query string of `GET /accounts`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountsQuery {
    pub id: Option<String>,
    pub skip: Option<u64>,
    pub take: Option<u64>,
    /// Whether to stitch in each account's orders (default: yes).
    pub orders: Option<bool>,
}

/// Query string of `GET /accounts/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountQuery {
    pub orders: Option<bool>,
}

/// Query string of `GET /products`.
///
/// The selectors are mutually exclusive and tried in order: `id`, `query`,
/// `ids` (comma separated), then a plain listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductsQuery {
    pub id: Option<String>,
    pub query: Option<String>,
    pub ids: Option<String>,
    pub skip: Option<u64>,
    pub take: Option<u64>,
}

/// How a products request is answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductSelector {
    ById(String),
    Search(String, Pagination),
    ByIds(Vec<String>),
    List(Pagination),
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Resolves optional skip/take into a page.
pub fn page_or_default(skip: Option<u64>, take: Option<u64>) -> Pagination {
    match (skip, take) {
        (None, None) => DEFAULT_PAGE,
        (skip, take) => Pagination::new(skip.unwrap_or(0), take.unwrap_or(0)),
    }
}

impl ProductsQuery {
    /// Picks the single selector this request uses.
    pub fn selector(&self) -> ProductSelector {
        let page = page_or_default(self.skip, self.take);
        if let Some(id) = present(&self.id) {
            return ProductSelector::ById(id.to_string());
        }
        if let Some(query) = present(&self.query) {
            return ProductSelector::Search(query.to_string(), page);
        }
        if let Some(ids) = present(&self.ids) {
            return ProductSelector::ByIds(
                ids.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect(),
            );
        }
        ProductSelector::List(page)
    }
}

/// Body of `POST /accounts`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccountInput {
    pub name: String,
}
