use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
}

impl Product {
    /// Returns true if `query` appears in the name or description,
    /// ignoring case. Every whitespace-separated term must match somewhere.
    pub fn matches(&self, query: &str) -> bool {
        let name = self.name.to_lowercase();
        let description = self.description.to_lowercase();
        query
            .split_whitespace()
            .map(str::to_lowercase)
            .all(|term| name.contains(&term) || description.contains(&term))
    }
}

/// Fields of a product to be created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
}

/// Body of a bulk-by-ids lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductIdsRequest {
    pub ids: Vec<ProductId>,
}

/// Query string of the list endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListProductsQuery {
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub take: u64,
    pub query: Option<String>,
}
