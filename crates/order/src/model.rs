//! Order records, request lines and the flattened rows they are stored as.

use chrono::{DateTime, Utc};
use common::{AccountId, Money, OrderId, ProductId};
use serde::{Deserialize, Serialize};

/// Largest quantity a single line item may carry.
pub const MAX_QUANTITY: u32 = i32::MAX as u32;

/// One product within an order.
///
/// `price`, `name` and `description` are copied from the catalog when the
/// order is placed. Reads may overwrite the display fields with current
/// catalog data; the stored total never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Money,
    pub name: String,
    pub description: String,
}

impl LineItem {
    /// Price of this line at its snapshot price; `None` on overflow.
    pub fn subtotal(&self) -> Option<Money> {
        self.price.checked_multiply(self.quantity)
    }
}

/// An order placed by an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub account_id: AccountId,
    pub created_at: DateTime<Utc>,
    pub total_price: Money,
    pub line_items: Vec<LineItem>,
}

impl Order {
    /// Sums the line items at their snapshot prices; `None` on overflow.
    pub fn line_total(line_items: &[LineItem]) -> Option<Money> {
        line_items
            .iter()
            .try_fold(Money::zero(), |total, item| total.checked_add(item.subtotal()?))
    }

    /// Flattens the order into one storage row per line item, in line order.
    pub fn to_rows(&self) -> Vec<OrderRow> {
        self.line_items
            .iter()
            .map(|item| OrderRow {
                order_id: self.id.clone(),
                account_id: self.account_id.clone(),
                created_at: self.created_at,
                total_price: self.total_price,
                product_id: item.product_id.clone(),
                quantity: item.quantity,
                price: Some(item.price),
                name: Some(item.name.clone()),
                description: Some(item.description.clone()),
            })
            .collect()
    }
}

/// A requested product and quantity, before validation.
///
/// Quantity is signed so that non-positive values can be reported rather
/// than failing to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedLine {
    #[serde(rename = "id")]
    pub product_id: ProductId,
    pub quantity: i64,
}

impl RequestedLine {
    pub fn new(product_id: impl Into<ProductId>, quantity: i64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Body of a create-order request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub account_id: AccountId,
    pub products: Vec<RequestedLine>,
}

/// One joined `(order, line item)` row as read from storage.
///
/// Snapshot columns are nullable; rows written without them reconstruct
/// with empty display fields and a zero price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRow {
    pub order_id: OrderId,
    pub account_id: AccountId,
    pub created_at: DateTime<Utc>,
    pub total_price: Money,
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Option<Money>,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl OrderRow {
    /// The line item carried by this row.
    pub fn line_item(&self) -> LineItem {
        LineItem {
            product_id: self.product_id.clone(),
            quantity: self.quantity,
            price: self.price.unwrap_or_default(),
            name: self.name.clone().unwrap_or_default(),
            description: self.description.clone().unwrap_or_default(),
        }
    }
}
