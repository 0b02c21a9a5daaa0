//! Rebuilding nested orders from flattened join rows, and splicing current
//! catalog data into them.

use std::collections::{HashMap, HashSet};

use catalog::Product;
use common::{OrderId, ProductId};

use crate::model::{Order, OrderRow};

/// Groups join rows into orders.
///
/// Orders come out in the order their first row was seen, and line items in
/// row order within each order. Rows of one order need not be contiguous.
pub fn reconstruct<I>(rows: I) -> Vec<Order>
where
    I: IntoIterator<Item = OrderRow>,
{
    let mut orders: Vec<Order> = Vec::new();
    let mut index: HashMap<OrderId, usize> = HashMap::new();

    for row in rows {
        let item = row.line_item();
        match index.get(&row.order_id) {
            Some(&slot) => orders[slot].line_items.push(item),
            None => {
                index.insert(row.order_id.clone(), orders.len());
                orders.push(Order {
                    id: row.order_id,
                    account_id: row.account_id,
                    created_at: row.created_at,
                    total_price: row.total_price,
                    line_items: vec![item],
                });
            }
        }
    }

    orders
}

/// Distinct product ids referenced by `orders`, in first-seen order.
pub fn referenced_products(orders: &[Order]) -> Vec<ProductId> {
    let mut seen = HashSet::new();
    orders
        .iter()
        .flat_map(|order| order.line_items.iter())
        .filter(|item| seen.insert(&item.product_id))
        .map(|item| item.product_id.clone())
        .collect()
}

/// Overwrites line-item display fields and prices with current catalog data.
///
/// Line items whose product is absent from `products` keep their snapshot
/// values. Order totals are left alone. Returns the distinct product ids that
/// could not be resolved.
pub fn apply_catalog(orders: &mut [Order], products: &[Product]) -> Vec<ProductId> {
    let by_id: HashMap<&ProductId, &Product> = products.iter().map(|p| (&p.id, p)).collect();
    let mut missing: Vec<ProductId> = Vec::new();

    for item in orders.iter_mut().flat_map(|order| order.line_items.iter_mut()) {
        match by_id.get(&item.product_id) {
            Some(product) => {
                item.name = product.name.clone();
                item.description = product.description.clone();
                item.price = product.price;
            }
            None => {
                if !missing.contains(&item.product_id) {
                    missing.push(item.product_id.clone());
                }
            }
        }
    }

    missing
}
