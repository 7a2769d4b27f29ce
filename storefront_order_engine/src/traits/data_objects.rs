use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderItem, StockLevel};

/// An order together with its line items, as returned by reads and by placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// The outcome of a successful placement transaction: the persisted order plus the stock records
/// that the transaction left at exactly zero (the trigger set for out-of-stock notifications).
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub depleted: Vec<StockLevel>,
}

impl PlacedOrder {
    pub fn into_order_with_items(self) -> OrderWithItems {
        OrderWithItems { order: self.order, items: self.items }
    }
}
