use soe_common::Money;
use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderItem, OrderStatusType},
    order_objects::{OrderList, OrderQueryFilter, Pagination},
    soe_api::errors::{CatalogApiError, LedgerApiError},
    traits::{CatalogManagement, LedgerManagement, OrderWithItems, PlacedOrder},
};

/// This trait defines the highest level of behaviour for backends supporting the order engine.
///
/// The behaviour includes:
/// * Placing an order: stock decrements, point debit and order insertion as one atomic unit.
/// * Cancelling an order: stock restoration, point credit and the status flip as one atomic unit.
/// * Fetching and searching persisted orders.
///
/// The mutating operations must satisfy the lost-update guarantee: concurrent placements against
/// the same stock record may never both pass the non-negative check against a stale count.
/// Backends achieve this with conditional updates (`... SET quantity = quantity - :n WHERE
/// quantity >= :n`) rather than read-then-write.
#[allow(async_fn_in_trait)]
pub trait OrderFlowDatabase: Clone + CatalogManagement + LedgerManagement {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Writes a fully priced order in a single atomic transaction:
    /// * every line item's stock record is conditionally decremented; a shortfall on any line
    ///   aborts the whole transaction with [`OrderFlowError::InsufficientStock`];
    /// * the buyer's point balance is conditionally debited by `points_used` (skipped when zero);
    /// * the order row and its items are inserted with status `AwaitingPayment` and frozen unit
    ///   prices.
    ///
    /// On success, returns the persisted order, its items, and the stock records the transaction
    /// left at exactly zero. On any error, no stock count, balance or order row has changed.
    async fn place_order(&self, order: NewOrder) -> Result<PlacedOrder, OrderFlowError>;

    /// Cancels an order in a single atomic transaction:
    /// * the status is flipped `AwaitingPayment` -> `Cancelled` with a guard on the current
    ///   status, so a concurrent cancellation loses cleanly with
    ///   [`OrderFlowError::IllegalStateTransition`];
    /// * each line item's quantity is added back to its stock record (the item's own
    ///   product/size/quantity is authoritative, whatever the catalog looks like now);
    /// * the buyer's balance is credited with the order's `points_used`.
    ///
    /// Ownership and state pre-checks belong to the caller; this method re-checks the state under
    /// the transaction.
    async fn cancel_order(&self, order: &Order, items: &[OrderItem]) -> Result<Order, OrderFlowError>;

    /// Fetches an order and its line items by public order id.
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<OrderWithItems>, OrderFlowError>;

    /// Pages through orders matching the filter, newest first, with a total count consistent with
    /// the returned page.
    async fn search_orders(&self, query: OrderQueryFilter, page: &Pagination) -> Result<OrderList, OrderFlowError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), OrderFlowError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("User {0} does not exist")]
    UserNotFound(i64),
    #[error("User account {0} is disabled")]
    AccountDisabled(i64),
    #[error("User {0} is not a buyer and cannot place orders")]
    NotABuyer(i64),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Product {product_id} has no stock record for size {size_id}")]
    StockRecordNotFound { product_id: i64, size_id: i64 },
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Insufficient stock of product {product_id} (size {size_id}) to cover {requested} unit(s)")]
    InsufficientStock { product_id: i64, size_id: i64, requested: i64 },
    #[error("Cannot redeem {requested} in points; the limit for this order is {limit}")]
    InsufficientPoints { requested: Money, limit: Money },
    #[error("Order {0} belongs to another buyer")]
    NotOrderOwner(OrderId),
    #[error("Order {order_id} cannot move from {from} to {to}")]
    IllegalStateTransition { order_id: OrderId, from: OrderStatusType, to: OrderStatusType },
    #[error("Invalid order request: {0}")]
    InvalidRequest(String),
    #[error("{0}")]
    CatalogError(#[from] CatalogApiError),
    #[error("{0}")]
    LedgerError(#[from] LedgerApiError),
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}
