//! `SqliteDatabase` is a concrete implementation of an order engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the
//! [`crate::traits`] module.
use std::fmt::Debug;

use log::*;
use soe_common::Money;
use sqlx::SqlitePool;

use super::db::{carts, db_url, new_pool, orders, stock, users};
use crate::{
    db_types::{NewOrder, Order, OrderId, OrderItem, OrderStatusType, ProductListing, StockLevel, User},
    order_objects::{OrderList, OrderQueryFilter, Pagination},
    traits::{
        CatalogApiError,
        CatalogManagement,
        LedgerApiError,
        LedgerManagement,
        OrderFlowDatabase,
        OrderFlowError,
        OrderWithItems,
        PlacedOrder,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl OrderFlowDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Takes a fully priced order and, in a single atomic transaction,
    /// * conditionally decrements the stock record behind every line item,
    /// * conditionally debits the buyer's point balance (when any points are redeemed),
    /// * inserts the order and its line items with frozen unit prices.
    ///
    /// Any failure drops the transaction unfinished, which rolls everything back: a rejected
    /// placement leaves no stock, balance or order row changed. The returned `depleted` list
    /// holds the stock records this transaction drained to exactly zero.
    async fn place_order(&self, order: NewOrder) -> Result<PlacedOrder, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let mut depleted = Vec::new();
        for item in &order.items {
            let remaining = stock::decrement_stock(item.product_id, item.size_id, item.quantity, &mut tx).await?;
            match remaining {
                Some(0) => depleted.push(StockLevel { product_id: item.product_id, size_id: item.size_id, quantity: 0 }),
                Some(_) => {},
                None => {
                    return Err(OrderFlowError::InsufficientStock {
                        product_id: item.product_id,
                        size_id: item.size_id,
                        requested: item.quantity,
                    });
                },
            }
        }
        if !order.points_used.is_zero() {
            let balance = users::debit_points(order.buyer_id, order.points_used, &mut tx).await?;
            if balance.is_none() {
                let limit = match users::fetch_user(order.buyer_id, &mut tx).await? {
                    Some(user) => user.points,
                    None => return Err(OrderFlowError::UserNotFound(order.buyer_id)),
                };
                return Err(OrderFlowError::InsufficientPoints { requested: order.points_used, limit });
            }
        }
        let (order, items) = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order [{}] committed. {} stock record(s) now depleted", order.order_id, depleted.len());
        Ok(PlacedOrder { order, items, depleted })
    }

    /// Cancels the order in a single atomic transaction. The guarded status flip runs first, so a
    /// concurrent cancellation of the same order aborts here before any stock or point mutation.
    async fn cancel_order(&self, order: &Order, items: &[OrderItem]) -> Result<Order, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let cancelled = match orders::mark_cancelled(order.id, &mut tx).await? {
            Some(updated) => updated,
            None => {
                let from = orders::fetch_order_by_order_id(&order.order_id, &mut tx)
                    .await?
                    .map(|o| o.status)
                    .unwrap_or(order.status);
                return Err(OrderFlowError::IllegalStateTransition {
                    order_id: order.order_id.clone(),
                    from,
                    to: OrderStatusType::Cancelled,
                });
            },
        };
        for item in items {
            let level = stock::restore_stock(item.product_id, item.size_id, item.quantity, &mut tx).await?;
            trace!("🗃️ Restored {} unit(s) of product #{} (size #{}): now {level}", item.quantity, item.product_id, item.size_id);
        }
        if !cancelled.points_used.is_zero() {
            users::credit_points(cancelled.buyer_id, cancelled.points_used, &mut tx).await?;
        }
        tx.commit().await?;
        debug!(
            "🗃️ Order [{}] cancelled. {} item(s) restocked and {} in points credited back",
            cancelled.order_id,
            items.len(),
            cancelled.points_used
        );
        Ok(cancelled)
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<OrderWithItems>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = match orders::fetch_order_by_order_id(order_id, &mut conn).await? {
            Some(order) => order,
            None => return Ok(None),
        };
        let items = orders::fetch_items_for_order(order.id, &mut conn).await?;
        Ok(Some(OrderWithItems { order, items }))
    }

    async fn search_orders(&self, query: OrderQueryFilter, page: &Pagination) -> Result<OrderList, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let (orders, total_count) = orders::search_orders(&query, page, &mut conn).await?;
        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            let items = orders::fetch_items_for_order(order.id, &mut conn).await?;
            result.push(OrderWithItems { order, items });
        }
        Ok(OrderList { orders: result, total_count, page: page.page, limit: page.limit })
    }

    async fn close(&mut self) -> Result<(), OrderFlowError> {
        self.pool.close().await;
        Ok(())
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_product_listing(
        &self,
        product_id: i64,
        size_id: i64,
    ) -> Result<Option<ProductListing>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        stock::product_listing(product_id, size_id, &mut conn).await
    }

    async fn product_exists(&self, product_id: i64) -> Result<bool, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        stock::product_exists(product_id, &mut conn).await
    }

    async fn fetch_stock_level(&self, product_id: i64, size_id: i64) -> Result<Option<StockLevel>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        stock::fetch_stock_level(product_id, size_id, &mut conn).await
    }

    async fn fetch_cart_holders(&self, product_id: i64, size_id: i64) -> Result<Vec<i64>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        carts::holders_for_stock(product_id, size_id, &mut conn).await
    }
}

impl LedgerManagement for SqliteDatabase {
    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, LedgerApiError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user(user_id, &mut conn).await
    }

    async fn fetch_point_balance(&self, user_id: i64) -> Result<Money, LedgerApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user(user_id, &mut conn).await?.ok_or(LedgerApiError::UserNotFound(user_id))?;
        Ok(user.points)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL from the environment (or the default).
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
