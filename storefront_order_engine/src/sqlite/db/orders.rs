use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderItem, OrderStatusType},
    order_objects::{OrderQueryFilter, Pagination},
    traits::OrderFlowError,
};

/// Inserts a new order and its line items using the given connection. This is not atomic on its
/// own: the caller embeds it in the placement transaction and passes `&mut *tx` as the connection
/// argument, so the order appears together with the stock and point mutations or not at all.
pub(crate) async fn insert_order(
    order: NewOrder,
    conn: &mut SqliteConnection,
) -> Result<(Order, Vec<OrderItem>), OrderFlowError> {
    let inserted: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                buyer_id,
                recipient,
                phone,
                address,
                subtotal,
                points_used,
                total_price
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(order.order_id)
    .bind(order.buyer_id)
    .bind(order.recipient)
    .bind(order.phone)
    .bind(order.address)
    .bind(order.subtotal)
    .bind(order.points_used)
    .bind(order.total_price)
    .fetch_one(&mut *conn)
    .await?;
    let mut items = Vec::with_capacity(order.items.len());
    for item in order.items {
        let row: OrderItem = sqlx::query_as(
            r#"
                INSERT INTO order_items (order_id, product_id, size_id, unit_price, quantity)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *;
            "#,
        )
        .bind(inserted.id)
        .bind(item.product_id)
        .bind(item.size_id)
        .bind(item.unit_price)
        .bind(item.quantity)
        .fetch_one(&mut *conn)
        .await?;
        items.push(row);
    }
    debug!("📝️ Order [{}] inserted with id {} and {} item(s)", inserted.order_id, inserted.id, items.len());
    Ok((inserted, items))
}

pub(crate) async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

pub(crate) async fn fetch_items_for_order(id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items =
        sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id").bind(id).fetch_all(conn).await?;
    Ok(items)
}

/// Flips the order to `Cancelled`, guarded on it still being cancellable. A `None` result means
/// some other call got there first (or the order was never cancellable); the caller decides how
/// to report that. The guard is what makes a double cancellation lose cleanly instead of
/// restocking twice.
pub(crate) async fn mark_cancelled(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, OrderFlowError> {
    let cancelled = OrderStatusType::Cancelled.to_string();
    let awaiting = OrderStatusType::AwaitingPayment.to_string();
    let result: Option<Order> = sqlx::query_as(
        "UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND status = $3 RETURNING *",
    )
    .bind(cancelled)
    .bind(id)
    .bind(awaiting)
    .fetch_optional(conn)
    .await?;
    Ok(result)
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &OrderQueryFilter) {
    if query.is_empty() {
        return;
    }
    builder.push(" WHERE ");
    let mut where_clause = builder.separated(" AND ");
    if let Some(buyer_id) = query.buyer_id {
        where_clause.push("buyer_id = ");
        where_clause.push_bind_unseparated(buyer_id);
    }
    if query.status.as_ref().map(|s| !s.is_empty()).unwrap_or(false) {
        let statuses =
            query.status.as_ref().unwrap().iter().map(|s| format!("'{s}'")).collect::<Vec<String>>().join(",");
        where_clause.push(format!("status IN ({statuses})"));
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
}

/// Fetches one page of orders matching the filter, newest first, along with the total number of
/// matches independent of the page window.
pub(crate) async fn search_orders(
    query: &OrderQueryFilter,
    page: &Pagination,
    conn: &mut SqliteConnection,
) -> Result<(Vec<Order>, i64), OrderFlowError> {
    let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM orders");
    push_filters(&mut count_builder, query);
    let total_count: i64 = count_builder.build_query_scalar().fetch_one(&mut *conn).await?;

    let mut builder = QueryBuilder::new("SELECT * FROM orders");
    push_filters(&mut builder, query);
    builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    builder.push_bind(i64::from(page.limit));
    builder.push(" OFFSET ");
    builder.push_bind(page.offset());

    trace!("📝️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("📝️ Result of search_orders: {} of {total_count}", orders.len());
    Ok((orders, total_count))
}
