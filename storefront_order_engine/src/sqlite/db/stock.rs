use sqlx::SqliteConnection;

use crate::{
    db_types::{ProductListing, StockLevel},
    traits::CatalogApiError,
};

/// Atomically takes `quantity` units out of the stock record for the given product/size.
///
/// The guard `quantity >= :n` makes the decrement conditional: two concurrent orders can never
/// both pass the non-negative check against a stale count, because the losing statement simply
/// matches no row. Returns the remaining quantity, or `None` when the record is missing or short.
pub(crate) async fn decrement_stock(
    product_id: i64,
    size_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<i64>, CatalogApiError> {
    let remaining: Option<i64> = sqlx::query_scalar(
        r#"
            UPDATE stocks
            SET quantity = quantity - $1, updated_at = CURRENT_TIMESTAMP
            WHERE product_id = $2 AND size_id = $3 AND quantity >= $1
            RETURNING quantity
        "#,
    )
    .bind(quantity)
    .bind(product_id)
    .bind(size_id)
    .fetch_optional(conn)
    .await?;
    Ok(remaining)
}

/// Puts `quantity` units back into the stock record for the given product/size. The caller's
/// numbers (taken from an order line item) are authoritative: if the record has disappeared from
/// the catalog in the meantime, it is re-created with the restored quantity.
pub(crate) async fn restore_stock(
    product_id: i64,
    size_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<i64, CatalogApiError> {
    let level: i64 = sqlx::query_scalar(
        r#"
            INSERT INTO stocks (product_id, size_id, quantity) VALUES ($1, $2, $3)
            ON CONFLICT (product_id, size_id)
            DO UPDATE SET quantity = quantity + excluded.quantity, updated_at = CURRENT_TIMESTAMP
            RETURNING quantity
        "#,
    )
    .bind(product_id)
    .bind(size_id)
    .bind(quantity)
    .fetch_one(conn)
    .await?;
    Ok(level)
}

pub(crate) async fn fetch_stock_level(
    product_id: i64,
    size_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<StockLevel>, CatalogApiError> {
    let level = sqlx::query_as("SELECT product_id, size_id, quantity FROM stocks WHERE product_id = $1 AND size_id = $2")
        .bind(product_id)
        .bind(size_id)
        .fetch_optional(conn)
        .await?;
    Ok(level)
}

pub(crate) async fn product_exists(product_id: i64, conn: &mut SqliteConnection) -> Result<bool, CatalogApiError> {
    let id: Option<i64> = sqlx::query_scalar("SELECT id FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(conn)
        .await?;
    Ok(id.is_some())
}

/// Fetches the full listing for one product/size combination: pricing, the owning store and the
/// current stock count, in one join.
pub(crate) async fn product_listing(
    product_id: i64,
    size_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<ProductListing>, CatalogApiError> {
    let listing = sqlx::query_as(
        r#"
        SELECT
            products.id as product_id,
            sizes.id as size_id,
            products.name as product_name,
            sizes.label as size_label,
            stores.id as store_id,
            stores.name as store_name,
            stores.seller_id as seller_id,
            products.price as price,
            products.discount_price as discount_price,
            products.discount_start_time as discount_start_time,
            products.discount_end_time as discount_end_time,
            stocks.quantity as quantity
        FROM stocks
            JOIN products ON stocks.product_id = products.id
            JOIN stores ON products.store_id = stores.id
            JOIN sizes ON stocks.size_id = sizes.id
        WHERE stocks.product_id = $1 AND stocks.size_id = $2
        "#,
    )
    .bind(product_id)
    .bind(size_id)
    .fetch_optional(conn)
    .await?;
    Ok(listing)
}
