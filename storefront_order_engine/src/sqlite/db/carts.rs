use sqlx::SqliteConnection;

use crate::traits::CatalogApiError;

/// User ids that currently hold the given product/size in their cart. These are the buyers who
/// get told when the stock they were eyeing runs out.
pub(crate) async fn holders_for_stock(
    product_id: i64,
    size_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<i64>, CatalogApiError> {
    let user_ids: Vec<i64> = sqlx::query_scalar(
        "SELECT DISTINCT user_id FROM cart_items WHERE product_id = $1 AND size_id = $2 ORDER BY user_id",
    )
    .bind(product_id)
    .bind(size_id)
    .fetch_all(conn)
    .await?;
    Ok(user_ids)
}
