use crate::{
    db_types::{ProductListing, StockLevel},
    soe_api::errors::CatalogApiError,
};

/// Read access to the product catalog and its stock records.
///
/// Everything here is a plain read; the counts it returns are advisory snapshots. The conditional
/// decrement inside [`super::OrderFlowDatabase::place_order`] is the only authoritative check.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    /// Fetches the listing (pricing, ownership, stock count) for one product/size combination.
    /// Returns `None` when the product exists but carries no stock record for the size, or when
    /// the product does not exist at all; use [`Self::product_exists`] to tell the two apart.
    async fn fetch_product_listing(
        &self,
        product_id: i64,
        size_id: i64,
    ) -> Result<Option<ProductListing>, CatalogApiError>;

    async fn product_exists(&self, product_id: i64) -> Result<bool, CatalogApiError>;

    /// The current stock count for one product/size combination.
    async fn fetch_stock_level(&self, product_id: i64, size_id: i64) -> Result<Option<StockLevel>, CatalogApiError>;

    /// User ids that currently hold the given product/size in their cart. Used to fan out
    /// out-of-stock notifications; never consulted inside the order transaction.
    async fn fetch_cart_holders(&self, product_id: i64, size_id: i64) -> Result<Vec<i64>, CatalogApiError>;
}
