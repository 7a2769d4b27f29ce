use serde::{Deserialize, Serialize};

/// Emitted after a committed order drains a stock record to exactly zero.
///
/// Carries everything a delivery channel needs to render the message without further catalog
/// reads: the names come from the pricing-time listing, and `cart_user_ids` are the buyers who
/// held this product/size in their cart when the stock ran out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDepletedEvent {
    pub product_id: i64,
    pub size_id: i64,
    pub product_name: String,
    pub size_label: String,
    pub store_name: String,
    pub seller_id: i64,
    pub cart_user_ids: Vec<i64>,
}
