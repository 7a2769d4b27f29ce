use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use rand::distributions::{Alphanumeric, DistString};
use serde::{Deserialize, Serialize};
use soe_common::Money;
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------        Role          ---------------------------------------------------------
/// Account type. Buyers place orders; sellers own stores and receive stock notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum Role {
    Buyer,
    Seller,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Buyer => write!(f, "Buyer"),
            Role::Seller => write!(f, "Seller"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(String);

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Buyer" => Ok(Self::Buyer),
            "Seller" => Ok(Self::Seller),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------        User          ---------------------------------------------------------
/// An account row. The point balance is the account ledger: it is only ever mutated through
/// conditional debits and credits inside an order transaction.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub nickname: String,
    pub role: Role,
    pub points: Money,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------   OrderStatusType    ---------------------------------------------------------
/// The order lifecycle. The engine only ever performs the `AwaitingPayment` -> `Cancelled`
/// transition; the fulfilment states are stored and reported but their transitions belong to
/// external payment/fulfilment flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order has been created and is waiting for payment. This is the only cancellable state.
    AwaitingPayment,
    /// Payment has been received in full.
    Paid,
    /// The order has been handed to a carrier.
    Shipped,
    /// The order has arrived.
    Delivered,
    /// The order has been cancelled by the buyer. Terminal.
    Cancelled,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::AwaitingPayment => write!(f, "AwaitingPayment"),
            OrderStatusType::Paid => write!(f, "Paid"),
            OrderStatusType::Shipped => write!(f, "Shipped"),
            OrderStatusType::Delivered => write!(f, "Delivered"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AwaitingPayment" => Ok(Self::AwaitingPayment),
            "Paid" => Ok(Self::Paid),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to AwaitingPayment");
            OrderStatusType::AwaitingPayment
        })
    }
}

//--------------------------------------       OrderId        ---------------------------------------------------------
/// The public, opaque identifier of an order. Minted by the engine at placement time and stable
/// for the life of the order; never derived from the storage row id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    const TOKEN_LEN: usize = 20;

    /// Mints a fresh random order id.
    pub fn random() -> Self {
        let token = Alphanumeric.sample_string(&mut rand::thread_rng(), Self::TOKEN_LEN);
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------        Order         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub buyer_id: i64,
    pub recipient: String,
    pub phone: String,
    pub address: String,
    pub status: OrderStatusType,
    /// Sum of frozen unit prices times quantities, before point redemption.
    pub subtotal: Money,
    /// Points redeemed against the subtotal when the order was placed.
    pub points_used: Money,
    /// The amount actually charged: `subtotal - points_used`.
    pub total_price: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      OrderItem       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    /// Storage row id of the owning order.
    pub order_id: i64,
    pub product_id: i64,
    pub size_id: i64,
    /// The unit price at the time the order was placed. Catalog price changes never touch this.
    pub unit_price: Money,
    pub quantity: i64,
    pub review_done: bool,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------       NewOrder       ---------------------------------------------------------
/// A fully priced order, ready to be written. All price resolution (discount windows, point
/// limits) has already happened by the time one of these exists.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub buyer_id: i64,
    pub recipient: String,
    pub phone: String,
    pub address: String,
    pub subtotal: Money,
    pub points_used: Money,
    pub total_price: Money,
    pub items: Vec<NewOrderItem>,
}

impl NewOrder {
    pub fn new(buyer_id: i64, recipient: String, phone: String, address: String) -> Self {
        Self {
            order_id: OrderId::random(),
            buyer_id,
            recipient,
            phone,
            address,
            subtotal: Money::zero(),
            points_used: Money::zero(),
            total_price: Money::zero(),
            items: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub size_id: i64,
    /// Snapshot of the effective unit price at placement time.
    pub unit_price: Money,
    pub quantity: i64,
}

//--------------------------------------     StockLevel       ---------------------------------------------------------
/// A stock record as seen at some point inside a transaction.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct StockLevel {
    pub product_id: i64,
    pub size_id: i64,
    pub quantity: i64,
}

//--------------------------------------   ProductListing     ---------------------------------------------------------
/// Everything the workflow needs to know about one product/size combination: ownership (for
/// notifications), pricing (including any discount window) and the stock count at read time.
/// The stock count here is advisory; only the conditional decrement inside the order transaction
/// is authoritative.
#[derive(Debug, Clone, FromRow)]
pub struct ProductListing {
    pub product_id: i64,
    pub size_id: i64,
    pub product_name: String,
    pub size_label: String,
    pub store_id: i64,
    pub store_name: String,
    pub seller_id: i64,
    pub price: Money,
    pub discount_price: Option<Money>,
    pub discount_start_time: Option<DateTime<Utc>>,
    pub discount_end_time: Option<DateTime<Utc>>,
    pub quantity: i64,
}
