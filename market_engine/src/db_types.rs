use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use mkt_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value for {kind}: {value}")]
pub struct ConversionError {
    kind: &'static str,
    value: String,
}

impl ConversionError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.to_string() }
    }
}

//--------------------------------------        UserId       ---------------------------------------------------------
/// The stable identifier of an authenticated user, as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for UserId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

macro_rules! row_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
        #[sqlx(transparent)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self).map_err(|_| ConversionError::new(stringify!($name), s))
            }
        }
    };
}

row_id!(OrderId);
row_id!(PaymentId);
row_id!(ProductId);

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// The order has been created from a cart and is awaiting payment.
    Pending,
    /// The payment gateway has confirmed a successful payment for the order.
    Paid,
    Shipped,
    Delivered,
    /// The order has been cancelled by an administrator.
    Cancelled,
}

impl OrderStatusType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatusType::Pending => "pending",
            OrderStatusType::Paid => "paid",
            OrderStatusType::Shipped => "shipped",
            OrderStatusType::Delivered => "delivered",
            OrderStatusType::Cancelled => "cancelled",
        }
    }

    /// Whether a confirmed payment may move an order in this status to `Paid`.
    pub fn accepts_payment(&self) -> bool {
        match self {
            OrderStatusType::Pending | OrderStatusType::Cancelled => true,
            OrderStatusType::Paid | OrderStatusType::Shipped | OrderStatusType::Delivered => false,
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError::new("order status", s)),
        }
    }
}

//--------------------------------------  PaymentStatusType    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatusType {
    /// A payment intent has been issued, and no outcome has been reported yet.
    Pending,
    Success,
    Failed,
    Cancelled,
    Refunded,
}

impl PaymentStatusType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatusType::Pending => "pending",
            PaymentStatusType::Success => "success",
            PaymentStatusType::Failed => "failed",
            PaymentStatusType::Cancelled => "cancelled",
            PaymentStatusType::Refunded => "refunded",
        }
    }
}

impl Display for PaymentStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            "refunded" => Ok(Self::Refunded),
            s => Err(ConversionError::new("payment status", s)),
        }
    }
}

//--------------------------------------    PaymentMethod      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    Paypal,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::Paypal => "paypal",
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "credit_card" => Ok(Self::CreditCard),
            "paypal" => Ok(Self::Paypal),
            s => Err(ConversionError::new("payment method", s)),
        }
    }
}

//--------------------------------------      CartLine        ---------------------------------------------------------
/// A single line in a user's cart. Carts carry no prices; those are resolved from the catalog when needed.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl CartLine {
    pub fn new(product_id: ProductId, quantity: i64) -> Self {
        Self { product_id, quantity }
    }
}

//--------------------------------------    CatalogEntry      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub product_id: ProductId,
    pub unit_price: Money,
    pub is_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub seller_id: UserId,
    pub title: String,
    pub price: Money,
    pub is_available: bool,
}

impl NewProduct {
    pub fn new<S: Into<String>>(seller_id: UserId, title: S, price: Money) -> Self {
        Self { seller_id, title: title.into(), price, is_available: true }
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i64,
    /// The unit price at the moment the order was created
    pub unit_price: Money,
}

impl OrderLine {
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatusType,
    pub total_price: Money,
    pub shipping_address: String,
    pub billing_address: String,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub lines: Vec<OrderLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Money,
}

/// A fully validated and priced order, ready to be written to the ledger.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub shipping_address: String,
    pub billing_address: String,
    pub payment_method: PaymentMethod,
    pub total_price: Money,
    pub lines: Vec<NewOrderLine>,
}

impl NewOrder {
    /// The cart contents this order was priced from, in cart order.
    pub fn cart_lines(&self) -> Vec<CartLine> {
        self.lines.iter().map(|l| CartLine::new(l.product_id, l.quantity)).collect()
    }
}

//--------------------------------------       Payment         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub amount: Money,
    pub currency: String,
    pub status: PaymentStatusType,
    pub payment_method: PaymentMethod,
    /// The identifier the payment gateway assigned to the payment intent. Never changes once set.
    pub gateway_intent_id: String,
    /// The gateway's explanation for a failed payment, stored verbatim.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: OrderId,
    pub amount: Money,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub gateway_intent_id: String,
}
