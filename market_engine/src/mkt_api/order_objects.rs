use serde::{Deserialize, Serialize};

use crate::db_types::{Money, ProductId};

/// The customer-supplied details needed to turn a cart into an order.
///
/// The payment method is kept as free text here, so that an unknown method is reported as a validation failure
/// rather than a decoding failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub shipping_address: String,
    #[serde(default)]
    pub billing_address: String,
    #[serde(default)]
    pub payment_method: String,
}

impl CheckoutRequest {
    pub fn new<S: Into<String>>(shipping_address: S, billing_address: S, payment_method: S) -> Self {
        Self {
            shipping_address: shipping_address.into(),
            billing_address: billing_address.into(),
            payment_method: payment_method.into(),
        }
    }
}

/// A cart line, enriched with its live catalog price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartViewLine {
    pub product_id: ProductId,
    pub quantity: i64,
    /// `None` if the product no longer exists
    pub unit_price: Option<Money>,
    pub is_available: bool,
    pub line_total: Option<Money>,
}

/// A user's cart, priced at the time it was read. Only available products count towards the total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartView {
    pub lines: Vec<CartViewLine>,
    pub total: Money,
}
