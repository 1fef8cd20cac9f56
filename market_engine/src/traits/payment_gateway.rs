use mkt_common::Money;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::OrderId;

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("The gateway rejected the request: {0}")]
    Rejected(String),
    #[error("Could not reach the payment gateway: {0}")]
    Unreachable(String),
    #[error("The payment gateway did not respond in time")]
    Timeout,
    #[error("Event signature is invalid: {0}")]
    InvalidSignature(String),
    #[error("Event payload could not be understood: {0}")]
    MalformedEvent(String),
}

/// A request to authorize `amount` for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentRequest {
    pub order_id: OrderId,
    pub amount: Money,
    /// Lower-case three-letter currency code
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedIntent {
    pub intent_id: String,
    pub client_secret: String,
}

/// An authenticated event pushed by the gateway, reduced to the parts the engine acts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatewayEvent {
    PaymentSucceeded { intent_id: String, order_id: OrderId },
    PaymentFailed { intent_id: String, error_detail: Option<String> },
    /// Any event kind the engine does not act on. These are acknowledged and otherwise ignored.
    Other { kind: String },
}

/// The external payment processor.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway: Clone {
    /// Ask the gateway to authorize a payment, tagging it with the order id so that later events can be traced back
    /// to the order.
    async fn authorize(&self, request: IntentRequest) -> Result<AuthorizedIntent, GatewayError>;

    /// Authenticate `payload` against its signature header and decode it.
    ///
    /// Returns [`GatewayError::InvalidSignature`] if the payload is not authentic, and
    /// [`GatewayError::MalformedEvent`] if it is authentic but cannot be decoded.
    fn verify_event(&self, payload: &[u8], signature: &str) -> Result<GatewayEvent, GatewayError>;
}
