use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::StripeApiError;

pub const PAYMENT_INTENT_SUCCEEDED: &str = "payment_intent.succeeded";
pub const PAYMENT_INTENT_FAILED: &str = "payment_intent.payment_failed";

/// The subset of a Stripe `PaymentIntent` object that the marketplace reads.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PaymentIntent {
    pub id: String,
    /// Amount in the currency's minor unit
    pub amount: i64,
    pub currency: String,
    pub status: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub last_payment_error: Option<LastPaymentError>,
}

impl PaymentIntent {
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LastPaymentError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub decline_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl LastPaymentError {
    /// A single human-readable line, preferring the message, then the decline code, then the error code.
    pub fn summary(&self) -> Option<String> {
        match (&self.code, &self.message) {
            (Some(code), Some(msg)) => Some(format!("{code}: {msg}")),
            (None, Some(msg)) => Some(msg.clone()),
            (Some(code), None) => Some(self.decline_code.clone().unwrap_or_else(|| code.clone())),
            (None, None) => self.decline_code.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventData {
    pub object: Value,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: i64,
    pub data: EventData,
}

impl WebhookEvent {
    pub fn is_payment_intent_event(&self) -> bool {
        self.event_type == PAYMENT_INTENT_SUCCEEDED || self.event_type == PAYMENT_INTENT_FAILED
    }

    /// Interprets the event payload as a payment intent.
    pub fn payment_intent(&self) -> Result<PaymentIntent, StripeApiError> {
        serde_json::from_value(self.data.object.clone()).map_err(|e| StripeApiError::JsonError(e.to_string()))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StripeErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

/// The envelope Stripe wraps every API error in.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StripeErrorBody {
    pub error: StripeErrorDetail,
}

impl StripeErrorBody {
    pub fn message(&self) -> String {
        let detail = &self.error;
        let msg = detail.message.clone().unwrap_or_else(|| "no message".to_string());
        match (&detail.error_type, &detail.code) {
            (Some(t), Some(c)) => format!("{t} ({c}): {msg}"),
            (Some(t), None) => format!("{t}: {msg}"),
            (None, Some(c)) => format!("{c}: {msg}"),
            (None, None) => msg,
        }
    }
}
