//! Thin client for the parts of the Stripe API the marketplace needs.
//!
//! * [`StripeApi`] creates payment intents over the REST API.
//! * [`webhook`] verifies `Stripe-Signature` headers and parses webhook events.
mod api;
mod config;
mod error;

mod data_objects;
pub mod webhook;

pub use api::{StripeApi, ORDER_ID_METADATA_KEY};
pub use config::{StripeConfig, DEFAULT_STRIPE_API_URL, DEFAULT_STRIPE_TIMEOUT, DEFAULT_WEBHOOK_TOLERANCE};
pub use data_objects::{
    EventData, LastPaymentError, PaymentIntent, StripeErrorBody,
    WebhookEvent,
    PAYMENT_INTENT_FAILED,
    PAYMENT_INTENT_SUCCEEDED,
};
pub use error::StripeApiError;
