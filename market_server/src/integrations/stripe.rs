//! Stripe as the marketplace's [`PaymentGateway`].
//!
//! Payment intents are tagged with the order id in their metadata (`metadata[order_id]`), which is how webhook events
//! are traced back to orders.
use log::*;
use market_engine::{
    db_types::OrderId,
    traits::{AuthorizedIntent, GatewayError, GatewayEvent, IntentRequest, PaymentGateway},
};
use mkt_common::Secret;
use stripe_tools::{
    webhook,
    PaymentIntent,
    StripeApi,
    StripeApiError,
    StripeConfig,
    ORDER_ID_METADATA_KEY,
    PAYMENT_INTENT_FAILED,
    PAYMENT_INTENT_SUCCEEDED,
};

#[derive(Clone)]
pub struct StripeGateway {
    api: StripeApi,
    webhook_secret: Secret<String>,
    tolerance: u64,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> Result<Self, StripeApiError> {
        let webhook_secret = config.webhook_secret.clone();
        let tolerance = config.webhook_tolerance;
        let api = StripeApi::new(config)?;
        Ok(Self { api, webhook_secret, tolerance })
    }
}

fn gateway_error(e: StripeApiError) -> GatewayError {
    match e {
        StripeApiError::Timeout => GatewayError::Timeout,
        StripeApiError::Unreachable(s) | StripeApiError::Initialization(s) => GatewayError::Unreachable(s),
        StripeApiError::QueryError { status, message } => GatewayError::Rejected(format!("{status}. {message}")),
        e if e.is_signature_error() => GatewayError::InvalidSignature(e.to_string()),
        e => GatewayError::MalformedEvent(e.to_string()),
    }
}

fn order_id_from_metadata(intent: &PaymentIntent) -> Result<OrderId, GatewayError> {
    let value = intent.metadata_value(ORDER_ID_METADATA_KEY).ok_or_else(|| {
        GatewayError::MalformedEvent(format!("Payment intent {} has no {ORDER_ID_METADATA_KEY} metadata", intent.id))
    })?;
    value.parse::<OrderId>().map_err(|e| GatewayError::MalformedEvent(e.to_string()))
}

impl PaymentGateway for StripeGateway {
    async fn authorize(&self, request: IntentRequest) -> Result<AuthorizedIntent, GatewayError> {
        let order_id = request.order_id.to_string();
        let description = format!("Campus market order #{order_id}");
        let intent = self
            .api
            .create_payment_intent(request.amount.value(), &request.currency, &order_id, Some(&description))
            .await
            .map_err(gateway_error)?;
        let client_secret = intent.client_secret.ok_or_else(|| {
            GatewayError::Rejected(format!("Stripe did not return a client secret for intent {}", intent.id))
        })?;
        Ok(AuthorizedIntent { intent_id: intent.id, client_secret })
    }

    fn verify_event(&self, payload: &[u8], signature: &str) -> Result<GatewayEvent, GatewayError> {
        let secret = self.webhook_secret.reveal();
        if secret.is_empty() {
            return Err(GatewayError::InvalidSignature("No webhook secret is configured".to_string()));
        }
        let event = webhook::construct_event(payload, signature, secret, self.tolerance).map_err(gateway_error)?;
        trace!("💳️ Stripe event {} ({}) verified", event.id, event.event_type);
        match event.event_type.as_str() {
            PAYMENT_INTENT_SUCCEEDED => {
                let intent = event.payment_intent().map_err(gateway_error)?;
                let order_id = order_id_from_metadata(&intent)?;
                Ok(GatewayEvent::PaymentSucceeded { intent_id: intent.id, order_id })
            },
            PAYMENT_INTENT_FAILED => {
                let intent = event.payment_intent().map_err(gateway_error)?;
                let error_detail = intent.last_payment_error.as_ref().and_then(|e| e.summary());
                Ok(GatewayEvent::PaymentFailed { intent_id: intent.id, error_detail })
            },
            kind => Ok(GatewayEvent::Other { kind: kind.to_string() }),
        }
    }
}
