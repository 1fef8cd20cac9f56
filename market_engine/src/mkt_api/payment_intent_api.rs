use std::{fmt::Debug, time::Duration};

use log::*;
use mkt_common::helpers::is_currency_code;

use crate::{
    db_types::{NewPayment, OrderId, Payment, UserId},
    mkt_api::{
        errors::PaymentIntentError,
        payment_objects::{PaymentIntentRequest, PaymentIntentResponse},
    },
    traits::{IntentRequest, OrderManagement, PaymentGateway, PaymentManagement},
};

pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);

/// `PaymentIntentApi` asks the payment gateway to authorize payment for an order, and records the attempt as a
/// `pending` payment.
pub struct PaymentIntentApi<B, G> {
    db: B,
    gateway: G,
    timeout: Duration,
}

impl<B, G> Debug for PaymentIntentApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentIntentApi (timeout: {:?})", self.timeout)
    }
}

impl<B, G> PaymentIntentApi<B, G> {
    pub fn new(db: B, gateway: G) -> Self {
        Self { db, gateway, timeout: DEFAULT_GATEWAY_TIMEOUT }
    }

    /// Bounds how long a single gateway call may take.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, G> PaymentIntentApi<B, G>
where
    B: OrderManagement + PaymentManagement,
    G: PaymentGateway,
{
    /// Creates a payment intent for one of the user's orders.
    ///
    /// The amount must be positive and equal to the order total, and the currency must be a three-letter code. Orders
    /// that have already been paid cannot be paid again.
    ///
    /// The payment is only recorded once the gateway has authorized the intent. If the gateway fails or does not
    /// answer within the timeout, nothing is written.
    ///
    /// The response carries the client secret needed to complete payment, never the gateway's intent id.
    pub async fn create_payment_intent(
        &self,
        user_id: &UserId,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntentResponse, PaymentIntentError> {
        if !request.amount.is_positive() {
            return Err(PaymentIntentError::InvalidAmount);
        }
        if !is_currency_code(&request.currency) {
            return Err(PaymentIntentError::InvalidCurrency(request.currency));
        }
        let currency = request.currency.to_ascii_lowercase();
        let order_id = request.order_id;
        let order = self
            .db
            .fetch_order_for_user(user_id, order_id)
            .await?
            .ok_or(PaymentIntentError::OrderNotFound(order_id))?;
        if request.amount != order.total_price {
            return Err(PaymentIntentError::AmountMismatch { expected: order.total_price, requested: request.amount });
        }
        if !order.status.accepts_payment() {
            return Err(PaymentIntentError::OrderNotPayable(order_id, order.status));
        }
        let intent_request = IntentRequest { order_id, amount: request.amount, currency: currency.clone() };
        let intent = match tokio::time::timeout(self.timeout, self.gateway.authorize(intent_request)).await {
            Ok(result) => result.map_err(|e| {
                warn!("💳️ The gateway could not authorize payment for order #{order_id}. {e}");
                e
            })?,
            Err(_) => {
                warn!("💳️ The gateway did not authorize payment for order #{order_id} within {:?}", self.timeout);
                return Err(PaymentIntentError::GatewayTimeout);
            },
        };
        let payment = NewPayment {
            order_id,
            amount: request.amount,
            currency,
            payment_method: order.payment_method,
            gateway_intent_id: intent.intent_id,
        };
        let payment = self.db.insert_payment(payment).await?;
        info!("💳️ Payment #{} of {} created for order #{order_id}", payment.id, payment.amount);
        Ok(PaymentIntentResponse { payment_id: payment.id, client_secret: intent.client_secret })
    }

    /// The payment attempts for one of the user's orders, oldest first.
    pub async fn payments_for_order(
        &self,
        user_id: &UserId,
        order_id: OrderId,
    ) -> Result<Vec<Payment>, PaymentIntentError> {
        let order = self
            .db
            .fetch_order_for_user(user_id, order_id)
            .await?
            .ok_or(PaymentIntentError::OrderNotFound(order_id))?;
        let payments = self.db.fetch_payments_for_order(order.id).await?;
        Ok(payments)
    }
}
