use std::fmt::Debug;

use log::*;

use crate::{
    events::{EventProducers, OrderPaidEvent, PaymentFailedEvent},
    mkt_api::{errors::ReconcileError, payment_objects::ReconcileOutcome},
    traits::{GatewayEvent, PaymentFailureOutcome, PaymentGateway, PaymentManagement, PaymentSuccessOutcome},
};

/// `ReconcilerApi` applies the events the payment gateway pushes to us.
///
/// Events are authenticated before anything else happens. Each event is applied in its own transaction, and applying
/// the same event twice has the same effect as applying it once.
pub struct ReconcilerApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
}

impl<B, G> Debug for ReconcilerApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconcilerApi")
    }
}

impl<B, G> ReconcilerApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self { db, gateway, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, G> ReconcilerApi<B, G>
where
    B: PaymentManagement,
    G: PaymentGateway,
{
    /// Authenticates and applies a raw gateway event.
    ///
    /// | event              | payment                                  | order                                    |
    /// |--------------------|------------------------------------------|------------------------------------------|
    /// | payment succeeded  | `success` (no-op if already `success`)   | `paid`, if it was `pending`/`cancelled`  |
    /// | payment failed     | `failed` + error detail (never regresses `success`) | untouched                     |
    /// | anything else      | untouched                                | untouched                                |
    ///
    /// Signature failures are reported before any state is read.
    pub async fn handle_gateway_event(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let signature = signature.ok_or(ReconcileError::MissingSignature)?;
        let event = self.gateway.verify_event(payload, signature).map_err(|e| {
            warn!("🔄️ Rejected gateway event. {e}");
            ReconcileError::from(e)
        })?;
        let outcome = match event {
            GatewayEvent::PaymentSucceeded { intent_id, order_id } => {
                trace!("🔄️ Payment {intent_id} for order #{order_id} succeeded");
                let outcome = self.db.apply_payment_success(&intent_id, order_id).await?;
                if let PaymentSuccessOutcome::Applied { payment, order, order_updated: true } = &outcome {
                    self.producers.publish_order_paid(OrderPaidEvent::new(order.clone(), payment.clone())).await;
                }
                ReconcileOutcome::Success(outcome)
            },
            GatewayEvent::PaymentFailed { intent_id, error_detail } => {
                trace!("🔄️ Payment {intent_id} failed");
                let outcome = self.db.apply_payment_failure(&intent_id, error_detail).await?;
                if let PaymentFailureOutcome::Applied(payment) = &outcome {
                    self.producers.publish_payment_failed(PaymentFailedEvent::new(payment.clone())).await;
                }
                ReconcileOutcome::Failure(outcome)
            },
            GatewayEvent::Other { kind } => ReconcileOutcome::Ignored(kind),
        };
        debug!("🔄️ {}", outcome.summary());
        Ok(outcome)
    }
}
