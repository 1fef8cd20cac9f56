use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Money, OrderId, PaymentId},
    traits::{PaymentFailureOutcome, PaymentSuccessOutcome},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntentRequest {
    pub order_id: OrderId,
    pub amount: Money,
    pub currency: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// What the client needs to complete the payment. The gateway intent id is deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntentResponse {
    pub payment_id: PaymentId,
    pub client_secret: String,
}

/// The result of handling a single authenticated gateway event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconcileOutcome {
    Success(PaymentSuccessOutcome),
    Failure(PaymentFailureOutcome),
    /// An event kind that requires no action.
    Ignored(String),
}

impl ReconcileOutcome {
    /// True if the event changed any state.
    pub fn changed_state(&self) -> bool {
        matches!(
            self,
            ReconcileOutcome::Success(PaymentSuccessOutcome::Applied { .. }) |
                ReconcileOutcome::Failure(PaymentFailureOutcome::Applied(_))
        )
    }

    pub fn summary(&self) -> String {
        match self {
            ReconcileOutcome::Success(PaymentSuccessOutcome::Applied { payment, order, .. }) => {
                format!("Payment {} succeeded. Order {} is {}", payment.id, order.id, order.status)
            },
            ReconcileOutcome::Success(PaymentSuccessOutcome::AlreadyApplied(p)) => {
                format!("Payment {} was already successful", p.id)
            },
            ReconcileOutcome::Failure(PaymentFailureOutcome::Applied(p)) => format!("Payment {} failed", p.id),
            ReconcileOutcome::Failure(PaymentFailureOutcome::AlreadyApplied(p)) => {
                format!("Payment {} was already marked as failed", p.id)
            },
            ReconcileOutcome::Failure(PaymentFailureOutcome::Superseded(p)) => {
                format!("Payment {} has already succeeded. Failure ignored", p.id)
            },
            ReconcileOutcome::Ignored(kind) => format!("Event {kind} ignored"),
        }
    }
}
