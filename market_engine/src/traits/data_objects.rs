use serde::{Deserialize, Serialize};

use crate::db_types::{Order, Payment};

/// The result of applying a successful payment event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentSuccessOutcome {
    /// The payment moved to `success`. `order_updated` is false when the order was already past `pending`.
    Applied { payment: Payment, order: Order, order_updated: bool },
    /// The payment was already `success`. Nothing was changed.
    AlreadyApplied(Payment),
}

/// The result of applying a failed payment event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentFailureOutcome {
    Applied(Payment),
    /// The payment was already `failed`. Nothing was changed.
    AlreadyApplied(Payment),
    /// The payment has already succeeded, so the (late) failure was ignored.
    Superseded(Payment),
}
