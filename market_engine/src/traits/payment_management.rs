use thiserror::Error;

use crate::{
    db_types::{NewPayment, OrderId, Payment},
    traits::data_objects::{PaymentFailureOutcome, PaymentSuccessOutcome},
};

#[derive(Debug, Clone, Error)]
pub enum PaymentManagementError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("A payment with gateway intent id {0} already exists")]
    DuplicateIntent(String),
    #[error("The requested payment does not exist for intent {0}")]
    PaymentNotFound(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
}

impl From<sqlx::Error> for PaymentManagementError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(ref de) if de.is_unique_violation() => {
                PaymentManagementError::DuplicateIntent(de.message().to_string())
            },
            e => PaymentManagementError::DatabaseError(e.to_string()),
        }
    }
}

/// Storage for payment attempts, and the transactional application of gateway outcomes.
///
/// The status of a payment is only ever changed through [`PaymentManagement::apply_payment_success`] and
/// [`PaymentManagement::apply_payment_failure`].
#[allow(async_fn_in_trait)]
pub trait PaymentManagement: Clone {
    /// Records a new `pending` payment. The gateway intent id must be globally unique.
    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, PaymentManagementError>;

    async fn fetch_payment_by_intent_id(&self, intent_id: &str) -> Result<Option<Payment>, PaymentManagementError>;

    async fn fetch_payments_for_order(&self, order_id: OrderId) -> Result<Vec<Payment>, PaymentManagementError>;

    /// In a single transaction, marks the payment for `intent_id` as `success` and moves order `order_id` to `paid`.
    ///
    /// * A payment that is already `success` is left alone, and so is its order.
    /// * A `failed` payment may still succeed, e.g. when the customer retries on the same intent.
    /// * The order only moves to `paid` from `pending` or `cancelled`. Orders that are already `paid`, `shipped` or
    ///   `delivered` are not touched.
    /// * `order_id` comes from the event and wins over the order the payment was issued for.
    ///
    /// Missing payments or orders are errors, and nothing is written.
    async fn apply_payment_success(
        &self,
        intent_id: &str,
        order_id: OrderId,
    ) -> Result<PaymentSuccessOutcome, PaymentManagementError>;

    /// In a single transaction, marks the payment for `intent_id` as `failed` and stores `detail` verbatim.
    ///
    /// A payment that is already `failed` is left alone. A payment that is already `success` is never regressed; the
    /// late failure is ignored. The order is never touched.
    async fn apply_payment_failure(
        &self,
        intent_id: &str,
        detail: Option<String>,
    ) -> Result<PaymentFailureOutcome, PaymentManagementError>;
}
