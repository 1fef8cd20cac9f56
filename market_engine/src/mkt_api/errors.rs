use thiserror::Error;

use crate::{
    db_types::{Money, OrderId, OrderStatusType},
    traits::{GatewayError, OrderLedgerError, PaymentManagementError},
};

#[derive(Debug, Clone, Error)]
pub enum PaymentIntentError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Amount must be greater than zero")]
    InvalidAmount,
    #[error("Invalid currency '{0}'. Use a three-letter currency code")]
    InvalidCurrency(String),
    #[error("Amount {requested} does not match the order total of {expected}")]
    AmountMismatch { expected: Money, requested: Money },
    #[error("Order {0} is {1} and cannot be paid for")]
    OrderNotPayable(OrderId, OrderStatusType),
    #[error("The payment gateway did not respond in time")]
    GatewayTimeout,
    #[error("Payment gateway error. {0}")]
    GatewayError(String),
    #[error("The gateway issued intent {0}, which is already recorded")]
    DuplicateIntent(String),
}

impl From<OrderLedgerError> for PaymentIntentError {
    fn from(e: OrderLedgerError) -> Self {
        match e {
            OrderLedgerError::OrderNotFound(id) => PaymentIntentError::OrderNotFound(id),
            e => PaymentIntentError::DatabaseError(e.to_string()),
        }
    }
}

impl From<PaymentManagementError> for PaymentIntentError {
    fn from(e: PaymentManagementError) -> Self {
        match e {
            PaymentManagementError::DuplicateIntent(id) => PaymentIntentError::DuplicateIntent(id),
            PaymentManagementError::OrderNotFound(id) => PaymentIntentError::OrderNotFound(id),
            e => PaymentIntentError::DatabaseError(e.to_string()),
        }
    }
}

impl From<GatewayError> for PaymentIntentError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Timeout => PaymentIntentError::GatewayTimeout,
            e => PaymentIntentError::GatewayError(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    #[error("The event has no signature")]
    MissingSignature,
    #[error("Event signature is invalid. {0}")]
    InvalidSignature(String),
    #[error("Event payload is malformed. {0}")]
    MalformedEvent(String),
    #[error("There is no payment for intent {0}")]
    PaymentNotFound(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl ReconcileError {
    /// Authenticity failures. Nothing was read or written.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, ReconcileError::MissingSignature | ReconcileError::InvalidSignature(_))
    }

    /// Errors that may resolve themselves if the gateway delivers the event again later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ReconcileError::PaymentNotFound(_) | ReconcileError::OrderNotFound(_) | ReconcileError::DatabaseError(_)
        )
    }
}

impl From<GatewayError> for ReconcileError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::InvalidSignature(s) => ReconcileError::InvalidSignature(s),
            GatewayError::MalformedEvent(s) => ReconcileError::MalformedEvent(s),
            e => ReconcileError::MalformedEvent(e.to_string()),
        }
    }
}

impl From<PaymentManagementError> for ReconcileError {
    fn from(e: PaymentManagementError) -> Self {
        match e {
            PaymentManagementError::PaymentNotFound(id) => ReconcileError::PaymentNotFound(id),
            PaymentManagementError::OrderNotFound(id) => ReconcileError::OrderNotFound(id),
            e => ReconcileError::DatabaseError(e.to_string()),
        }
    }
}
