use serde::{Deserialize, Serialize};

use crate::db_types::{Order, Payment};

/// A cart was converted into an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
}

impl OrderCreatedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// A confirmed payment moved an order to `paid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
    pub payment: Payment,
}

impl OrderPaidEvent {
    pub fn new(order: Order, payment: Payment) -> Self {
        Self { order, payment }
    }
}

/// The gateway reported a failed payment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentFailedEvent {
    pub payment: Payment,
}

impl PaymentFailedEvent {
    pub fn new(payment: Payment) -> Self {
        Self { payment }
    }
}
