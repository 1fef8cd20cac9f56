use std::time::Duration;

use chrono::{TimeZone, Utc};
use market_engine::{
    db_types::{
        CartLine,
        CatalogEntry,
        Money,
        NewOrder,
        NewPayment,
        Order,
        OrderId,
        OrderStatusType,
        Payment,
        PaymentId,
        PaymentMethod,
        PaymentStatusType,
        ProductId,
        UserId,
    },
    traits::{
        AuthorizedIntent,
        CartApiError,
        CartManagement,
        CatalogError,
        CatalogLookup,
        GatewayError,
        GatewayEvent,
        IntentRequest,
        OrderLedgerError,
        OrderManagement,
        PaymentFailureOutcome,
        PaymentGateway,
        PaymentManagement,
        PaymentManagementError,
        PaymentSuccessOutcome,
    },
};
use mockall::mock;

mock! {
    pub Backend {}
    impl Clone for Backend {
        fn clone(&self) -> Self;
    }
    impl CartManagement for Backend {
        async fn fetch_cart_snapshot(&self, user_id: &UserId) -> Result<Vec<CartLine>, CartApiError>;
        async fn add_item(&self, user_id: &UserId, line: CartLine) -> Result<CartLine, CartApiError>;
        async fn set_item_quantity(&self, user_id: &UserId, line: CartLine) -> Result<CartLine, CartApiError>;
        async fn remove_item(&self, user_id: &UserId, product_id: ProductId) -> Result<(), CartApiError>;
        async fn clear_cart(&self, user_id: &UserId) -> Result<u64, CartApiError>;
    }
    impl CatalogLookup for Backend {
        async fn resolve(&self, product_id: ProductId) -> Result<Option<CatalogEntry>, CatalogError>;
    }
    impl OrderManagement for Backend {
        async fn checkout_cart(&self, order: NewOrder) -> Result<Order, OrderLedgerError>;
        async fn fetch_order_for_user(&self, user_id: &UserId, order_id: OrderId) -> Result<Option<Order>, OrderLedgerError>;
        async fn fetch_orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, OrderLedgerError>;
        async fn set_order_status(
            &self,
            user_id: &UserId,
            order_id: OrderId,
            status: OrderStatusType,
        ) -> Result<Option<(OrderStatusType, Order)>, OrderLedgerError>;
    }
    impl PaymentManagement for Backend {
        async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, PaymentManagementError>;
        async fn fetch_payment_by_intent_id(&self, intent_id: &str) -> Result<Option<Payment>, PaymentManagementError>;
        async fn fetch_payments_for_order(&self, order_id: OrderId) -> Result<Vec<Payment>, PaymentManagementError>;
        async fn apply_payment_success(&self, intent_id: &str, order_id: OrderId) -> Result<PaymentSuccessOutcome, PaymentManagementError>;
        async fn apply_payment_failure(&self, intent_id: &str, detail: Option<String>) -> Result<PaymentFailureOutcome, PaymentManagementError>;
    }
}

mock! {
    pub Gateway {}
    impl Clone for Gateway {
        fn clone(&self) -> Self;
    }
    impl PaymentGateway for Gateway {
        async fn authorize(&self, request: IntentRequest) -> Result<AuthorizedIntent, GatewayError>;
        fn verify_event(&self, payload: &[u8], signature: &str) -> Result<GatewayEvent, GatewayError>;
    }
}

/// A gateway that never answers an authorization request.
#[derive(Clone)]
pub struct StalledGateway;

impl PaymentGateway for StalledGateway {
    async fn authorize(&self, _request: IntentRequest) -> Result<AuthorizedIntent, GatewayError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(GatewayError::Timeout)
    }

    fn verify_event(&self, _payload: &[u8], _signature: &str) -> Result<GatewayEvent, GatewayError> {
        Err(GatewayError::InvalidSignature("Not supported".into()))
    }
}

pub fn catalog_entry(product_id: i64, price: i64, is_available: bool) -> CatalogEntry {
    CatalogEntry { product_id: ProductId(product_id), unit_price: Money::from(price), is_available }
}

pub fn order(id: i64, user_id: &str, status: OrderStatusType, total: i64) -> Order {
    let created_at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    Order {
        id: OrderId(id),
        user_id: UserId::from(user_id),
        status,
        total_price: Money::from(total),
        shipping_address: "12 College Rd".into(),
        billing_address: "12 College Rd".into(),
        payment_method: PaymentMethod::CreditCard,
        created_at,
        updated_at: created_at,
        lines: vec![],
    }
}

pub fn payment(id: i64, order_id: i64, intent_id: &str, status: PaymentStatusType) -> Payment {
    let created_at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 5, 0).unwrap();
    Payment {
        id: PaymentId(id),
        order_id: OrderId(order_id),
        amount: Money::from(2500),
        currency: "usd".into(),
        status,
        payment_method: PaymentMethod::CreditCard,
        gateway_intent_id: intent_id.into(),
        error: None,
        created_at,
        updated_at: created_at,
    }
}
