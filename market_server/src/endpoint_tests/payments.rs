use std::time::Duration;

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use market_engine::{
    db_types::{Money, OrderId, OrderStatusType, PaymentStatusType},
    traits::{AuthorizedIntent, GatewayError, PaymentGateway},
    PaymentIntentApi,
};
use serde_json::json;

use super::{
    helpers::{get_request, json, post_request, user_token},
    mocks::{order, payment, MockBackend, MockGateway, StalledGateway},
};
use crate::routes::{CreatePaymentIntentRoute, OrderPaymentsRoute};

fn configure<G>(backend: MockBackend, gateway: G) -> impl FnOnce(&mut ServiceConfig)
where G: PaymentGateway + 'static {
    move |cfg| {
        let api = PaymentIntentApi::new(backend, gateway).with_timeout(Duration::from_millis(200));
        cfg.app_data(web::Data::new(api))
            .service(CreatePaymentIntentRoute::<MockBackend, G>::new())
            .service(OrderPaymentsRoute::<MockBackend, G>::new());
    }
}

fn pending_order_for_alice(backend: &mut MockBackend) {
    backend
        .expect_fetch_order_for_user()
        .withf(|user_id, id| user_id.as_str() == "alice" && *id == OrderId(7))
        .returning(|_, _| Ok(Some(order(7, "alice", OrderStatusType::Pending, 2500))));
}

fn intent_body(amount: i64) -> serde_json::Value {
    json!({"order_id": 7, "amount": amount, "currency": "USD"})
}

#[actix_web::test]
async fn create_payment_intent() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    pending_order_for_alice(&mut backend);
    let mut gateway = MockGateway::new();
    gateway
        .expect_authorize()
        .withf(|req| req.order_id == OrderId(7) && req.amount == Money::from(2500) && req.currency == "usd")
        .times(1)
        .returning(|_| Ok(AuthorizedIntent { intent_id: "pi_123".into(), client_secret: "pi_123_secret_abc".into() }));
    backend
        .expect_insert_payment()
        .withf(|p| p.order_id == OrderId(7) && p.gateway_intent_id == "pi_123" && p.amount == Money::from(2500))
        .times(1)
        .returning(|_| Ok(payment(11, 7, "pi_123", PaymentStatusType::Pending)));
    let (status, body) =
        post_request(&user_token("alice"), "/payments/create-intent", intent_body(2500), configure(backend, gateway))
            .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"payment_id":11,"client_secret":"pi_123_secret_abc"}"#);
}

#[actix_web::test]
async fn create_payment_intent_for_wrong_amount() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    pending_order_for_alice(&mut backend);
    backend.expect_insert_payment().never();
    let mut gateway = MockGateway::new();
    gateway.expect_authorize().never();
    let (status, body) =
        post_request(&user_token("alice"), "/payments/create-intent", intent_body(2000), configure(backend, gateway))
            .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Amount 20.00 does not match the order total of 25.00"}"#);
}

#[actix_web::test]
async fn create_payment_intent_with_bad_currency() {
    let _ = env_logger::try_init().ok();
    let backend = MockBackend::new();
    let gateway = MockGateway::new();
    let body = json!({"order_id": 7, "amount": 2500, "currency": "dollars"});
    let (status, _) =
        post_request(&user_token("alice"), "/payments/create-intent", body, configure(backend, gateway)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn create_payment_intent_for_paid_order() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend
        .expect_fetch_order_for_user()
        .returning(|_, _| Ok(Some(order(7, "alice", OrderStatusType::Paid, 2500))));
    let mut gateway = MockGateway::new();
    gateway.expect_authorize().never();
    let (status, body) =
        post_request(&user_token("alice"), "/payments/create-intent", intent_body(2500), configure(backend, gateway))
            .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, r#"{"error":"Order 7 is paid and cannot be paid for"}"#);
}

#[actix_web::test]
async fn create_payment_intent_for_someone_elses_order() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_order_for_user().returning(|_, _| Ok(None));
    let mut gateway = MockGateway::new();
    gateway.expect_authorize().never();
    let (status, _) =
        post_request(&user_token("mallory"), "/payments/create-intent", intent_body(2500), configure(backend, gateway))
            .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn create_payment_intent_when_gateway_is_down() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    pending_order_for_alice(&mut backend);
    backend.expect_insert_payment().never();
    let mut gateway = MockGateway::new();
    gateway.expect_authorize().returning(|_| Err(GatewayError::Unreachable("connection refused".into())));
    let (status, body) =
        post_request(&user_token("alice"), "/payments/create-intent", intent_body(2500), configure(backend, gateway))
            .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, r#"{"error":"An upstream service failed. Please try again later."}"#);
    assert!(!body.contains("connection refused"));
}

#[actix_web::test]
async fn create_payment_intent_when_gateway_stalls() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    pending_order_for_alice(&mut backend);
    backend.expect_insert_payment().never();
    let (status, body) = post_request(
        &user_token("alice"),
        "/payments/create-intent",
        intent_body(2500),
        configure(backend, StalledGateway),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, r#"{"error":"An upstream service failed. Please try again later."}"#);
}

#[actix_web::test]
async fn payments_for_order() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    pending_order_for_alice(&mut backend);
    backend.expect_fetch_payments_for_order().withf(|id| *id == OrderId(7)).returning(|_| {
        Ok(vec![payment(11, 7, "pi_1", PaymentStatusType::Failed), payment(12, 7, "pi_2", PaymentStatusType::Pending)])
    });
    let (status, body) =
        get_request(&user_token("alice"), "/orders/7/payments", configure(backend, MockGateway::new())).await;
    assert_eq!(status, StatusCode::OK);
    let payments = json(&body);
    assert_eq!(payments[0]["id"], 11);
    assert_eq!(payments[0]["status"], "failed");
    assert_eq!(payments[1]["status"], "pending");
}
