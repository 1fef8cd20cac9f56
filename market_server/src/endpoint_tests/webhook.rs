use actix_web::{http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::Utc;
use market_engine::{
    db_types::{OrderId, OrderStatusType, PaymentStatusType},
    events::EventProducers,
    traits::{
        GatewayError,
        GatewayEvent,
        PaymentFailureOutcome,
        PaymentGateway,
        PaymentManagementError,
        PaymentSuccessOutcome,
    },
    ReconcilerApi,
};
use serde_json::json;
use stripe_tools::{
    webhook::{sign_payload, SIGNATURE_HEADER},
    StripeConfig,
};

use super::{
    helpers::json,
    mocks::{order, payment, MockBackend, MockGateway},
};
use crate::{integrations::stripe::StripeGateway, webhook_routes::StripeWebhookRoute};

const WEBHOOK_SECRET: &str = "whsec_endpoint_tests";

fn configure<G>(backend: MockBackend, gateway: G) -> impl FnOnce(&mut ServiceConfig)
where G: PaymentGateway + 'static {
    move |cfg| {
        cfg.app_data(web::Data::new(ReconcilerApi::new(backend, gateway, EventProducers::default())))
            .service(StripeWebhookRoute::<MockBackend, G>::new());
    }
}

// The webhook is not behind the token middleware, so this calls the app directly.
async fn post_webhook<F>(payload: &[u8], signature: Option<&str>, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let mut req = TestRequest::post().uri("/stripe").set_payload(payload.to_vec());
    if let Some(signature) = signature {
        req = req.insert_header((SIGNATURE_HEADER, signature));
    }
    let service = test::init_service(App::new().configure(configure)).await;
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}

fn gateway_returning(event: GatewayEvent) -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_verify_event().times(1).returning(move |_, _| Ok(event.clone()));
    gateway
}

#[actix_web::test]
async fn missing_signature() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockGateway::new();
    gateway.expect_verify_event().never();
    let (status, body) = post_webhook(b"{}", None, configure(MockBackend::new(), gateway)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"success":false,"message":"Invalid signature."}"#);
}

#[actix_web::test]
async fn invalid_signature() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_apply_payment_success().never();
    backend.expect_apply_payment_failure().never();
    let mut gateway = MockGateway::new();
    gateway
        .expect_verify_event()
        .withf(|payload, signature| payload == b"{}" && signature == "t=1,v1=00")
        .returning(|_, _| Err(GatewayError::InvalidSignature("No matching signature".into())));
    let (status, _) = post_webhook(b"{}", Some("t=1,v1=00"), configure(backend, gateway)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn payment_succeeded() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend
        .expect_apply_payment_success()
        .withf(|intent_id, order_id| intent_id == "pi_1" && *order_id == OrderId(7))
        .times(1)
        .returning(|_, _| {
            Ok(PaymentSuccessOutcome::Applied {
                payment: payment(11, 7, "pi_1", PaymentStatusType::Success),
                order: order(7, "alice", OrderStatusType::Paid, 2500),
                order_updated: true,
            })
        });
    let gateway = gateway_returning(GatewayEvent::PaymentSucceeded { intent_id: "pi_1".into(), order_id: OrderId(7) });
    let (status, body) = post_webhook(b"{}", Some("t=1,v1=ab"), configure(backend, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Payment 11 succeeded. Order 7 is paid"}"#);
}

#[actix_web::test]
async fn duplicate_success_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend
        .expect_apply_payment_success()
        .returning(|_, _| {
            Ok(PaymentSuccessOutcome::AlreadyApplied(payment(11, 7, "pi_1", PaymentStatusType::Success)))
        });
    let gateway = gateway_returning(GatewayEvent::PaymentSucceeded { intent_id: "pi_1".into(), order_id: OrderId(7) });
    let (status, body) = post_webhook(b"{}", Some("t=1,v1=ab"), configure(backend, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["message"], "Payment 11 was already successful");
}

#[actix_web::test]
async fn success_for_another_order_is_applied_to_that_order() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend
        .expect_apply_payment_success()
        .withf(|intent_id, order_id| intent_id == "pi_1" && *order_id == OrderId(8))
        .times(1)
        .returning(|_, _| {
            Ok(PaymentSuccessOutcome::Applied {
                payment: payment(11, 7, "pi_1", PaymentStatusType::Success),
                order: order(8, "alice", OrderStatusType::Paid, 2500),
                order_updated: true,
            })
        });
    let gateway = gateway_returning(GatewayEvent::PaymentSucceeded { intent_id: "pi_1".into(), order_id: OrderId(8) });
    let (status, body) = post_webhook(b"{}", Some("t=1,v1=ab"), configure(backend, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Payment 11 succeeded. Order 8 is paid"}"#);
}

#[actix_web::test]
async fn success_for_unknown_order_is_retried() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend
        .expect_apply_payment_success()
        .returning(|_, order_id| Err(PaymentManagementError::OrderNotFound(order_id)));
    let gateway = gateway_returning(GatewayEvent::PaymentSucceeded { intent_id: "pi_1".into(), order_id: OrderId(9) });
    let (status, body) = post_webhook(b"{}", Some("t=1,v1=ab"), configure(backend, gateway)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json(&body)["success"], false);
}

#[actix_web::test]
async fn success_for_unknown_payment() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend
        .expect_apply_payment_success()
        .returning(|intent_id, _| Err(PaymentManagementError::PaymentNotFound(intent_id.to_string())));
    let gateway = gateway_returning(GatewayEvent::PaymentSucceeded { intent_id: "pi_x".into(), order_id: OrderId(7) });
    let (status, body) = post_webhook(b"{}", Some("t=1,v1=ab"), configure(backend, gateway)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"success":false,"message":"Could not process the event."}"#);
}

#[actix_web::test]
async fn payment_failed() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend
        .expect_apply_payment_failure()
        .withf(|intent_id, detail| intent_id == "pi_1" && detail.as_deref() == Some("card_declined: Declined"))
        .times(1)
        .returning(|_, detail| {
            let mut p = payment(11, 7, "pi_1", PaymentStatusType::Failed);
            p.error = detail;
            Ok(PaymentFailureOutcome::Applied(p))
        });
    let gateway = gateway_returning(GatewayEvent::PaymentFailed {
        intent_id: "pi_1".into(),
        error_detail: Some("card_declined: Declined".into()),
    });
    let (status, body) = post_webhook(b"{}", Some("t=1,v1=ab"), configure(backend, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["message"], "Payment 11 failed");
}

#[actix_web::test]
async fn late_failure_is_ignored() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend
        .expect_apply_payment_failure()
        .returning(|_, _| Ok(PaymentFailureOutcome::Superseded(payment(11, 7, "pi_1", PaymentStatusType::Success))));
    let gateway = gateway_returning(GatewayEvent::PaymentFailed { intent_id: "pi_1".into(), error_detail: None });
    let (status, body) = post_webhook(b"{}", Some("t=1,v1=ab"), configure(backend, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["message"], "Payment 11 has already succeeded. Failure ignored");
}

#[actix_web::test]
async fn other_events_are_ignored() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_apply_payment_success().never();
    backend.expect_apply_payment_failure().never();
    let gateway = gateway_returning(GatewayEvent::Other { kind: "charge.refunded".into() });
    let (status, body) = post_webhook(b"{}", Some("t=1,v1=ab"), configure(backend, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["message"], "Event charge.refunded ignored");
}

fn stripe_gateway() -> StripeGateway {
    StripeGateway::new(StripeConfig::default().with_webhook_secret(WEBHOOK_SECRET)).expect("Could not create gateway")
}

fn succeeded_event(order_id: &str) -> Vec<u8> {
    json!({
        "id": "evt_1",
        "object": "event",
        "type": "payment_intent.succeeded",
        "created": 1717243200,
        "data": { "object": {
            "id": "pi_1", "amount": 2500, "currency": "usd", "status": "succeeded",
            "metadata": { "order_id": order_id }
        }}
    })
    .to_string()
    .into_bytes()
}

#[actix_web::test]
async fn signed_stripe_event() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend
        .expect_apply_payment_success()
        .withf(|intent_id, order_id| intent_id == "pi_1" && *order_id == OrderId(7))
        .times(1)
        .returning(|_, _| {
            Ok(PaymentSuccessOutcome::Applied {
                payment: payment(11, 7, "pi_1", PaymentStatusType::Success),
                order: order(7, "alice", OrderStatusType::Paid, 2500),
                order_updated: true,
            })
        });
    let payload = succeeded_event("7");
    let signature = sign_payload(&payload, WEBHOOK_SECRET, Utc::now().timestamp()).unwrap();
    let (status, _) = post_webhook(&payload, Some(&signature), configure(backend, stripe_gateway())).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn tampered_stripe_event() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_apply_payment_success().never();
    let signature = sign_payload(&succeeded_event("7"), WEBHOOK_SECRET, Utc::now().timestamp()).unwrap();
    let (status, _) = post_webhook(&succeeded_event("8"), Some(&signature), configure(backend, stripe_gateway())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn stale_stripe_event() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_apply_payment_success().never();
    let payload = succeeded_event("7");
    let signature = sign_payload(&payload, WEBHOOK_SECRET, Utc::now().timestamp() - 3600).unwrap();
    let (status, _) = post_webhook(&payload, Some(&signature), configure(backend, stripe_gateway())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn signed_stripe_event_without_order_id() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_apply_payment_success().never();
    let payload = json!({
        "id": "evt_2", "object": "event", "type": "payment_intent.succeeded", "created": 1717243200,
        "data": { "object": { "id": "pi_1", "amount": 2500, "currency": "usd", "status": "succeeded" } }
    })
    .to_string()
    .into_bytes();
    let signature = sign_payload(&payload, WEBHOOK_SECRET, Utc::now().timestamp()).unwrap();
    let (status, _) = post_webhook(&payload, Some(&signature), configure(backend, stripe_gateway())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
