use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use market_engine::{
    db_types::OrderId,
    traits::{AuthorizedIntent, GatewayError, GatewayEvent, IntentRequest, PaymentGateway},
};
use serde_json::{json, Value};

pub const TRUSTED_SIGNATURE: &str = "trusted";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayMode {
    Approve,
    Decline,
    Hang,
}

/// An in-memory gateway. Intents are numbered `pi_test_1`, `pi_test_2`, ... and events are JSON objects that are
/// only accepted with the [`TRUSTED_SIGNATURE`].
#[derive(Debug, Clone)]
pub struct FakeGateway {
    mode: GatewayMode,
    issued: Arc<AtomicU64>,
}

impl FakeGateway {
    pub fn new(mode: GatewayMode) -> Self {
        Self { mode, issued: Arc::new(AtomicU64::new(0)) }
    }

    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    pub fn last_intent_id(&self) -> String {
        format!("pi_test_{}", self.issued())
    }
}

impl PaymentGateway for FakeGateway {
    async fn authorize(&self, request: IntentRequest) -> Result<AuthorizedIntent, GatewayError> {
        match self.mode {
            GatewayMode::Approve => {
                let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(AuthorizedIntent {
                    intent_id: format!("pi_test_{n}"),
                    client_secret: format!("pi_test_{n}_secret_{}", request.order_id),
                })
            },
            GatewayMode::Decline => Err(GatewayError::Rejected("card_declined".into())),
            GatewayMode::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Err(GatewayError::Unreachable("hung up".into()))
            },
        }
    }

    fn verify_event(&self, payload: &[u8], signature: &str) -> Result<GatewayEvent, GatewayError> {
        if signature != TRUSTED_SIGNATURE {
            return Err(GatewayError::InvalidSignature("untrusted signature".into()));
        }
        let value: Value = serde_json::from_slice(payload).map_err(|e| GatewayError::MalformedEvent(e.to_string()))?;
        let kind = value["kind"].as_str().unwrap_or_default().to_string();
        let intent_id = value["intent_id"].as_str().unwrap_or_default().to_string();
        match kind.as_str() {
            "succeeded" => {
                let order_id = value["order_id"]
                    .as_i64()
                    .ok_or_else(|| GatewayError::MalformedEvent("missing order id".into()))?;
                Ok(GatewayEvent::PaymentSucceeded { intent_id, order_id: OrderId(order_id) })
            },
            "failed" => {
                let error_detail = value["error"].as_str().map(String::from);
                Ok(GatewayEvent::PaymentFailed { intent_id, error_detail })
            },
            _ => Ok(GatewayEvent::Other { kind }),
        }
    }
}

pub fn succeeded_event(intent_id: &str, order_id: OrderId) -> Vec<u8> {
    json!({"kind": "succeeded", "intent_id": intent_id, "order_id": order_id.value()}).to_string().into_bytes()
}

pub fn failed_event(intent_id: &str, error: &str) -> Vec<u8> {
    json!({"kind": "failed", "intent_id": intent_id, "error": error}).to_string().into_bytes()
}
