//! Verification of Stripe webhook calls.
//!
//! Stripe signs every webhook with the endpoint secret. The `Stripe-Signature` header has the form
//! `t=<unix timestamp>,v1=<hex signature>[,v1=...]`, where each `v1` value is
//! `HMAC-SHA256(secret, "<timestamp>.<raw body>")`. Several `v1` entries are present while a secret is being rolled;
//! any one of them matching is sufficient. Other schemes (e.g. `v0`) are ignored.
use chrono::Utc;
use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha256;

use crate::{StripeApiError, WebhookEvent};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<Vec<u8>>,
}

pub fn parse_signature_header(header: &str) -> Result<SignatureHeader, StripeApiError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                let ts = value
                    .parse::<i64>()
                    .map_err(|e| StripeApiError::MalformedSignatureHeader(format!("Invalid timestamp. {e}")))?;
                timestamp = Some(ts);
            },
            "v1" => match hex::decode(value) {
                Ok(sig) => signatures.push(sig),
                Err(e) => debug!("Skipping a v1 signature that is not valid hex. {e}"),
            },
            _ => {},
        }
    }
    let timestamp =
        timestamp.ok_or_else(|| StripeApiError::MalformedSignatureHeader("No timestamp present".to_string()))?;
    if signatures.is_empty() {
        return Err(StripeApiError::MalformedSignatureHeader("No v1 signatures present".to_string()));
    }
    Ok(SignatureHeader { timestamp, signatures })
}

fn mac_for(secret: &str, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, StripeApiError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| StripeApiError::Initialization(format!("Invalid webhook secret. {e}")))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Checks the signature header against the raw payload, as of `now` (unix seconds).
pub fn verify_signature_at(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance: u64,
    now: i64,
) -> Result<(), StripeApiError> {
    let header = parse_signature_header(header)?;
    if now.abs_diff(header.timestamp) > tolerance {
        return Err(StripeApiError::StaleTimestamp);
    }
    let mac = mac_for(secret, header.timestamp, payload)?;
    // verify_slice compares in constant time
    let matched = header.signatures.iter().any(|sig| mac.clone().verify_slice(sig).is_ok());
    if matched {
        Ok(())
    } else {
        Err(StripeApiError::SignatureMismatch)
    }
}

pub fn verify_signature(payload: &[u8], header: &str, secret: &str, tolerance: u64) -> Result<(), StripeApiError> {
    verify_signature_at(payload, header, secret, tolerance, Utc::now().timestamp())
}

/// Verifies the payload and only then deserializes it.
pub fn construct_event(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance: u64,
) -> Result<WebhookEvent, StripeApiError> {
    verify_signature(payload, header, secret, tolerance)?;
    serde_json::from_slice(payload).map_err(|e| StripeApiError::JsonError(e.to_string()))
}

/// Produces a `Stripe-Signature` header value for the payload, the same way Stripe does.
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> Result<String, StripeApiError> {
    let mac = mac_for(secret, timestamp, payload)?;
    let sig = hex::encode(mac.finalize().into_bytes());
    Ok(format!("t={timestamp},v1={sig}"))
}
