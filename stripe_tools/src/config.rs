use std::time::Duration;

use log::*;
use mkt_common::Secret;

pub const DEFAULT_STRIPE_API_URL: &str = "https://api.stripe.com";
pub const DEFAULT_WEBHOOK_TOLERANCE: u64 = 300;
pub const DEFAULT_STRIPE_TIMEOUT: u64 = 10;

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub api_url: String,
    pub secret_key: Secret<String>,
    pub webhook_secret: Secret<String>,
    /// Maximum age, in seconds, of a signed webhook before it is rejected.
    pub webhook_tolerance: u64,
    pub timeout: Duration,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_STRIPE_API_URL.to_string(),
            secret_key: Secret::default(),
            webhook_secret: Secret::default(),
            webhook_tolerance: DEFAULT_WEBHOOK_TOLERANCE,
            timeout: Duration::from_secs(DEFAULT_STRIPE_TIMEOUT),
        }
    }
}

impl StripeConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("MKT_STRIPE_API_URL").unwrap_or_else(|_| {
            info!("🪛️ MKT_STRIPE_API_URL not set, using {DEFAULT_STRIPE_API_URL}");
            DEFAULT_STRIPE_API_URL.to_string()
        });
        let secret_key = Secret::new(std::env::var("MKT_STRIPE_SECRET_KEY").unwrap_or_else(|_| {
            warn!("🪛️ MKT_STRIPE_SECRET_KEY is not set. Payment intents cannot be created.");
            String::default()
        }));
        let webhook_secret = Secret::new(std::env::var("MKT_STRIPE_WEBHOOK_SECRET").unwrap_or_else(|_| {
            warn!("🪛️ MKT_STRIPE_WEBHOOK_SECRET is not set. All webhook calls from Stripe will be rejected.");
            String::default()
        }));
        let webhook_tolerance = std::env::var("MKT_STRIPE_WEBHOOK_TOLERANCE")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid MKT_STRIPE_WEBHOOK_TOLERANCE '{s}': {e}. Using the default."))
                    .ok()
            })
            .unwrap_or(DEFAULT_WEBHOOK_TOLERANCE);
        let timeout = Duration::from_secs(DEFAULT_STRIPE_TIMEOUT);
        Self { api_url, secret_key, webhook_secret, webhook_tolerance, timeout }
    }

    pub fn has_webhook_secret(&self) -> bool {
        !self.webhook_secret.reveal().is_empty()
    }

    pub fn with_webhook_secret(mut self, secret: &str) -> Self {
        self.webhook_secret = Secret::new(secret.to_string());
        self
    }
}
