use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{config::StripeConfig, PaymentIntent, StripeApiError, StripeErrorBody};

/// The metadata key that links a payment intent back to a marketplace order.
pub const ORDER_ID_METADATA_KEY: &str = "order_id";

#[derive(Clone)]
pub struct StripeApi {
    config: StripeConfig,
    client: Arc<Client>,
}

impl StripeApi {
    pub fn new(config: StripeConfig) -> Result<Self, StripeApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let bearer = format!("Bearer {}", config.secret_key.reveal());
        let mut val = HeaderValue::from_str(&bearer).map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        headers.insert("Content-Type", HeaderValue::from_static("application/x-www-form-urlencoded"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url.trim_end_matches('/'))
    }

    /// Sends a form-encoded request, which is the only body encoding the Stripe API accepts.
    pub async fn rest_query<T: DeserializeOwned, F: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        form: Option<&F>,
    ) -> Result<T, StripeApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if let Some(form) = form {
            req = req.form(form);
        }
        let response = req.send().await?;
        let status = response.status();
        if status.is_success() {
            trace!("REST query successful. {status}");
            response.json::<T>().await.map_err(|e| StripeApiError::JsonError(e.to_string()))
        } else {
            let text = response.text().await?;
            let message = serde_json::from_str::<StripeErrorBody>(&text).map(|b| b.message()).unwrap_or(text);
            Err(StripeApiError::QueryError { status: status.as_u16(), message })
        }
    }

    /// Creates a payment intent for `amount` minor units of `currency`, tagged with the order id.
    pub async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
        order_id: &str,
        description: Option<&str>,
    ) -> Result<PaymentIntent, StripeApiError> {
        let amount = amount.to_string();
        let currency = currency.to_lowercase();
        let metadata_key = format!("metadata[{ORDER_ID_METADATA_KEY}]");
        let mut form = vec![
            ("amount", amount.as_str()),
            ("currency", currency.as_str()),
            (metadata_key.as_str(), order_id),
            ("automatic_payment_methods[enabled]", "true"),
        ];
        if let Some(description) = description {
            form.push(("description", description));
        }
        debug!("💳️ Requesting a payment intent for order {order_id}: {amount} {currency}");
        let intent = self.rest_query::<PaymentIntent, _>(Method::POST, "/v1/payment_intents", Some(&form)).await?;
        info!("💳️ Stripe issued payment intent {} for order {order_id}", intent.id);
        Ok(intent)
    }

    pub async fn fetch_payment_intent(&self, intent_id: &str) -> Result<PaymentIntent, StripeApiError> {
        let path = format!("/v1/payment_intents/{intent_id}");
        self.rest_query::<PaymentIntent, ()>(Method::GET, &path, None).await
    }
}
