//! Stripe API client implementing the payment provider port.

use async_trait::async_trait;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use super::signature;
use crate::ports::{LineItem, PaymentError, PaymentEvent, PaymentEventType, PaymentProvider};

const DEFAULT_BASE_URL: &str = "https://api.stripe.com";

/// Line items are fetched in pages of this size.
const LINE_ITEMS_PAGE_LIMIT: usize = 100;

/// Stripe credentials and endpoint configuration.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    api_key: SecretString,
    webhook_secret: SecretString,
    base_url: String,
}

impl StripeConfig {
    pub fn new(api_key: SecretString, webhook_secret: SecretString) -> Self {
        Self {
            api_key,
            webhook_secret,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the API base URL. For tests against a local server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Stripe client. Cheap to clone; the inner HTTP client is pooled.
#[derive(Debug, Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    config: StripeConfig,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

/// Webhook event envelope as Stripe delivers it.
#[derive(Debug, Deserialize)]
struct EventEnvelope {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    created: i64,
    data: EventData,
}

#[derive(Debug, Deserialize)]
struct EventData {
    object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct LineItemPage {
    #[serde(default)]
    data: Vec<LineItem>,
    #[serde(default)]
    has_more: bool,
}

#[async_trait]
impl PaymentProvider for StripeClient {
    fn construct_event(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<PaymentEvent, PaymentError> {
        let timestamp = signature::verify(
            self.config.webhook_secret.expose_secret().as_bytes(),
            payload,
            signature_header,
            Utc::now().timestamp(),
        )?;

        let envelope: EventEnvelope = serde_json::from_slice(payload)
            .map_err(|e| PaymentError::Parse(e.to_string()))?;
        debug!(
            event_id = %envelope.id,
            event_type = %envelope.event_type,
            signed_at = timestamp,
            "verified stripe webhook"
        );

        Ok(PaymentEvent {
            id: envelope.id,
            event_type: PaymentEventType::from_tag(&envelope.event_type),
            created: envelope.created,
            data: envelope.data.object,
        })
    }

    async fn list_line_items(&self, session_id: &str) -> Result<Vec<LineItem>, PaymentError> {
        let url = format!(
            "{}/v1/checkout/sessions/{session_id}/line_items",
            self.config.base_url
        );

        let mut items: Vec<LineItem> = Vec::new();
        let mut starting_after: Option<String> = None;

        loop {
            let mut query: Vec<(&str, String)> =
                vec![("limit", LINE_ITEMS_PAGE_LIMIT.to_string())];
            if let Some(cursor) = &starting_after {
                query.push(("starting_after", cursor.clone()));
            }

            let response = self
                .http
                .get(&url)
                .basic_auth(self.config.api_key.expose_secret(), None::<&str>)
                .query(&query)
                .send()
                .await
                .map_err(|e| PaymentError::Network(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(PaymentError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let page: LineItemPage = response
                .json()
                .await
                .map_err(|e| PaymentError::Parse(e.to_string()))?;

            let has_more = page.has_more;
            items.extend(page.data);

            if !has_more {
                break;
            }
            starting_after = match items.last() {
                Some(last) => Some(last.id.clone()),
                // has_more with an empty page should not happen; stop rather
                // than loop on the same request.
                None => break,
            };
        }

        Ok(items)
    }
}
