//! SendGrid v3 API client implementing the email provider port.
//!
//! Sandbox mode changes behavior per endpoint: contact upserts are skipped
//! outright (the marketing API has no sandbox switch), while mail sends go
//! through with `mail_settings.sandbox_mode` forced on so the request is
//! validated but nothing is delivered.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::info;

use crate::ports::{
    ContactRequest, EmailApiError, EmailProvider, FieldError, MailRequest, MailSettings, Setting,
};

const DEFAULT_BASE_URL: &str = "https://api.sendgrid.com";

/// SendGrid credentials and endpoint configuration.
#[derive(Debug, Clone)]
pub struct SendGridConfig {
    api_key: SecretString,
    sandbox: bool,
    base_url: String,
}

impl SendGridConfig {
    pub fn new(api_key: SecretString, sandbox: bool) -> Self {
        Self {
            api_key,
            sandbox,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the API base URL. For tests against a local server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// SendGrid client. Cheap to clone; the inner HTTP client is pooled.
#[derive(Debug, Clone)]
pub struct SendGridClient {
    http: reqwest::Client,
    config: SendGridConfig,
}

/// Error body shape SendGrid returns on non-2xx responses.
#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<FieldError>,
}

/// Response body of a contact upsert.
#[derive(Debug, Deserialize)]
struct UpsertResponse {
    job_id: String,
}

impl SendGridClient {
    pub fn new(config: SendGridConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn authorization(&self) -> String {
        format!("BEARER {}", self.config.api_key.expose_secret())
    }

    /// Resolve a response into itself or a typed API error.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, EmailApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body: ErrorResponse = response.json().await.unwrap_or_default();
        Err(EmailApiError::Api {
            status_code: status.as_u16(),
            errors: body.errors,
        })
    }
}

/// Force sandbox mode on a mail request, preserving other settings.
fn apply_sandbox(mut request: MailRequest) -> MailRequest {
    request
        .mail_settings
        .get_or_insert_with(MailSettings::default)
        .sandbox_mode = Some(Setting::enabled(true));
    request
}

#[async_trait]
impl EmailProvider for SendGridClient {
    async fn upsert_contact(
        &self,
        request: &ContactRequest,
    ) -> Result<Option<String>, EmailApiError> {
        if self.config.sandbox {
            info!(
                lists = request.list_ids.len(),
                contacts = request.contacts.len(),
                "sandbox: skipping contact upsert"
            );
            return Ok(None);
        }

        let response = self
            .http
            .put(format!("{}/v3/marketing/contacts", self.config.base_url))
            .header("Authorization", self.authorization())
            .json(request)
            .send()
            .await
            .map_err(|e| EmailApiError::Network(e.to_string()))?;

        let body: UpsertResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| EmailApiError::Network(e.to_string()))?;
        Ok(Some(body.job_id))
    }

    async fn send_template(&self, request: MailRequest) -> Result<(), EmailApiError> {
        let request = if self.config.sandbox {
            apply_sandbox(request)
        } else {
            request
        };

        let response = self
            .http
            .post(format!("{}/v3/mail/send", self.config.base_url))
            .header("Authorization", self.authorization())
            .json(&request)
            .send()
            .await
            .map_err(|e| EmailApiError::Network(e.to_string()))?;

        Self::check(response).await?;
        Ok(())
    }

    async fn create_list(&self, name: &str) -> Result<(), EmailApiError> {
        let response = self
            .http
            .post(format!("{}/v3/marketing/lists", self.config.base_url))
            .header("Authorization", self.authorization())
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await
            .map_err(|e| EmailApiError::Network(e.to_string()))?;

        Self::check(response).await?;
        Ok(())
    }
}
