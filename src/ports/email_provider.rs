//! Email provider port.
//!
//! Wire types mirror the SendGrid v3 request shapes; the trait keeps the
//! handlers testable without a network.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Port for email provider integrations.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Create or update contacts and subscribe them to mailing lists.
    ///
    /// Returns the provider's asynchronous job ID, or `None` when the call
    /// was suppressed (sandbox mode).
    async fn upsert_contact(&self, request: &ContactRequest)
        -> Result<Option<String>, EmailApiError>;

    /// Send a dynamic-template email.
    ///
    /// Takes the request by value: sandbox mode rewrites the mail settings
    /// before dispatch.
    async fn send_template(&self, request: MailRequest) -> Result<(), EmailApiError>;

    /// Create a new mailing list.
    async fn create_list(&self, name: &str) -> Result<(), EmailApiError>;
}

/// Contact upsert request body.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ContactRequest {
    pub list_ids: Vec<String>,
    pub contacts: Vec<Contact>,
}

/// One contact in an upsert request.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Contact {
    pub email: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// An email address with an optional display name.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct MailAddress {
    pub email: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
}

impl MailAddress {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
        }
    }
}

/// Per-recipient section of a mail request.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Personalization {
    pub to: Vec<MailAddress>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    pub dynamic_template_data: serde_json::Map<String, serde_json::Value>,

    /// Opaque key/values echoed back in provider event webhooks.
    pub custom_args: HashMap<String, String>,
}

/// Dynamic-template mail send request body.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MailRequest {
    pub personalizations: Vec<Personalization>,
    pub from: MailAddress,
    pub reply_to: MailAddress,
    pub template_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail_settings: Option<MailSettings>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_settings: Option<TrackingSettings>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct MailSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox_mode: Option<Setting>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct TrackingSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_tracking: Option<Setting>,
}

/// A single on/off switch in a settings block.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct Setting {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
}

impl Setting {
    pub fn enabled(enable: bool) -> Self {
        Self {
            enable: Some(enable),
        }
    }
}

/// A single field error in the provider's error response body.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    #[serde(default)]
    pub field: Option<String>,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub error_id: Option<String>,
}

/// Errors from email provider operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmailApiError {
    #[error("transport error: {0}")]
    Network(String),

    #[error("api error (status {status_code}): {}", summarize(.errors))]
    Api {
        status_code: u16,
        errors: Vec<FieldError>,
    },
}

/// First error message plus a count of the rest.
fn summarize(errors: &[FieldError]) -> String {
    match errors.first() {
        None => "no error detail".to_string(),
        Some(first) if errors.len() == 1 => first.message.clone(),
        Some(first) => format!("{} (and {} more)", first.message, errors.len() - 1),
    }
}
