//! Form-intake provider port.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

/// Port for form-intake provider integrations.
///
/// The only interaction is inbound: authenticate a webhook delivery and
/// construct the typed event.
pub trait FormProvider: Send + Sync {
    /// Verify a webhook signature and construct the typed event.
    ///
    /// The signature covers the raw body bytes; verification happens before
    /// the body is parsed, so a parse failure can only occur on an
    /// authenticated delivery.
    fn construct_event(&self, payload: &[u8], signature: &str) -> Result<FormEvent, FormError>;
}

/// A verified webhook event from the form-intake provider.
#[derive(Debug, Clone, PartialEq)]
pub struct FormEvent {
    pub event_id: String,
    pub event_type: FormEventType,
    pub created_at: Option<DateTime<Utc>>,

    /// The event payload, undecoded. Decoded into [`FormResponse`] once the
    /// event type is recognized.
    pub data: serde_json::Value,
}

/// Closed set of form event types this service dispatches on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEventType {
    /// A respondent submitted a form.
    FormResponse,

    /// Any other event type. Accepted and ignored.
    Unrecognized(String),
}

impl FormEventType {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "FORM_RESPONSE" => Self::FormResponse,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn as_tag(&self) -> &str {
        match self {
            Self::FormResponse => "FORM_RESPONSE",
            Self::Unrecognized(tag) => tag,
        }
    }
}

/// Payload of a `FORM_RESPONSE` event.
#[derive(Debug, Clone, Deserialize)]
pub struct FormResponse {
    #[serde(rename = "responseId", default)]
    pub response_id: String,

    #[serde(rename = "submissionId", default)]
    pub submission_id: String,

    #[serde(rename = "respondentId", default)]
    pub respondent_id: String,

    #[serde(rename = "formId", default)]
    pub form_id: String,

    #[serde(rename = "formName", default)]
    pub form_name: String,

    #[serde(default)]
    pub fields: Vec<FormField>,
}

impl FormResponse {
    /// The respondent's email address, taken from the first field whose
    /// label contains "email" (case-insensitive) and whose value is a
    /// string. Later matches are ignored.
    pub fn email_field(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.label.to_lowercase().contains("email"))
            .and_then(|f| f.value.as_str())
    }
}

/// One answered field in a form response.
#[derive(Debug, Clone, Deserialize)]
pub struct FormField {
    #[serde(default)]
    pub key: String,

    #[serde(default)]
    pub label: String,

    #[serde(rename = "type", default)]
    pub field_type: String,

    /// Field value; shape depends on `field_type`.
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Errors from form provider operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("webhook has no signature header")]
    NotSigned,

    #[error("webhook had no valid signature")]
    NoValidSignature,

    #[error("failed to parse webhook body json: {0}")]
    Parse(String),
}

impl FormError {
    /// True for errors raised before the event was authenticated.
    pub fn is_verification_failure(&self) -> bool {
        matches!(self, Self::NotSigned | Self::NoValidSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response_with_fields(fields: serde_json::Value) -> FormResponse {
        serde_json::from_value(json!({
            "responseId": "resp_1",
            "submissionId": "sub_1",
            "respondentId": "who_1",
            "formId": "form_abc",
            "formName": "Beta Waitlist",
            "fields": fields,
        }))
        .unwrap()
    }

    #[test]
    fn event_type_round_trips_tags() {
        assert_eq!(
            FormEventType::from_tag("FORM_RESPONSE"),
            FormEventType::FormResponse
        );
        let unknown = FormEventType::from_tag("FORM_DELETED");
        assert_eq!(
            unknown,
            FormEventType::Unrecognized("FORM_DELETED".to_string())
        );
        assert_eq!(unknown.as_tag(), "FORM_DELETED");
    }

    #[test]
    fn email_field_takes_first_match() {
        let response = response_with_fields(json!([
            {"key": "q1", "label": "Your Email", "type": "INPUT_EMAIL", "value": "first@example.com"},
            {"key": "q2", "label": "Backup email", "type": "INPUT_EMAIL", "value": "second@example.com"},
        ]));
        assert_eq!(response.email_field(), Some("first@example.com"));
    }

    #[test]
    fn email_field_matches_label_case_insensitively() {
        let response = response_with_fields(json!([
            {"key": "q1", "label": "EMAIL ADDRESS", "type": "INPUT_TEXT", "value": "a@example.com"},
        ]));
        assert_eq!(response.email_field(), Some("a@example.com"));
    }

    #[test]
    fn email_field_ignores_non_string_values() {
        let response = response_with_fields(json!([
            {"key": "q1", "label": "Email opt-in", "type": "CHECKBOX", "value": true},
        ]));
        assert_eq!(response.email_field(), None);
    }

    #[test]
    fn email_field_absent_when_no_label_matches() {
        let response = response_with_fields(json!([
            {"key": "q1", "label": "Name", "type": "INPUT_TEXT", "value": "Jane"},
        ]));
        assert_eq!(response.email_field(), None);
    }

    #[test]
    fn response_tolerates_missing_fields() {
        let response: FormResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.fields.is_empty());
        assert_eq!(response.form_id, "");
    }
}
