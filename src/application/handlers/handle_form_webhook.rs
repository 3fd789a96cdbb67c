//! Form webhook use case: waitlist signups.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::WebhookError;
use crate::domain::{mask, Catalogue, Email};
use crate::ports::{
    verify_email_host, Contact, ContactRequest, DnsResolver, EmailProvider, FormError, FormEvent,
    FormEventType, FormProvider, FormResponse,
};

/// Verifies form webhooks and subscribes respondents to their waitlist.
pub struct FormWebhookHandler {
    forms: Arc<dyn FormProvider>,
    email: Arc<dyn EmailProvider>,
    dns: Arc<dyn DnsResolver>,
    catalogue: Arc<Catalogue>,
}

impl FormWebhookHandler {
    pub fn new(
        forms: Arc<dyn FormProvider>,
        email: Arc<dyn EmailProvider>,
        dns: Arc<dyn DnsResolver>,
        catalogue: Arc<Catalogue>,
    ) -> Self {
        Self {
            forms,
            email,
            dns,
            catalogue,
        }
    }

    /// Authenticate a delivery and process it.
    ///
    /// A signup that cannot proceed (unknown form, missing or invalid
    /// address) is logged and acknowledged; the respondent already submitted
    /// the form and a retry from the provider cannot improve the data.
    pub async fn handle(&self, payload: &[u8], signature: &str) -> Result<(), WebhookError> {
        let event = self
            .forms
            .construct_event(payload, signature)
            .map_err(reject)?;

        match &event.event_type {
            FormEventType::FormResponse => self.handle_form_response(event).await,
            FormEventType::Unrecognized(_) => {
                debug!(
                    event_id = %event.event_id,
                    event_type = %event.event_type.as_tag(),
                    "ignoring unrecognized event type"
                );
                Ok(())
            }
        }
    }

    async fn handle_form_response(&self, event: FormEvent) -> Result<(), WebhookError> {
        let response: FormResponse = serde_json::from_value(event.data).map_err(|e| {
            WebhookError::MalformedPayload(format!("decoding form response: {e}"))
        })?;

        let Some(waitlist) = self.catalogue.waitlist_by_form_id(&response.form_id) else {
            warn!(form_id = %response.form_id, "no waitlist configured for form");
            return Ok(());
        };

        let Some(raw_address) = response.email_field() else {
            warn!(
                form_id = %response.form_id,
                response_id = %response.response_id,
                "form response has no email field"
            );
            return Ok(());
        };

        let email = match Email::parse(raw_address) {
            Ok(email) => email,
            Err(e) => {
                warn!(
                    form_id = %response.form_id,
                    response_id = %response.response_id,
                    error = %e,
                    "signup address failed format validation"
                );
                return Ok(());
            }
        };

        if let Err(e) = verify_email_host(self.dns.as_ref(), &email).await {
            warn!(
                address = %mask(email.as_str()),
                waitlist = %waitlist.name,
                error = %e,
                "signup address failed host validation"
            );
            return Ok(());
        }

        let request = ContactRequest {
            list_ids: waitlist.list_ids.clone(),
            contacts: vec![Contact {
                email: email.as_str().to_string(),
                first_name: None,
                last_name: None,
            }],
        };
        match self.email.upsert_contact(&request).await {
            Ok(Some(job_id)) => info!(
                waitlist = %waitlist.name,
                address = %mask(email.as_str()),
                %job_id,
                "waitlist signup queued"
            ),
            Ok(None) => {}
            Err(e) => error!(
                waitlist = %waitlist.name,
                address = %mask(email.as_str()),
                error = %e,
                "waitlist contact upsert failed"
            ),
        }
        Ok(())
    }
}

fn reject(e: FormError) -> WebhookError {
    WebhookError::Rejected(e.to_string())
}
