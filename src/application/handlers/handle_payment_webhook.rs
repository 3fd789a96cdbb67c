//! Payment webhook use case.

use std::sync::Arc;

use tracing::{debug, error, info};

use super::checkout_fanout::{CheckoutFanout, MailerIdentity};
use super::WebhookError;
use crate::domain::Catalogue;
use crate::ports::{
    CheckoutMode, CheckoutSession, EmailProvider, PaymentError, PaymentEvent, PaymentEventType,
    PaymentProvider, SessionUnpaid, VerifiedCheckoutSession,
};

/// Verifies payment webhooks and dispatches recognized events.
pub struct PaymentWebhookHandler {
    payments: Arc<dyn PaymentProvider>,
    fanout: CheckoutFanout,
}

impl PaymentWebhookHandler {
    pub fn new(
        payments: Arc<dyn PaymentProvider>,
        email: Arc<dyn EmailProvider>,
        catalogue: Arc<Catalogue>,
        mailer: MailerIdentity,
    ) -> Self {
        Self {
            payments,
            fanout: CheckoutFanout::new(email, catalogue, mailer),
        }
    }

    /// Authenticate a delivery and process it.
    ///
    /// `Ok(())` means the delivery is acknowledged; downstream provider
    /// failures are logged, never surfaced, so the sender does not redeliver
    /// an event we already accepted.
    pub async fn handle(&self, payload: &[u8], signature: &str) -> Result<(), WebhookError> {
        let event = self
            .payments
            .construct_event(payload, signature)
            .map_err(reject)?;

        match &event.event_type {
            PaymentEventType::CheckoutSessionCompleted => {
                self.handle_checkout_completed(event).await
            }
            PaymentEventType::Unrecognized(_) => {
                debug!(
                    event_id = %event.id,
                    event_type = %event.event_type.as_tag(),
                    "ignoring unrecognized event type"
                );
                Ok(())
            }
        }
    }

    async fn handle_checkout_completed(&self, event: PaymentEvent) -> Result<(), WebhookError> {
        let session: CheckoutSession = serde_json::from_value(event.data).map_err(|e| {
            WebhookError::MalformedPayload(format!("decoding checkout session: {e}"))
        })?;

        if session.mode != CheckoutMode::Payment {
            debug!(
                session_id = %session.id,
                mode = ?session.mode,
                "ignoring non-payment checkout session"
            );
            return Ok(());
        }

        let verified = match VerifiedCheckoutSession::try_from(session) {
            Ok(verified) => verified,
            Err(SessionUnpaid) => {
                info!(event_id = %event.id, "checkout session not paid, skipping");
                return Ok(());
            }
        };

        let items = match self.payments.list_line_items(&verified.session_id).await {
            Ok(items) => items,
            Err(e) => {
                error!(
                    session_id = %verified.session_id,
                    error = %e,
                    "listing line items failed"
                );
                return Ok(());
            }
        };

        let report = self.fanout.run(&verified, &items).await;
        if let Some(failure) = report.first_error() {
            error!(
                session_id = %verified.session_id,
                failed = report.errors.len(),
                of = report.items_processed,
                stage = %failure.stage,
                error = %failure.source,
                "checkout fan-out finished with failures"
            );
        } else {
            info!(
                session_id = %verified.session_id,
                items = report.items_processed,
                "checkout fan-out complete"
            );
        }
        Ok(())
    }
}

fn reject(e: PaymentError) -> WebhookError {
    WebhookError::Rejected(e.to_string())
}
