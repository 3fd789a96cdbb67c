//! Webhook use-case handlers.
//!
//! Handlers own their port dependencies and are built once at startup; the
//! HTTP layer only hands them raw bytes and headers.

mod checkout_fanout;
mod handle_form_webhook;
mod handle_payment_webhook;

pub use checkout_fanout::{
    CheckoutFanout, FanoutFailure, FanoutReport, FanoutStage, MailerIdentity,
};
pub use handle_form_webhook::FormWebhookHandler;
pub use handle_payment_webhook::PaymentWebhookHandler;

use thiserror::Error;

/// Outcome of webhook processing that the HTTP layer must act on.
///
/// Downstream provider failures are deliberately absent: once a delivery is
/// authenticated and its shape understood, the webhook is acknowledged and
/// failures are only logged, so the sender does not retry a delivery we
/// cannot make more progress on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// The delivery could not be authenticated or its envelope would not
    /// parse. Answered with 400 so the sender retries.
    #[error("{0}")]
    Rejected(String),

    /// An authenticated envelope carried an object of an unexpected shape.
    /// Acknowledged, with the decode error as the response text.
    #[error("{0}")]
    MalformedPayload(String),
}
