//! Payment provider port.
//!
//! Covers the two interactions the service has with the payment provider:
//! verifying an inbound webhook into a typed event, and fetching the line
//! items of a completed checkout session.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Port for payment provider integrations.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Verify a webhook signature and construct the typed event.
    ///
    /// Verification runs before any business logic; an error here
    /// short-circuits the request with no downstream calls.
    fn construct_event(&self, payload: &[u8], signature: &str)
        -> Result<PaymentEvent, PaymentError>;

    /// Fetch a checkout session's line items, in provider order, one entry
    /// per purchased unit.
    async fn list_line_items(&self, session_id: &str) -> Result<Vec<LineItem>, PaymentError>;
}

/// A verified webhook event from the payment provider.
///
/// `data` holds the affected object undecoded; the router decodes it once
/// the event type is recognized, so an unexpected shape inside a recognized
/// envelope surfaces as a distinct payload error.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentEvent {
    pub id: String,
    pub event_type: PaymentEventType,
    pub created: i64,
    pub data: serde_json::Value,
}

/// Closed set of payment event types this service dispatches on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEventType {
    /// A customer completed Checkout; payment succeeded or is pending.
    CheckoutSessionCompleted,

    /// Any other event type. Accepted and ignored.
    Unrecognized(String),
}

impl PaymentEventType {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn as_tag(&self) -> &str {
        match self {
            Self::CheckoutSessionCompleted => "checkout.session.completed",
            Self::Unrecognized(tag) => tag,
        }
    }
}

/// Checkout session object as delivered inside the webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,

    #[serde(default)]
    pub mode: CheckoutMode,

    #[serde(default)]
    pub payment_status: PaymentStatus,

    #[serde(default)]
    pub customer_details: CustomerDetails,
}

/// Checkout session mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutMode {
    Payment,
    Subscription,
    Setup,

    /// Future mode we do not recognize. Accepted and ignored.
    #[serde(other)]
    #[default]
    Unrecognized,
}

/// Payment status of a checkout session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
    NoPaymentRequired,

    #[serde(other)]
    #[default]
    Unknown,
}

/// Customer identity captured during checkout.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerDetails {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// A checkout session that passed signature verification with
/// `payment_status == paid`.
///
/// The only constructor is the checked conversion from [`CheckoutSession`],
/// so fan-out can rely on the paid invariant by type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedCheckoutSession {
    pub session_id: String,
    pub customer_name: String,
    pub customer_email: String,
}

/// The session's payment status was not `paid`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("session unpaid")]
pub struct SessionUnpaid;

impl TryFrom<CheckoutSession> for VerifiedCheckoutSession {
    type Error = SessionUnpaid;

    fn try_from(session: CheckoutSession) -> Result<Self, Self::Error> {
        if session.payment_status != PaymentStatus::Paid {
            return Err(SessionUnpaid);
        }
        Ok(Self {
            session_id: session.id,
            customer_name: session.customer_details.name.unwrap_or_default(),
            customer_email: session.customer_details.email.unwrap_or_default(),
        })
    }
}

/// One purchased unit in a checkout session.
#[derive(Debug, Clone, Deserialize)]
pub struct LineItem {
    pub id: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default = "default_quantity")]
    pub quantity: i64,

    pub price: Price,
}

fn default_quantity() -> i64 {
    1
}

/// Price object embedded in a line item.
#[derive(Debug, Clone, Deserialize)]
pub struct Price {
    pub id: String,

    /// Product ID the price belongs to; the catalogue key.
    #[serde(default)]
    pub product: String,
}

/// Errors from payment provider operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("webhook has no Stripe-Signature header")]
    NotSigned,

    #[error("webhook had no valid signature")]
    NoValidSignature,

    #[error("malformed signature header: {0}")]
    MalformedHeader(String),

    #[error("webhook timestamp outside tolerance")]
    TimestampOutOfTolerance,

    #[error("failed to parse webhook body json: {0}")]
    Parse(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("provider api error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl PaymentError {
    /// True for errors raised before the event was authenticated.
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            Self::NotSigned
                | Self::NoValidSignature
                | Self::MalformedHeader(_)
                | Self::TimestampOutOfTolerance
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_provider_is_object_safe() {
        fn _accepts_dyn(_provider: &dyn PaymentProvider) {}
    }

    #[test]
    fn event_type_round_trips_tags() {
        assert_eq!(
            PaymentEventType::from_tag("checkout.session.completed"),
            PaymentEventType::CheckoutSessionCompleted
        );
        let unknown = PaymentEventType::from_tag("invoice.paid");
        assert_eq!(
            unknown,
            PaymentEventType::Unrecognized("invoice.paid".to_string())
        );
        assert_eq!(unknown.as_tag(), "invoice.paid");
    }

    #[test]
    fn checkout_mode_deserializes_known_and_unknown() {
        let known: CheckoutMode = serde_json::from_str("\"payment\"").unwrap();
        assert_eq!(known, CheckoutMode::Payment);

        let unknown: CheckoutMode = serde_json::from_str("\"invoicing\"").unwrap();
        assert_eq!(unknown, CheckoutMode::Unrecognized);
    }

    #[test]
    fn verified_session_requires_paid_status() {
        let session: CheckoutSession = serde_json::from_value(serde_json::json!({
            "id": "cs_1",
            "mode": "payment",
            "payment_status": "unpaid",
            "customer_details": {"name": "Jane Doe", "email": "jane@example.com"}
        }))
        .unwrap();
        assert_eq!(
            VerifiedCheckoutSession::try_from(session),
            Err(SessionUnpaid)
        );
    }

    #[test]
    fn verified_session_from_paid_session() {
        let session: CheckoutSession = serde_json::from_value(serde_json::json!({
            "id": "cs_1",
            "mode": "payment",
            "payment_status": "paid",
            "customer_details": {"name": "Jane Doe", "email": "jane@example.com"}
        }))
        .unwrap();
        let verified = VerifiedCheckoutSession::try_from(session).unwrap();
        assert_eq!(verified.session_id, "cs_1");
        assert_eq!(verified.customer_name, "Jane Doe");
        assert_eq!(verified.customer_email, "jane@example.com");
    }

    #[test]
    fn verification_failure_classification() {
        assert!(PaymentError::NotSigned.is_verification_failure());
        assert!(PaymentError::NoValidSignature.is_verification_failure());
        assert!(!PaymentError::Parse("bad json".into()).is_verification_failure());
    }
}
