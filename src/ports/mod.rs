//! Provider ports.
//!
//! Each external collaborator sits behind a trait so handlers can be
//! exercised with mocks. Implementations live under `adapters`.

mod dns_resolver;
mod email_provider;
mod form_provider;
mod payment_provider;

pub use dns_resolver::{verify_email_host, DnsResolver};
pub use email_provider::{
    Contact, ContactRequest, EmailApiError, EmailProvider, FieldError, MailAddress, MailRequest,
    MailSettings, Personalization, Setting, TrackingSettings,
};
pub use form_provider::{FormError, FormEvent, FormEventType, FormField, FormProvider, FormResponse};
pub use payment_provider::{
    CheckoutMode, CheckoutSession, CustomerDetails, LineItem, PaymentError, PaymentEvent,
    PaymentEventType, PaymentProvider, PaymentStatus, Price, SessionUnpaid,
    VerifiedCheckoutSession,
};
