//! Shared request state.

use std::sync::Arc;

use crate::application::handlers::{FormWebhookHandler, PaymentWebhookHandler};

/// Handler set shared by all routes.
///
/// Built once, fully, before the listener starts; requests never observe a
/// partially initialized state.
#[derive(Clone)]
pub struct AppState {
    pub payment_webhook: Arc<PaymentWebhookHandler>,
    pub form_webhook: Arc<FormWebhookHandler>,
}
