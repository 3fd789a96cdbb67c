use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::ConfigError;

/// Stripe credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeSettings {
    pub api_key: SecretString,
    pub webhook_secret: SecretString,
}

impl StripeSettings {
    /// Prefix checks catch swapped or truncated secrets at boot instead of
    /// as signature failures in production.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !self.api_key.expose_secret().starts_with("sk_") {
            return Err(ConfigError::Invalid(
                "stripe.api_key must start with sk_".to_string(),
            ));
        }
        if !self.webhook_secret.expose_secret().starts_with("whsec_") {
            return Err(ConfigError::Invalid(
                "stripe.webhook_secret must start with whsec_".to_string(),
            ));
        }
        Ok(())
    }
}
