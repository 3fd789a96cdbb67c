use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::ConfigError;

/// Tally webhook signing secret.
#[derive(Debug, Clone, Deserialize)]
pub struct TallySettings {
    pub signing_secret: SecretString,
}

impl TallySettings {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.signing_secret.expose_secret().is_empty() {
            return Err(ConfigError::Invalid(
                "tally.signing_secret must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
