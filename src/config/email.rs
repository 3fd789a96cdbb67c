use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::ConfigError;
use crate::domain::Email;

/// SendGrid credentials and sender identity.
#[derive(Debug, Clone, Deserialize)]
pub struct SendGridSettings {
    pub api_key: SecretString,

    /// When set, contact upserts are skipped and mail sends are forced into
    /// the provider's sandbox.
    #[serde(default)]
    pub sandbox: bool,

    pub from_email: String,

    #[serde(default)]
    pub from_name: String,

    #[serde(default)]
    pub reply_to_email: String,
}

impl SendGridSettings {
    /// The reply-to address, falling back to the from address.
    pub fn reply_to(&self) -> &str {
        if self.reply_to_email.is_empty() {
            &self.from_email
        } else {
            &self.reply_to_email
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.expose_secret().is_empty() {
            return Err(ConfigError::Invalid(
                "sendgrid.api_key must not be empty".to_string(),
            ));
        }
        if Email::validate_format(&self.from_email).is_err() {
            return Err(ConfigError::Invalid(format!(
                "sendgrid.from_email {:?} is not a valid address",
                self.from_email
            )));
        }
        if !self.reply_to_email.is_empty() && Email::validate_format(&self.reply_to_email).is_err()
        {
            return Err(ConfigError::Invalid(format!(
                "sendgrid.reply_to_email {:?} is not a valid address",
                self.reply_to_email
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(reply_to: &str) -> SendGridSettings {
        SendGridSettings {
            api_key: SecretString::new("SG.key".to_string()),
            sandbox: false,
            from_email: "noreply@example.com".to_string(),
            from_name: "Shop".to_string(),
            reply_to_email: reply_to.to_string(),
        }
    }

    #[test]
    fn reply_to_falls_back_to_from() {
        assert_eq!(settings("").reply_to(), "noreply@example.com");
        assert_eq!(settings("help@example.com").reply_to(), "help@example.com");
    }

    #[test]
    fn validates_reply_to_only_when_set() {
        assert!(settings("").validate().is_ok());
        assert!(settings("nope").validate().is_err());
    }
}
