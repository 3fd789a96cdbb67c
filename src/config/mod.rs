//! Service configuration.
//!
//! Settings come from an optional TOML file (the mounted secrets bundle in
//! production) overlaid with `FUNNELWIRE`-prefixed environment variables.
//! The whole configuration is loaded and validated before anything else
//! starts; a bad value stops the process at boot.

mod email;
mod error;
mod forms;
mod payment;
mod server;

pub use email::SendGridSettings;
pub use error::ConfigError;
pub use forms::TallySettings;
pub use payment::StripeSettings;
pub use server::ServerConfig;

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::domain::{Product, Waitlist};

/// Environment variable naming the configuration file.
const CONFIG_FILE_VAR: &str = "FUNNELWIRE_CONFIG_FILE";

/// Where the production secrets bundle is mounted.
const DEFAULT_CONFIG_PATH: &str = "/etc/secrets/latest";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    pub stripe: StripeSettings,
    pub tally: TallySettings,
    pub sendgrid: SendGridSettings,

    #[serde(default)]
    pub products: Vec<Product>,

    #[serde(default)]
    pub waitlists: Vec<Waitlist>,
}

impl AppConfig {
    /// Load configuration from the default sources.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let path =
            std::env::var(CONFIG_FILE_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    /// Load from a specific file path plus the environment overlay.
    ///
    /// The file is optional so purely env-configured deployments work; the
    /// required settings are then enforced by deserialization.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if path.exists() {
            builder = builder.add_source(File::new(
                path.to_str().ok_or_else(|| {
                    ConfigError::Invalid(format!("config path {path:?} is not valid UTF-8"))
                })?,
                FileFormat::Toml,
            ));
        }
        builder = builder.add_source(Environment::with_prefix("FUNNELWIRE").separator("__"));

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.stripe.validate()?;
        self.tally.validate()?;
        self.sendgrid.validate()?;
        Ok(())
    }
}
