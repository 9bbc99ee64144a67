//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Configuration is loaded with the
//! `HIREFLOW` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use hireflow::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod error;
mod extractor;

pub use error::{ConfigError, ValidationError};
pub use extractor::ExtractorConfig;

use serde::Deserialize;

/// Root application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Extractor capability configuration (provider key, model, timeouts).
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

impl AppConfig {
    /// Loads configuration from environment variables.
    ///
    /// Loads a `.env` file if present, then reads variables with the
    /// `HIREFLOW` prefix, e.g. `HIREFLOW__EXTRACTOR__MODEL=claude-3-haiku`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into the expected
    /// types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("HIREFLOW")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.extractor.validate()
    }
}
