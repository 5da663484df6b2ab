//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `EVENT_CONTRACTS` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use event_contracts::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Manifest: {:?}", config.contracts.manifest_path);
//! ```

mod contracts;
mod error;
mod logging;

pub use contracts::ContractsConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a valid
/// configuration. Load using [`AppConfig::load()`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Logging configuration (filter, output format)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Contract configuration (manifest, limits, ack timeout)
    #[serde(default)]
    pub contracts: ContractsConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `EVENT_CONTRACTS` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `EVENT_CONTRACTS__LOGGING__JSON=true` -> `logging.json = true`
    /// - `EVENT_CONTRACTS__CONTRACTS__MANIFEST_PATH=...` -> `contracts.manifest_path = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("EVENT_CONTRACTS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.logging.validate()?;
        self.contracts.validate()?;
        Ok(())
    }
}
