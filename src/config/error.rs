//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid log filter directive: {0}")]
    InvalidLogFilter(String),

    #[error("Acknowledgement timeout must be between 1 and 300000 ms")]
    InvalidAckTimeout,

    #[error("Event limit per direction must be between 1 and 10000")]
    InvalidEventLimit,

    #[error("Manifest path must point to a .yaml or .yml file")]
    InvalidManifestPath,
}
