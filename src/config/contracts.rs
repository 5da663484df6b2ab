//! Contract loading configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use super::error::ValidationError;

/// Contract configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ContractsConfig {
    /// YAML manifest to load at startup
    pub manifest_path: Option<PathBuf>,

    /// Upper bound for acknowledgement waits without an explicit deadline
    #[serde(default = "default_ack_timeout_ms")]
    pub default_ack_timeout_ms: u64,

    /// Maximum events per direction per channel accepted from a manifest
    #[serde(default = "default_max_events")]
    pub max_events_per_direction: usize,
}

impl ContractsConfig {
    /// Default acknowledgement timeout as a `Duration`
    pub fn default_ack_timeout(&self) -> Duration {
        Duration::from_millis(self.default_ack_timeout_ms)
    }

    /// Validate contract configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.default_ack_timeout_ms == 0 || self.default_ack_timeout_ms > 300_000 {
            return Err(ValidationError::InvalidAckTimeout);
        }
        if self.max_events_per_direction == 0 || self.max_events_per_direction > 10_000 {
            return Err(ValidationError::InvalidEventLimit);
        }
        if let Some(path) = &self.manifest_path {
            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "yaml" || ext == "yml");
            if !is_yaml {
                return Err(ValidationError::InvalidManifestPath);
            }
        }
        Ok(())
    }
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            manifest_path: None,
            default_ack_timeout_ms: default_ack_timeout_ms(),
            max_events_per_direction: default_max_events(),
        }
    }
}

fn default_ack_timeout_ms() -> u64 {
    5_000
}

fn default_max_events() -> usize {
    crate::adapters::manifest::DEFAULT_MAX_EVENTS_PER_DIRECTION
}
