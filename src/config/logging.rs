//! Logging configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive, used when `RUST_LOG` is unset
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let level = self.level.trim();
        if level.is_empty() {
            return Err(ValidationError::MissingRequired("logging.level"));
        }
        tracing_subscriber::EnvFilter::try_new(level)
            .map_err(|err| ValidationError::InvalidLogFilter(err.to_string()))?;
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

fn default_level() -> String {
    "info,event_contracts=debug".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(LoggingConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_level_is_rejected() {
        let config = LoggingConfig {
            level: "  ".to_string(),
            json: false,
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("logging.level"))
        );
    }

    #[test]
    fn malformed_directive_is_rejected() {
        let config = LoggingConfig {
            level: "event_contracts=loud".to_string(),
            json: true,
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidLogFilter(_))
        ));
    }
}
