//! Manifest loading errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::contract::{ContractError, Direction};
use crate::domain::foundation::{DomainError, ErrorCode};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read manifest {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed manifest: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid contract for channel '{channel}': {source}")]
    Contract {
        channel: String,
        #[source]
        source: ContractError,
    },

    #[error("Channel '{channel}' declares {count} {direction} events, the limit is {limit}")]
    TooManyEvents {
        channel: String,
        direction: Direction,
        count: usize,
        limit: usize,
    },
}

impl ManifestError {
    pub(crate) fn contract(channel: impl Into<String>, source: impl Into<ContractError>) -> Self {
        ManifestError::Contract {
            channel: channel.into(),
            source: source.into(),
        }
    }
}

impl From<ManifestError> for DomainError {
    fn from(err: ManifestError) -> Self {
        let code = match &err {
            ManifestError::Contract { source, .. } => source.code(),
            _ => ErrorCode::ValidationFailed,
        };
        DomainError::new(code, err.to_string())
    }
}
