//! Errors surfaced by emitting handles.

use thiserror::Error;

use crate::domain::contract::ContractError;
use crate::domain::foundation::DomainError;
use crate::domain::typed::AckError;

/// Failure of an emit call.
#[derive(Debug, Error)]
pub enum EmitError {
    /// The call violated the contract; nothing was sent.
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// The transport refused the packet.
    #[error(transparent)]
    Transport(#[from] DomainError),

    /// The packet was sent but no usable acknowledgement came back.
    #[error(transparent)]
    Ack(#[from] AckError),
}

impl EmitError {
    /// Returns the contract error, if that is what this is.
    pub fn as_contract(&self) -> Option<&ContractError> {
        match self {
            EmitError::Contract(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EmitError> for DomainError {
    fn from(err: EmitError) -> Self {
        match err {
            EmitError::Contract(err) => err.into(),
            EmitError::Transport(err) => err,
            EmitError::Ack(err) => DomainError::new(
                crate::domain::foundation::ErrorCode::AckTimeout,
                err.to_string(),
            ),
        }
    }
}
