//! Contract error types.

use std::time::Duration;

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

use super::{Direction, ParamType};

/// Errors raised while declaring, binding or using event contracts.
///
/// Declaration errors surface while contracts are authored (builder,
/// manifest loading, `bind_channel`). Call-site errors surface when a
/// checked handle is asked to emit or register something the contract
/// does not allow; nothing is handed to the transport in that case.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Event '{name}' is reserved by the messaging library")]
    ReservedEventName { name: String },

    #[error("Event '{name}' already declared for {direction} with a different signature")]
    ConflictingSignature { direction: Direction, name: String },

    #[error("Event '{name}' is declared both as an inter-server event and for {direction}")]
    InterServerOverlap { direction: Direction, name: String },

    #[error("Inter-server event '{name}' cannot declare an acknowledgement")]
    InterServerAck { name: String },

    #[error("Channel '{channel}' is already bound to a different contract bundle")]
    ConflictingChannel { channel: String },

    #[error("No contract bundle is bound to channel '{channel}'")]
    UnboundChannel { channel: String },

    #[error("Signature has no acknowledgement, a timeout cannot be attached")]
    TimeoutWithoutAck,

    #[error("Acknowledgement deadline must be positive, got {deadline:?}")]
    InvalidDeadline { deadline: Duration },

    #[error("Shared state field '{field}' is not declared")]
    UnknownSharedStateField { field: String },

    #[error("Shared state field '{field}' expects {expected}")]
    SharedStateMismatch { field: String, expected: ParamType },

    #[error("Event '{name}' is not declared for {direction}")]
    UnknownEvent { direction: Direction, name: String },

    #[error("Arguments for '{name}' do not match {expected}")]
    ArgumentMismatch { name: String, expected: String },

    #[error("Acknowledgement for '{name}' does not match {expected}")]
    AckMismatch { name: String, expected: String },

    #[error("A handler for '{name}' is already registered")]
    HandlerAlreadyRegistered { name: String },

    #[error("Only server peers may emit inter-server events")]
    InterServerFromClient,
}

impl ContractError {
    /// Maps the error to the shared error code vocabulary.
    pub fn code(&self) -> ErrorCode {
        match self {
            ContractError::Invalid(_)
            | ContractError::InvalidDeadline { .. }
            | ContractError::TimeoutWithoutAck => ErrorCode::ValidationFailed,
            ContractError::ReservedEventName { .. } => ErrorCode::ReservedName,
            ContractError::ConflictingSignature { .. }
            | ContractError::InterServerOverlap { .. }
            | ContractError::ConflictingChannel { .. } => ErrorCode::ConflictingDeclaration,
            ContractError::InterServerAck { .. } => ErrorCode::ValidationFailed,
            ContractError::UnboundChannel { .. } => ErrorCode::UnboundChannel,
            ContractError::UnknownEvent { .. } | ContractError::UnknownSharedStateField { .. } => {
                ErrorCode::UnknownEvent
            }
            ContractError::ArgumentMismatch { .. }
            | ContractError::AckMismatch { .. }
            | ContractError::SharedStateMismatch { .. } => ErrorCode::ArgumentMismatch,
            ContractError::HandlerAlreadyRegistered { .. } => ErrorCode::HandlerConflict,
            ContractError::InterServerFromClient => ErrorCode::Forbidden,
        }
    }

    /// Returns true for errors that can only be raised while contracts are declared.
    pub fn is_declaration_error(&self) -> bool {
        matches!(
            self,
            ContractError::Invalid(_)
                | ContractError::ReservedEventName { .. }
                | ContractError::ConflictingSignature { .. }
                | ContractError::InterServerOverlap { .. }
                | ContractError::InterServerAck { .. }
                | ContractError::ConflictingChannel { .. }
                | ContractError::UnboundChannel { .. }
                | ContractError::TimeoutWithoutAck
                | ContractError::InvalidDeadline { .. }
        )
    }
}

impl From<ContractError> for DomainError {
    fn from(err: ContractError) -> Self {
        DomainError::new(err.code(), err.to_string())
    }
}
