//! Error types shared across the contract layer.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    ReservedName,

    // Declaration errors
    ConflictingDeclaration,
    UnboundChannel,

    // Call-site errors
    UnknownEvent,
    ArgumentMismatch,
    HandlerConflict,
    Forbidden,

    // Delivery errors
    AckTimeout,
    TransportUnavailable,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::ReservedName => "RESERVED_NAME",
            ErrorCode::ConflictingDeclaration => "CONFLICTING_DECLARATION",
            ErrorCode::UnboundChannel => "UNBOUND_CHANNEL",
            ErrorCode::UnknownEvent => "UNKNOWN_EVENT",
            ErrorCode::ArgumentMismatch => "ARGUMENT_MISMATCH",
            ErrorCode::HandlerConflict => "HANDLER_CONFLICT",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::AckTimeout => "ACK_TIMEOUT",
            ErrorCode::TransportUnavailable => "TRANSPORT_UNAVAILABLE",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Standard error with code, message, and optional details.
///
/// Transports report delivery failures through this type so callers can
/// branch on [`ErrorCode`] without knowing the transport.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}
