//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers and error types that form the vocabulary
//! of the contract layer.

mod errors;
mod ids;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{ConnectionId, ServerId};
