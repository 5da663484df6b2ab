//! Event and acknowledgement signatures.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::param_type::{conforms, describe};
use super::{ArgValue, ParamType};

/// Ordered parameter types passed to an acknowledgement invocation.
///
/// An empty list is valid: the ack then acts as a bare completion signal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AckSignature {
    params: Vec<ParamType>,
}

impl AckSignature {
    pub fn new(params: Vec<ParamType>) -> Self {
        Self { params }
    }

    /// Acknowledgement carrying no values.
    pub fn completion() -> Self {
        Self::default()
    }

    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    /// Checks the values a receiver passes back.
    pub fn accepts(&self, values: &[ArgValue]) -> bool {
        conforms(&self.params, values)
    }
}

impl fmt::Display for AckSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", describe(&self.params))
    }
}

/// Ordered parameter types of an event plus its optional acknowledgement.
///
/// # Example
///
/// ```
/// use event_contracts::domain::contract::{EventSignature, ParamType};
///
/// let sig = EventSignature::new(vec![ParamType::String]).with_ack(vec![ParamType::Number]);
/// assert_eq!(sig.to_string(), "(string) -> ack(number)");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventSignature {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    params: Vec<ParamType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    ack: Option<AckSignature>,
}

impl EventSignature {
    /// Creates a signature without acknowledgement.
    pub fn new(params: Vec<ParamType>) -> Self {
        Self { params, ack: None }
    }

    /// Zero parameters, no acknowledgement.
    pub fn notification() -> Self {
        Self::default()
    }

    /// Attaches an acknowledgement with the given parameter types.
    pub fn with_ack(mut self, ack_params: Vec<ParamType>) -> Self {
        self.ack = Some(AckSignature::new(ack_params));
        self
    }

    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    pub fn ack(&self) -> Option<&AckSignature> {
        self.ack.as_ref()
    }

    pub fn has_ack(&self) -> bool {
        self.ack.is_some()
    }

    /// Checks emitted positional values against the declared parameters.
    pub fn accepts(&self, values: &[ArgValue]) -> bool {
        conforms(&self.params, values)
    }

    /// Returns true if any declared type mentions the error slot.
    ///
    /// The error slot belongs to derived timeout signatures only.
    pub(crate) fn mentions_error_slot(&self) -> bool {
        self.params.iter().any(ParamType::contains_error)
            || self
                .ack
                .as_ref()
                .is_some_and(|ack| ack.params.iter().any(ParamType::contains_error))
    }
}

impl fmt::Display for EventSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", describe(&self.params))?;
        if let Some(ack) = &self.ack {
            write!(f, " -> ack{}", ack)?;
        }
        Ok(())
    }
}
