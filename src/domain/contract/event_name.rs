//! Event name value object.

use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

use super::ContractError;

/// Names the messaging library emits itself on every socket.
///
/// Declaring one of these as an application event would shadow the
/// connection lifecycle, so declarations are refused.
pub static RESERVED_EVENT_NAMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "connect",
        "connect_error",
        "disconnect",
        "disconnecting",
        "newListener",
        "removeListener",
    ]
    .into_iter()
    .collect()
});

/// Immutable identifier of an event within one direction of one channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventName(String);

impl EventName {
    /// Creates a validated event name.
    ///
    /// # Errors
    ///
    /// - `Invalid` if the name is empty or contains control characters
    /// - `ReservedEventName` if the messaging library owns the name
    pub fn new(name: impl Into<String>) -> Result<Self, ContractError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("event_name").into());
        }
        if name.chars().any(char::is_control) {
            return Err(ValidationError::invalid_format(
                "event_name",
                "control characters are not allowed",
            )
            .into());
        }
        if RESERVED_EVENT_NAMES.contains(name.as_str()) {
            return Err(ContractError::ReservedEventName { name });
        }
        Ok(Self(name))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for EventName {
    type Error = ContractError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for EventName {
    type Error = ContractError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EventName> for String {
    fn from(value: EventName) -> Self {
        value.0
    }
}

impl Borrow<str> for EventName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EventName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
