//! Channel (namespace) identifier.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Path-like identifier of a channel multiplexed over one connection.
///
/// Always starts with `/`. The main channel is `/`; nested channels look
/// like `/admin` or `/orders/eu`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelId(String);

impl ChannelId {
    /// The main channel, `/`.
    pub fn main() -> Self {
        Self("/".to_string())
    }

    /// Creates a validated channel identifier.
    pub fn new(path: impl Into<String>) -> Result<Self, ValidationError> {
        let path = path.into();
        if path.is_empty() {
            return Err(ValidationError::empty_field("channel"));
        }
        if !path.starts_with('/') {
            return Err(ValidationError::invalid_format("channel", "must start with '/'"));
        }
        if path == "/" {
            return Ok(Self(path));
        }
        if path.ends_with('/') {
            return Err(ValidationError::invalid_format(
                "channel",
                "must not end with '/'",
            ));
        }
        if path[1..].split('/').any(str::is_empty) {
            return Err(ValidationError::invalid_format(
                "channel",
                "must not contain empty segments",
            ));
        }
        if path.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ValidationError::invalid_format(
                "channel",
                "must not contain whitespace",
            ));
        }
        Ok(Self(path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_main(&self) -> bool {
        self.0 == "/"
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChannelId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ChannelId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ChannelId> for String {
    fn from(value: ChannelId) -> Self {
        value.0
    }
}
