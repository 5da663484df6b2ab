//! Event map - the contract for one direction of one channel.
//!
//! Maps each [`EventName`] to exactly one [`EventSignature`]. Declaring
//! the same name twice is idempotent when the signatures agree and a
//! declaration error when they differ.
//!
//! # Example
//!
//! ```
//! use event_contracts::domain::contract::{Direction, EventMap, EventName, EventSignature, ParamType};
//!
//! let mut map = EventMap::new(Direction::ServerToClient);
//! let name = EventName::new("basicEmit").unwrap();
//! let sig = EventSignature::new(vec![ParamType::Number, ParamType::String, ParamType::Bytes]);
//!
//! map.declare(name.clone(), sig.clone()).unwrap();
//! map.declare(name, sig).unwrap(); // identical redeclaration is fine
//! assert_eq!(map.len(), 1);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

use super::{ContractError, EventName, EventSignature};

/// Direction a contract applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    ClientToServer,
    ServerToClient,
    /// Between cooperating server instances; symmetric.
    InterServer,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::ClientToServer => "client-to-server",
            Direction::ServerToClient => "server-to-client",
            Direction::InterServer => "inter-server",
        };
        write!(f, "{}", s)
    }
}

/// One side of a client/server connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Peer {
    Client,
    Server,
}

impl Peer {
    /// Direction of events this peer emits.
    pub fn sends(self) -> Direction {
        match self {
            Peer::Client => Direction::ClientToServer,
            Peer::Server => Direction::ServerToClient,
        }
    }

    /// Direction of events this peer handles.
    pub fn receives(self) -> Direction {
        match self {
            Peer::Client => Direction::ServerToClient,
            Peer::Server => Direction::ClientToServer,
        }
    }

    pub fn remote(self) -> Peer {
        match self {
            Peer::Client => Peer::Server,
            Peer::Server => Peer::Client,
        }
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Peer::Client => write!(f, "client"),
            Peer::Server => write!(f, "server"),
        }
    }
}

/// Mapping from event name to signature for one direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMap {
    direction: Direction,
    events: BTreeMap<EventName, EventSignature>,
}

impl EventMap {
    /// Creates an empty map for the given direction.
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            events: BTreeMap::new(),
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Declares one event.
    ///
    /// # Errors
    ///
    /// - `ConflictingSignature` if `name` is already declared differently
    /// - `Invalid` if the signature mentions the timeout error slot
    /// - `InterServerAck` for an inter-server event with an acknowledgement
    pub fn declare(
        &mut self,
        name: EventName,
        signature: EventSignature,
    ) -> Result<(), ContractError> {
        if signature.mentions_error_slot() {
            return Err(ValidationError::invalid_format(
                "signature",
                format!("'{}' uses the error slot reserved for timeout acknowledgements", name),
            )
            .into());
        }
        if self.direction == Direction::InterServer && signature.has_ack() {
            return Err(ContractError::InterServerAck { name: name.into() });
        }

        if let Some(existing) = self.events.get(&name) {
            if *existing == signature {
                tracing::trace!(direction = %self.direction, event = %name, "Identical redeclaration");
                return Ok(());
            }
            tracing::warn!(
                direction = %self.direction,
                event = %name,
                existing = %existing,
                attempted = %signature,
                "Conflicting event declaration"
            );
            return Err(ContractError::ConflictingSignature {
                direction: self.direction,
                name: name.into(),
            });
        }

        tracing::debug!(direction = %self.direction, event = %name, signature = %signature, "Declared event");
        self.events.insert(name, signature);
        Ok(())
    }

    /// Gets a signature by name.
    pub fn get(&self, name: &str) -> Option<&EventSignature> {
        self.events.get(name)
    }

    /// Gets a signature by name, failing with `UnknownEvent`.
    pub fn signature_of(&self, name: &str) -> Result<&EventSignature, ContractError> {
        self.get(name).ok_or_else(|| ContractError::UnknownEvent {
            direction: self.direction,
            name: name.to_string(),
        })
    }

    /// Gets the stored name and signature, failing with `UnknownEvent`.
    pub fn entry(&self, name: &str) -> Result<(&EventName, &EventSignature), ContractError> {
        self.events
            .get_key_value(name)
            .ok_or_else(|| ContractError::UnknownEvent {
                direction: self.direction,
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns declared names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &EventName> {
        self.events.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EventName, &EventSignature)> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
