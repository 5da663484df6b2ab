//! Shared handle on a connection's shared state.
//!
//! Handlers are `'static` closures, so they cannot borrow the socket.
//! They clone a [`SharedData`] instead; every clone sees the same state.

use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::contract::{ArgValue, ContractError, SharedState};

/// Cloneable, lock-protected [`SharedState`] of one connection.
#[derive(Debug, Clone)]
pub struct SharedData {
    state: Arc<RwLock<SharedState>>,
}

impl SharedData {
    pub fn new(state: SharedState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Writes a field, checked against the channel's shape.
    ///
    /// # Errors
    ///
    /// As [`SharedState::set`].
    pub fn set(&self, field: &str, value: impl Into<ArgValue>) -> Result<(), ContractError> {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set(field, value)
    }

    /// Current value of a field.
    pub fn get(&self, field: &str) -> Option<ArgValue> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(field)
            .cloned()
    }

    pub fn remove(&self, field: &str) -> Option<ArgValue> {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(field)
    }

    pub fn is_empty(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Copy of the state as it is now.
    pub fn snapshot(&self) -> SharedState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
