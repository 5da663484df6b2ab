//! Per-connection shared state.
//!
//! A [`SharedStateShape`] is declared once per channel. Every connection
//! gets its own [`SharedState`] built from that shape; application code on
//! either side mutates it freely for the life of the connection. Fields
//! start unset.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

use super::{ArgValue, ContractError, ParamType};

/// Open mapping from field name to declared type.
///
/// Deserialization applies the same checks as [`SharedStateShape::with_field`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, ParamType>",
    into = "BTreeMap<String, ParamType>"
)]
pub struct SharedStateShape {
    fields: BTreeMap<String, ParamType>,
}

impl SharedStateShape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, builder style.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` if the field name is blank or the type uses the
    /// timeout error slot.
    pub fn with_field(
        mut self,
        name: impl Into<String>,
        ty: ParamType,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        check_field(&name, &ty)?;
        self.fields.insert(name, ty);
        Ok(self)
    }

    pub fn field(&self, name: &str) -> Option<&ParamType> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &ParamType)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Creates a fresh, empty instance for a new connection.
    pub fn instantiate(self: &Arc<Self>) -> SharedState {
        SharedState {
            shape: Arc::clone(self),
            values: HashMap::new(),
        }
    }
}

fn check_field(name: &str, ty: &ParamType) -> Result<(), ContractError> {
    if name.trim().is_empty() {
        return Err(ValidationError::empty_field("shared_state_field").into());
    }
    if ty.contains_error() {
        return Err(ValidationError::invalid_format(
            "shared_state_field",
            format!("'{name}' uses the error slot reserved for timeout acknowledgements"),
        )
        .into());
    }
    Ok(())
}

impl TryFrom<BTreeMap<String, ParamType>> for SharedStateShape {
    type Error = ContractError;

    fn try_from(fields: BTreeMap<String, ParamType>) -> Result<Self, Self::Error> {
        for (name, ty) in &fields {
            check_field(name, ty)?;
        }
        Ok(Self { fields })
    }
}

impl From<SharedStateShape> for BTreeMap<String, ParamType> {
    fn from(shape: SharedStateShape) -> Self {
        shape.fields
    }
}

/// Shared state of one connection.
///
/// Writes are checked against the channel's shape. Dropped with the
/// connection that owns it.
#[derive(Debug, Clone)]
pub struct SharedState {
    shape: Arc<SharedStateShape>,
    values: HashMap<String, ArgValue>,
}

impl SharedState {
    /// Sets a field.
    ///
    /// # Errors
    ///
    /// - `UnknownSharedStateField` if the shape has no such field
    /// - `SharedStateMismatch` if the value does not conform
    pub fn set(&mut self, field: &str, value: impl Into<ArgValue>) -> Result<(), ContractError> {
        let ty = self
            .shape
            .field(field)
            .ok_or_else(|| ContractError::UnknownSharedStateField {
                field: field.to_string(),
            })?;
        let value = value.into();
        if !ty.accepts(&value) {
            return Err(ContractError::SharedStateMismatch {
                field: field.to_string(),
                expected: ty.clone(),
            });
        }
        self.values.insert(field.to_string(), value);
        Ok(())
    }

    pub fn get(&self, field: &str) -> Option<&ArgValue> {
        self.values.get(field)
    }

    /// Unsets a field, returning its previous value.
    pub fn remove(&mut self, field: &str) -> Option<ArgValue> {
        self.values.remove(field)
    }

    pub fn shape(&self) -> &SharedStateShape {
        &self.shape
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
