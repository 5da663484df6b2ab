//! Namespace registry - binds contract bundles to channels.
//!
//! Binding is idempotent for an equal bundle and a declaration error
//! for a different one. Channels are independent: the same event name
//! may carry unrelated signatures on two channels.
//!
//! # Example
//!
//! ```
//! use event_contracts::domain::contract::{ContractBuilder, Direction, EventSignature};
//! use event_contracts::domain::namespace::{ChannelId, NamespaceRegistry};
//!
//! let mut builder = ContractBuilder::new();
//! builder.declare(Direction::ServerToClient, "noArg", EventSignature::notification())?;
//!
//! let mut registry = NamespaceRegistry::new();
//! registry.bind_channel(ChannelId::main(), builder.build()?)?;
//!
//! assert!(registry.require("/")?.map(Direction::ServerToClient).contains("noArg"));
//! # Ok::<(), event_contracts::domain::contract::ContractError>(())
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::contract::{ContractBundle, ContractError, EventMap, SharedStateShape};

use super::ChannelId;

/// Registry of every channel's contract bundle.
///
/// Populated once at startup and then shared read-only.
#[derive(Debug, Clone, Default)]
pub struct NamespaceRegistry {
    channels: BTreeMap<ChannelId, Arc<ContractBundle>>,
}

impl NamespaceRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a bundle to a channel.
    ///
    /// Returns the bound bundle; rebinding an equal bundle returns the
    /// existing one.
    ///
    /// # Errors
    ///
    /// - `ConflictingChannel` if the channel is bound to a different bundle
    /// - any error from `ContractBundle::validate`
    pub fn bind_channel(
        &mut self,
        channel: ChannelId,
        bundle: ContractBundle,
    ) -> Result<Arc<ContractBundle>, ContractError> {
        bundle.validate()?;

        if let Some(existing) = self.channels.get(&channel) {
            if **existing == bundle {
                tracing::trace!(channel = %channel, "Identical channel rebind");
                return Ok(Arc::clone(existing));
            }
            tracing::warn!(channel = %channel, "Conflicting channel binding");
            return Err(ContractError::ConflictingChannel {
                channel: channel.to_string(),
            });
        }

        tracing::debug!(
            channel = %channel,
            events = bundle.event_count(),
            shared_fields = bundle.shared_state().len(),
            "Bound channel contract"
        );
        let bundle = Arc::new(bundle);
        self.channels.insert(channel, Arc::clone(&bundle));
        Ok(bundle)
    }

    /// Binds a channel from its four contract categories.
    pub fn bind_parts(
        &mut self,
        channel: ChannelId,
        client_to_server: EventMap,
        server_to_client: EventMap,
        inter_server: EventMap,
        shared_state: SharedStateShape,
    ) -> Result<Arc<ContractBundle>, ContractError> {
        let bundle =
            ContractBundle::from_parts(client_to_server, server_to_client, inter_server, shared_state)?;
        self.bind_channel(channel, bundle)
    }

    /// Gets the bundle bound to a channel.
    pub fn get(&self, channel: &ChannelId) -> Option<&Arc<ContractBundle>> {
        self.channels.get(channel)
    }

    /// Gets the bundle bound to a channel path, failing with `UnboundChannel`.
    pub fn require(&self, channel: &str) -> Result<Arc<ContractBundle>, ContractError> {
        let id: ChannelId = channel.parse()?;
        self.channels
            .get(&id)
            .cloned()
            .ok_or_else(|| ContractError::UnboundChannel {
                channel: id.to_string(),
            })
    }

    pub fn contains(&self, channel: &ChannelId) -> bool {
        self.channels.contains_key(channel)
    }

    /// Bound channels in sorted order.
    pub fn channels(&self) -> impl Iterator<Item = &ChannelId> {
        self.channels.keys()
    }

    /// Bound channels with their bundles, in channel order.
    pub fn iter(&self) -> impl Iterator<Item = (&ChannelId, &Arc<ContractBundle>)> {
        self.channels.iter()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
