//! Contract bundle - everything one channel agrees on.
//!
//! A bundle holds the two directional contracts, the symmetric
//! inter-server contract and the shared-state shape. Bundles are built
//! once through [`ContractBuilder`] (or assembled from parts) and never
//! mutated afterwards.

use std::sync::Arc;

use crate::domain::foundation::ValidationError;

use super::{
    ContractError, Direction, EventMap, EventName, EventSignature, Peer, SharedStateShape,
};

/// Complete contract for one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractBundle {
    client_to_server: EventMap,
    server_to_client: EventMap,
    inter_server: EventMap,
    shared_state: Arc<SharedStateShape>,
}

impl ContractBundle {
    /// Assembles a bundle from separately declared contracts.
    ///
    /// # Errors
    ///
    /// - `Invalid` if a map is filed under the wrong direction
    /// - `InterServerOverlap` if an inter-server event name also appears
    ///   in a directional contract
    pub fn from_parts(
        client_to_server: EventMap,
        server_to_client: EventMap,
        inter_server: EventMap,
        shared_state: SharedStateShape,
    ) -> Result<Self, ContractError> {
        let bundle = Self {
            client_to_server,
            server_to_client,
            inter_server,
            shared_state: Arc::new(shared_state),
        };
        bundle.validate()?;
        Ok(bundle)
    }

    /// Checks cross-contract rules.
    pub fn validate(&self) -> Result<(), ContractError> {
        for (map, expected) in [
            (&self.client_to_server, Direction::ClientToServer),
            (&self.server_to_client, Direction::ServerToClient),
            (&self.inter_server, Direction::InterServer),
        ] {
            if map.direction() != expected {
                return Err(ValidationError::invalid_format(
                    "contract_bundle",
                    format!("{} contract supplied where {} was expected", map.direction(), expected),
                )
                .into());
            }
        }

        for name in self.inter_server.names() {
            for directional in [&self.client_to_server, &self.server_to_client] {
                if directional.contains(name.as_str()) {
                    return Err(ContractError::InterServerOverlap {
                        direction: directional.direction(),
                        name: name.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Contract for the given direction.
    pub fn map(&self, direction: Direction) -> &EventMap {
        match direction {
            Direction::ClientToServer => &self.client_to_server,
            Direction::ServerToClient => &self.server_to_client,
            Direction::InterServer => &self.inter_server,
        }
    }

    /// Events the given peer may emit.
    pub fn sends_for(&self, peer: Peer) -> &EventMap {
        self.map(peer.sends())
    }

    /// Events the given peer may handle.
    pub fn receives_for(&self, peer: Peer) -> &EventMap {
        self.map(peer.receives())
    }

    /// Inter-server events; the same map serves both sending and receiving.
    pub fn inter_server(&self) -> &EventMap {
        &self.inter_server
    }

    pub fn shared_state(&self) -> &Arc<SharedStateShape> {
        &self.shared_state
    }

    /// Total declared events across all three contracts.
    pub fn event_count(&self) -> usize {
        self.client_to_server.len() + self.server_to_client.len() + self.inter_server.len()
    }
}

impl Default for ContractBundle {
    fn default() -> Self {
        ContractBuilder::new().finish_unchecked()
    }
}

/// Incremental builder for a [`ContractBundle`].
///
/// # Example
///
/// ```
/// use event_contracts::domain::contract::{ContractBuilder, Direction, EventSignature, ParamType};
///
/// let mut builder = ContractBuilder::new();
/// builder
///     .declare(Direction::ServerToClient, "noArg", EventSignature::notification())?
///     .declare(
///         Direction::ClientToServer,
///         "withAck",
///         EventSignature::new(vec![ParamType::String]).with_ack(vec![ParamType::Number]),
///     )?;
/// let bundle = builder.build()?;
/// assert_eq!(bundle.event_count(), 2);
/// # Ok::<(), event_contracts::domain::contract::ContractError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ContractBuilder {
    client_to_server: EventMap,
    server_to_client: EventMap,
    inter_server: EventMap,
    shared_state: SharedStateShape,
}

impl Default for ContractBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContractBuilder {
    pub fn new() -> Self {
        Self {
            client_to_server: EventMap::new(Direction::ClientToServer),
            server_to_client: EventMap::new(Direction::ServerToClient),
            inter_server: EventMap::new(Direction::InterServer),
            shared_state: SharedStateShape::default(),
        }
    }

    /// Declares one event for a direction.
    ///
    /// # Errors
    ///
    /// Name validation errors and `ConflictingSignature`.
    pub fn declare(
        &mut self,
        direction: Direction,
        name: impl TryInto<EventName, Error = ContractError>,
        signature: EventSignature,
    ) -> Result<&mut Self, ContractError> {
        let name = name.try_into()?;
        self.map_mut(direction).declare(name, signature)?;
        Ok(self)
    }

    /// Replaces the whole contract for the map's own direction.
    pub fn with_map(&mut self, map: EventMap) -> &mut Self {
        let direction = map.direction();
        *self.map_mut(direction) = map;
        self
    }

    /// Sets the shared-state shape.
    pub fn shared_state(&mut self, shape: SharedStateShape) -> &mut Self {
        self.shared_state = shape;
        self
    }

    /// Finishes the bundle, applying cross-contract checks.
    pub fn build(&self) -> Result<ContractBundle, ContractError> {
        let bundle = self.clone().finish_unchecked();
        bundle.validate()?;
        Ok(bundle)
    }

    fn finish_unchecked(self) -> ContractBundle {
        ContractBundle {
            client_to_server: self.client_to_server,
            server_to_client: self.server_to_client,
            inter_server: self.inter_server,
            shared_state: Arc::new(self.shared_state),
        }
    }

    fn map_mut(&mut self, direction: Direction) -> &mut EventMap {
        match direction {
            Direction::ClientToServer => &mut self.client_to_server,
            Direction::ServerToClient => &mut self.server_to_client,
            Direction::InterServer => &mut self.inter_server,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::ParamType;

    fn sample_builder() -> ContractBuilder {
        let mut builder = ContractBuilder::new();
        builder
            .declare(
                Direction::ServerToClient,
                "basicEmit",
                EventSignature::new(vec![ParamType::Number, ParamType::String, ParamType::Bytes]),
            )
            .unwrap()
            .declare(
                Direction::ClientToServer,
                "withAck",
                EventSignature::new(vec![ParamType::String]).with_ack(vec![ParamType::Number]),
            )
            .unwrap()
            .declare(Direction::InterServer, "ping", EventSignature::notification())
            .unwrap();
        builder
    }

    #[test]
    fn build_exposes_declared_events() {
        let bundle = sample_builder().build().unwrap();

        let basic = bundle.map(Direction::ServerToClient).get("basicEmit").unwrap();
        assert_eq!(
            basic.params(),
            &[ParamType::Number, ParamType::String, ParamType::Bytes]
        );

        let with_ack = bundle.map(Direction::ClientToServer).get("withAck").unwrap();
        assert_eq!(with_ack.ack().unwrap().params(), &[ParamType::Number]);
        assert_eq!(bundle.event_count(), 3);
    }

    #[test]
    fn peers_see_opposite_contracts() {
        let bundle = sample_builder().build().unwrap();

        assert!(bundle.sends_for(Peer::Server).contains("basicEmit"));
        assert!(bundle.receives_for(Peer::Client).contains("basicEmit"));
        assert!(bundle.sends_for(Peer::Client).contains("withAck"));
        assert!(!bundle.sends_for(Peer::Client).contains("basicEmit"));
    }

    #[test]
    fn inter_server_overlap_is_rejected() {
        let mut builder = sample_builder();
        builder
            .declare(Direction::InterServer, "withAck", EventSignature::notification())
            .unwrap();

        assert_eq!(
            builder.build().unwrap_err(),
            ContractError::InterServerOverlap {
                direction: Direction::ClientToServer,
                name: "withAck".to_string(),
            }
        );
    }

    #[test]
    fn same_name_in_both_directions_is_allowed() {
        let mut builder = ContractBuilder::new();
        builder
            .declare(Direction::ClientToServer, "message", EventSignature::new(vec![ParamType::String]))
            .unwrap()
            .declare(Direction::ServerToClient, "message", EventSignature::new(vec![ParamType::Json]))
            .unwrap();

        assert!(builder.build().is_ok());
    }

    #[test]
    fn conflicting_declaration_fails_at_declare_time() {
        let mut builder = sample_builder();
        let err = builder
            .declare(Direction::ServerToClient, "basicEmit", EventSignature::notification())
            .unwrap_err();
        assert!(matches!(err, ContractError::ConflictingSignature { .. }));
    }

    #[test]
    fn reserved_names_fail_at_declare_time() {
        let mut builder = ContractBuilder::new();
        assert!(matches!(
            builder.declare(Direction::ServerToClient, "disconnect", EventSignature::notification()),
            Err(ContractError::ReservedEventName { .. })
        ));
    }

    #[test]
    fn replaced_map_is_checked_on_build() {
        let mut inter = EventMap::new(Direction::InterServer);
        inter
            .declare(EventName::new("basicEmit").unwrap(), EventSignature::notification())
            .unwrap();

        let mut builder = sample_builder();
        builder.with_map(inter);

        assert_eq!(
            builder.build().unwrap_err(),
            ContractError::InterServerOverlap {
                direction: Direction::ServerToClient,
                name: "basicEmit".to_string(),
            }
        );
    }

    #[test]
    fn replaced_map_drops_previous_declarations() {
        let mut builder = sample_builder();
        builder.with_map(EventMap::new(Direction::InterServer));

        let bundle = builder.build().unwrap();
        assert!(bundle.inter_server().is_empty());
        assert!(bundle.map(Direction::ClientToServer).contains("withAck"));
    }

    #[test]
    fn from_parts_rejects_misfiled_maps() {
        let err = ContractBundle::from_parts(
            EventMap::new(Direction::ServerToClient),
            EventMap::new(Direction::ServerToClient),
            EventMap::new(Direction::InterServer),
            SharedStateShape::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::Invalid(_)));
    }

    #[test]
    fn shared_state_shape_is_carried() {
        let mut builder = ContractBuilder::new();
        builder.shared_state(
            SharedStateShape::new()
                .with_field("name", ParamType::String)
                .unwrap(),
        );
        let bundle = builder.build().unwrap();
        assert_eq!(bundle.shared_state().field("name"), Some(&ParamType::String));
    }

    #[test]
    fn equal_builders_produce_equal_bundles() {
        assert_eq!(sample_builder().build().unwrap(), sample_builder().build().unwrap());
        assert_ne!(sample_builder().build().unwrap(), ContractBundle::default());
    }
}
