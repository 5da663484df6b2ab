//! Serde model of a contract manifest.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::contract::{ContractBundle, Direction, EventMap, EventSignature, SharedStateShape};
use crate::domain::namespace::NamespaceRegistry;

/// Top-level manifest: one entry per channel path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestDocument {
    #[serde(default)]
    pub namespaces: BTreeMap<String, NamespaceManifest>,
}

/// Contracts of one channel, keyed by event name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NamespaceManifest {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub client_to_server: BTreeMap<String, EventSignature>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub server_to_client: BTreeMap<String, EventSignature>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub inter_server: BTreeMap<String, EventSignature>,

    #[serde(skip_serializing_if = "SharedStateShape::is_empty")]
    pub shared_state: SharedStateShape,
}

impl NamespaceManifest {
    pub fn events(&self, direction: Direction) -> &BTreeMap<String, EventSignature> {
        match direction {
            Direction::ClientToServer => &self.client_to_server,
            Direction::ServerToClient => &self.server_to_client,
            Direction::InterServer => &self.inter_server,
        }
    }

    fn from_bundle(bundle: &ContractBundle) -> Self {
        let entries = |map: &EventMap| {
            map.iter()
                .map(|(name, signature)| (name.to_string(), signature.clone()))
                .collect()
        };
        Self {
            client_to_server: entries(bundle.map(Direction::ClientToServer)),
            server_to_client: entries(bundle.map(Direction::ServerToClient)),
            inter_server: entries(bundle.map(Direction::InterServer)),
            shared_state: bundle.shared_state().as_ref().clone(),
        }
    }
}

impl ManifestDocument {
    /// Describes every channel bound in `registry`.
    pub fn from_registry(registry: &NamespaceRegistry) -> Self {
        Self {
            namespaces: registry
                .iter()
                .map(|(channel, bundle)| (channel.to_string(), NamespaceManifest::from_bundle(bundle)))
                .collect(),
        }
    }
}
