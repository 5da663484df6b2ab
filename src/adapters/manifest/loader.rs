//! Manifest loader - declares contracts from YAML.
//!
//! Every declaration rule of the contract model applies unchanged: a
//! manifest that would fail when declared in code fails to load.

use std::path::Path;

use crate::domain::contract::{ContractBuilder, ContractBundle, Direction};
use crate::domain::namespace::{ChannelId, NamespaceRegistry};

use super::{ManifestDocument, ManifestError, NamespaceManifest};

/// Default cap on events per direction per channel.
pub const DEFAULT_MAX_EVENTS_PER_DIRECTION: usize = 256;

/// Loads manifests into a [`NamespaceRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct ManifestLoader {
    max_events_per_direction: usize,
}

impl Default for ManifestLoader {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_EVENTS_PER_DIRECTION)
    }
}

impl ManifestLoader {
    pub fn new(max_events_per_direction: usize) -> Self {
        Self {
            max_events_per_direction,
        }
    }

    /// Reads and loads a manifest file into a fresh registry.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<NamespaceRegistry, ManifestError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), bytes = yaml.len(), "Read manifest");
        self.load_str(&yaml)
    }

    /// Loads a manifest from YAML text into a fresh registry.
    pub fn load_str(&self, yaml: &str) -> Result<NamespaceRegistry, ManifestError> {
        let document: ManifestDocument = serde_yaml::from_str(yaml)?;
        let mut registry = NamespaceRegistry::new();
        self.load_into(&mut registry, &document)?;
        Ok(registry)
    }

    /// Binds every channel of `document` into `registry`.
    ///
    /// Channels already bound to an equal bundle are accepted, so a
    /// manifest can be loaded next to contracts declared in code. Either
    /// every channel is bound or, on error, `registry` is left untouched.
    ///
    /// Returns the number of channels in the document.
    pub fn load_into(
        &self,
        registry: &mut NamespaceRegistry,
        document: &ManifestDocument,
    ) -> Result<usize, ManifestError> {
        let mut staged = registry.clone();
        for (path, namespace) in &document.namespaces {
            let channel = ChannelId::new(path.as_str())
                .map_err(|err| ManifestError::contract(path.as_str(), err))?;
            let bundle = self.build_bundle(path, namespace)?;
            staged
                .bind_channel(channel, bundle)
                .map_err(|err| ManifestError::contract(path.as_str(), err))?;
        }
        *registry = staged;
        tracing::info!(channels = document.namespaces.len(), "Loaded contract manifest");
        Ok(document.namespaces.len())
    }

    fn build_bundle(
        &self,
        channel: &str,
        namespace: &NamespaceManifest,
    ) -> Result<ContractBundle, ManifestError> {
        let mut builder = ContractBuilder::new();
        for direction in [
            Direction::ClientToServer,
            Direction::ServerToClient,
            Direction::InterServer,
        ] {
            let events = namespace.events(direction);
            if events.len() > self.max_events_per_direction {
                return Err(ManifestError::TooManyEvents {
                    channel: channel.to_string(),
                    direction,
                    count: events.len(),
                    limit: self.max_events_per_direction,
                });
            }
            for (name, signature) in events {
                builder
                    .declare(direction, name.as_str(), signature.clone())
                    .map_err(|err| ManifestError::contract(channel, err))?;
            }
        }
        builder.shared_state(namespace.shared_state.clone());
        builder
            .build()
            .map_err(|err| ManifestError::contract(channel, err))
    }
}

/// Renders every channel bound in `registry` as a manifest.
pub fn render_manifest(registry: &NamespaceRegistry) -> Result<String, ManifestError> {
    Ok(serde_yaml::to_string(&ManifestDocument::from_registry(registry))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::{ContractError, EventSignature, ParamType, Peer};

    const MANIFEST: &str = r#"
namespaces:
  "/":
    client_to_server:
      hello: { params: [string] }
      withAck: { params: [string], ack: [number] }
    server_to_client:
      basicEmit: { params: [number, string, bytes] }
      noArg: {}
    inter_server:
      ping: {}
    shared_state:
      name: string
      age: number
  "/admin":
    server_to_client:
      foo: { params: ["string[]", "number?"] }
"#;

    #[test]
    fn loads_every_channel() {
        let registry = ManifestLoader::default().load_str(MANIFEST).unwrap();
        assert_eq!(registry.len(), 2);

        let main = registry.require("/").unwrap();
        let with_ack = main.map(Direction::ClientToServer).get("withAck").unwrap();
        assert_eq!(with_ack.params(), &[ParamType::String]);
        assert_eq!(with_ack.ack().unwrap().params(), &[ParamType::Number]);
        assert!(main.sends_for(Peer::Server).get("noArg").unwrap().params().is_empty());
        assert!(main.inter_server().contains("ping"));
        assert_eq!(main.shared_state().field("age"), Some(&ParamType::Number));

        let admin = registry.require("/admin").unwrap();
        assert_eq!(
            admin.map(Direction::ServerToClient).get("foo").unwrap().params(),
            &[
                ParamType::array(ParamType::String),
                ParamType::optional(ParamType::Number)
            ]
        );
    }

    #[test]
    fn rendered_manifest_loads_to_the_same_registry() {
        let loader = ManifestLoader::default();
        let registry = loader.load_str(MANIFEST).unwrap();

        let rendered = render_manifest(&registry).unwrap();
        let reloaded = loader.load_str(&rendered).unwrap();

        for (channel, bundle) in registry.iter() {
            assert_eq!(reloaded.get(channel), Some(bundle));
        }
        assert_eq!(reloaded.len(), registry.len());
    }

    #[test]
    fn reserved_names_fail_to_load() {
        let err = ManifestLoader::default()
            .load_str("namespaces:\n  \"/\":\n    server_to_client:\n      disconnect: {}\n")
            .unwrap_err();
        assert!(matches!(
            err,
            ManifestError::Contract {
                source: ContractError::ReservedEventName { .. },
                ..
            }
        ));
    }

    #[test]
    fn inter_server_overlap_fails_to_load() {
        let yaml = "namespaces:\n  \"/\":\n    client_to_server:\n      sync: {}\n    inter_server:\n      sync: {}\n";
        let err = ManifestLoader::default().load_str(yaml).unwrap_err();
        assert!(matches!(
            err,
            ManifestError::Contract {
                source: ContractError::InterServerOverlap { .. },
                ..
            }
        ));
    }

    #[test]
    fn invalid_channel_path_fails_to_load() {
        let err = ManifestLoader::default()
            .load_str("namespaces:\n  chat:\n    inter_server:\n      ping: {}\n")
            .unwrap_err();
        assert!(matches!(
            err,
            ManifestError::Contract {
                source: ContractError::Invalid(_),
                ..
            }
        ));
    }

    #[test]
    fn unknown_keys_and_types_are_parse_errors() {
        let loader = ManifestLoader::default();
        assert!(matches!(
            loader.load_str("namespaces:\n  \"/\":\n    server_to_client:\n      x: { acks: [] }\n"),
            Err(ManifestError::Parse(_))
        ));
        assert!(matches!(
            loader.load_str("namespaces:\n  \"/\":\n    server_to_client:\n      x: { params: [float] }\n"),
            Err(ManifestError::Parse(_))
        ));
    }

    #[test]
    fn error_slot_cannot_be_declared() {
        let err = ManifestLoader::default()
            .load_str("namespaces:\n  \"/\":\n    server_to_client:\n      x: { params: [string], ack: [error] }\n")
            .unwrap_err();
        assert!(matches!(
            err,
            ManifestError::Contract {
                source: ContractError::Invalid(_),
                ..
            }
        ));
    }

    #[test]
    fn shared_state_error_slot_fails_to_load() {
        let err = ManifestLoader::default()
            .load_str("namespaces:\n  \"/\":\n    shared_state:\n      x: error\n")
            .unwrap_err();
        assert!(matches!(err, ManifestError::Parse(_)));
    }

    #[test]
    fn blank_shared_state_field_fails_to_load() {
        let err = ManifestLoader::default()
            .load_str("namespaces:\n  \"/\":\n    shared_state:\n      \" \": string\n")
            .unwrap_err();
        assert!(matches!(err, ManifestError::Parse(_)));
    }

    #[test]
    fn event_limit_is_enforced() {
        let err = ManifestLoader::new(1)
            .load_str("namespaces:\n  \"/\":\n    server_to_client:\n      a: {}\n      b: {}\n")
            .unwrap_err();
        assert!(matches!(
            err,
            ManifestError::TooManyEvents {
                count: 2,
                limit: 1,
                ..
            }
        ));
    }

    #[test]
    fn loading_next_to_identical_code_contract_is_accepted() {
        let loader = ManifestLoader::default();
        let mut registry = loader.load_str(MANIFEST).unwrap();
        let document: ManifestDocument = serde_yaml::from_str(MANIFEST).unwrap();

        assert_eq!(loader.load_into(&mut registry, &document).unwrap(), 2);
    }

    #[test]
    fn failed_load_leaves_registry_unchanged() {
        let yaml = "namespaces:\n  \"/a\":\n    server_to_client:\n      ok: {}\n  \"/b\":\n    server_to_client:\n      disconnect: {}\n";
        let document: ManifestDocument = serde_yaml::from_str(yaml).unwrap();
        let mut registry = NamespaceRegistry::new();

        assert!(ManifestLoader::default()
            .load_into(&mut registry, &document)
            .is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn conflict_with_bound_channel_keeps_earlier_channels_out() {
        let loader = ManifestLoader::default();
        let mut registry = NamespaceRegistry::new();
        let mut builder = ContractBuilder::new();
        builder
            .declare(Direction::ServerToClient, "other", EventSignature::notification())
            .unwrap();
        registry
            .bind_channel(ChannelId::new("/b").unwrap(), builder.build().unwrap())
            .unwrap();

        let yaml = "namespaces:\n  \"/a\":\n    server_to_client:\n      ok: {}\n  \"/b\":\n    server_to_client:\n      ok: {}\n";
        let document: ManifestDocument = serde_yaml::from_str(yaml).unwrap();

        let err = loader.load_into(&mut registry, &document).unwrap_err();
        assert!(matches!(
            err,
            ManifestError::Contract {
                source: ContractError::ConflictingChannel { .. },
                ..
            }
        ));
        assert_eq!(registry.len(), 1);
        assert!(!registry.contains(&ChannelId::new("/a").unwrap()));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = ManifestLoader::default()
            .load_file("/definitely/not/here.yaml")
            .unwrap_err();
        assert!(matches!(err, ManifestError::Io { .. }));
    }
}
