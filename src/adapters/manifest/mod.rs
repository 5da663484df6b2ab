//! YAML contract manifests.
//!
//! A manifest declares the contracts of any number of channels in one
//! file, so peers written separately can share a single source of truth.
//!
//! ```yaml
//! namespaces:
//!   "/":
//!     client_to_server:
//!       withAck: { params: [string], ack: [number] }
//!     server_to_client:
//!       noArg: {}
//!     shared_state:
//!       name: string
//! ```

mod document;
mod error;
mod loader;

pub use document::{ManifestDocument, NamespaceManifest};
pub use error::ManifestError;
pub use loader::{render_manifest, ManifestLoader, DEFAULT_MAX_EVENTS_PER_DIRECTION};
