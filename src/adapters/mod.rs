//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the contract layer to the outside:
//! - `manifest` - YAML contract manifests
//! - `memory` - In-process transports (loopback pairs, server bus)

pub mod manifest;
pub mod memory;
