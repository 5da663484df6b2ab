//! Domain layer: contract model and the types that describe it.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, errors)
//! - `contract` - Runtime event contracts, signatures and shared state
//! - `namespace` - Channels and the registry binding contracts to them
//! - `typed` - Compile-time event and namespace contracts

pub mod contract;
pub mod foundation;
pub mod namespace;
pub mod typed;
