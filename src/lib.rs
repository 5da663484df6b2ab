//! Event Contracts - Typed event contracts for real-time messaging
//!
//! This crate declares, per channel, which events each side of a
//! connection may send, with which arguments and acknowledgements, and
//! checks every emit and every incoming packet against that contract.
//!
//! Contracts can be declared as Rust types with [`event_set!`] and
//! [`domain::typed::NamespaceContract`], or loaded at runtime from a
//! YAML manifest through [`adapters::manifest::ManifestLoader`].

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
