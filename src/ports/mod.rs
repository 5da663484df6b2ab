//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the contract layer and the transports that carry its events. Adapters
//! implement these ports.
//!
//! - `EventSink` - Hands validated packets to a transport
//! - `Packet` / `AckResponder` - What travels, and the one-shot reply path

mod event_sink;

pub use event_sink::{AckResponder, EventSink, Packet, Route};
