//! In-memory transports.
//!
//! - `LoopbackSink` / `connect_pair` - client and server in one process
//! - `InMemoryServerBus` - inter-server fan-out between server instances

mod loopback;
mod server_bus;

pub use loopback::{connect_pair, connect_pair_with, LoopbackSink};
pub use server_bus::{InMemoryServerBus, ServerBusLink};
