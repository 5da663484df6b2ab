//! Namespaces - independently typed channels over one connection.

mod channel_id;
mod registry;

pub use channel_id::ChannelId;
pub use registry::NamespaceRegistry;
