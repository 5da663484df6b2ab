//! Event contracts - runtime model of typed event declarations.
//!
//! A channel's contract is a [`ContractBundle`]: one [`EventMap`] per
//! [`Direction`], an inter-server map, and a [`SharedStateShape`]. Each
//! map pairs an [`EventName`] with an [`EventSignature`] (positional
//! [`ParamType`]s plus an optional [`AckSignature`]).
//!
//! Contracts are declared once and are immutable afterwards. Every
//! declaration problem surfaces as a [`ContractError`] while declaring,
//! never while traffic flows.

mod bundle;
mod errors;
mod event_map;
mod event_name;
mod param_type;
mod shared_state;
mod signature;
mod timeout;

pub use bundle::{ContractBuilder, ContractBundle};
pub use errors::ContractError;
pub use event_map::{Direction, EventMap, Peer};
pub use event_name::{EventName, RESERVED_EVENT_NAMES};
pub use param_type::{conforms, ArgValue, ParamType};
pub use shared_state::{SharedState, SharedStateShape};
pub use signature::{AckSignature, EventSignature};
pub use timeout::{derive_timeout_variant, TimeoutAckSignature, TimeoutSignature};
