//! Compile-time view of event contracts.
//!
//! Events become zero-sized types and argument lists become tuples, so
//! emitting or handling an event with the wrong arguments, the wrong
//! acknowledgement or on the wrong side is a type error. Every typed
//! contract also lowers to the runtime model in [`crate::domain::contract`].

mod arg_type;
mod event;
mod event_args;

pub use arg_type::{ArgDecodeError, ArgType};
pub use event::{
    AckError, ContractEvent, EventSet, NamespaceContract, NoEvents, TimeoutAck, WithTimeout,
};
pub use event_args::{AckSpec, EventArgs, NoAck};
