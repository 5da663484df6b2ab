//! Application layer - checked handles over the contract model.
//!
//! This layer turns bound contracts into the objects application code
//! holds: emitters and receivers per direction, sockets per connection,
//! and typed sockets that move the same checks to compile time. It talks
//! to transports only through the [`EventSink`](crate::ports::EventSink) port.

mod ack;
mod emitter;
mod errors;
mod receiver;
mod shared_data;
mod socket;
mod typed_socket;

pub use ack::{Ack, TypedAck};
pub use emitter::{Emitter, TimeoutEmitter};
pub use errors::EmitError;
pub use receiver::{Dispatch, Receiver};
pub use shared_data::SharedData;
pub use socket::{ContractSocket, SocketBuilder};
pub use typed_socket::{ClientRole, ClientSocket, ServerRole, ServerSocket, SocketRole, TypedSocket};
