//! Receiver-side acknowledgement handles.

use std::marker::PhantomData;

use crate::domain::contract::{AckSignature, ArgValue, ContractError, EventName};
use crate::domain::typed::EventArgs;
use crate::ports::AckResponder;

/// Acknowledgement handed to a handler of an ack-bearing event.
///
/// [`Ack::send`] consumes the handle, so an acknowledgement is sent at
/// most once. Dropping it unsent releases the caller with
/// [`AckError::Dropped`](crate::domain::typed::AckError::Dropped).
#[derive(Debug)]
pub struct Ack {
    event: EventName,
    signature: AckSignature,
    responder: AckResponder,
}

impl Ack {
    pub(crate) fn new(event: EventName, signature: AckSignature, responder: AckResponder) -> Self {
        Self {
            event,
            signature,
            responder,
        }
    }

    /// Declared acknowledgement parameters.
    pub fn signature(&self) -> &AckSignature {
        &self.signature
    }

    /// Sends the acknowledgement.
    ///
    /// # Errors
    ///
    /// `AckMismatch` if `values` do not conform; the acknowledgement is
    /// then dropped unsent.
    pub fn send(self, values: Vec<ArgValue>) -> Result<(), ContractError> {
        if !self.signature.accepts(&values) {
            tracing::warn!(event = %self.event, expected = %self.signature, "Refusing malformed acknowledgement");
            return Err(ContractError::AckMismatch {
                name: self.event.to_string(),
                expected: self.signature.to_string(),
            });
        }
        if !self.responder.respond(values) {
            tracing::debug!(event = %self.event, "Caller stopped waiting for acknowledgement");
        }
        Ok(())
    }
}

/// [`Ack`] whose values are a typed argument list.
#[derive(Debug)]
pub struct TypedAck<A> {
    inner: Ack,
    _args: PhantomData<fn(A)>,
}

impl<A: EventArgs> TypedAck<A> {
    pub(crate) fn new(inner: Ack) -> Self {
        Self {
            inner,
            _args: PhantomData,
        }
    }

    pub fn send(self, args: A) -> Result<(), ContractError> {
        self.inner.send(args.into_args())
    }
}
