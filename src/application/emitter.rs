//! Emitter - checked outbound half of a contract handle.
//!
//! Every emit is checked against the direction's [`EventMap`] before a
//! packet is built. A call that breaks the contract fails with a
//! [`ContractError`] and nothing reaches the transport.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::domain::contract::{
    conforms, derive_timeout_variant, ArgValue, ContractBundle, ContractError, Direction,
    EventMap, EventName, EventSignature,
};
use crate::domain::foundation::ServerId;
use crate::domain::namespace::ChannelId;
use crate::domain::typed::{AckError, ContractEvent, EventArgs, NoAck, TimeoutAck};
use crate::ports::{AckResponder, EventSink, Packet, Route};

use super::EmitError;

/// Outbound handle for one direction of one channel.
#[derive(Clone)]
pub struct Emitter {
    channel: ChannelId,
    bundle: Arc<ContractBundle>,
    direction: Direction,
    origin: Option<ServerId>,
    ack_timeout: Option<Duration>,
    sink: Arc<dyn EventSink>,
}

impl Emitter {
    pub fn new(
        channel: ChannelId,
        bundle: Arc<ContractBundle>,
        direction: Direction,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            channel,
            bundle,
            direction,
            origin: None,
            ack_timeout: None,
            sink,
        }
    }

    /// Stamps outgoing packets with the sending server.
    pub fn with_origin(mut self, server: ServerId) -> Self {
        self.origin = Some(server);
        self
    }

    /// Bounds every [`Emitter::emit_with_ack`] wait.
    ///
    /// An expired wait fails with `AckError::Timeout`. Calls made through
    /// [`Emitter::timeout`] use their own deadline instead.
    pub fn with_ack_timeout(mut self, limit: Duration) -> Self {
        self.ack_timeout = Some(limit);
        self
    }

    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    pub fn ack_timeout(&self) -> Option<Duration> {
        self.ack_timeout
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Contract this emitter checks against.
    pub fn contract(&self) -> &EventMap {
        self.bundle.map(self.direction)
    }

    /// Emits an event that declares no acknowledgement.
    ///
    /// # Errors
    ///
    /// - `UnknownEvent` if the event is not declared for this direction
    /// - `ArgumentMismatch` if the arguments do not conform, or the event
    ///   expects an acknowledgement
    /// - `Transport` if the sink refuses the packet
    pub async fn emit(&self, name: &str, args: Vec<ArgValue>) -> Result<(), EmitError> {
        let (event, signature) = self.prepare(name, &args)?;
        if signature.has_ack() {
            return Err(mismatch(name, signature).into());
        }
        let event = event.clone();
        self.deliver(event, args, None).await
    }

    /// Emits an ack-bearing event and waits for the acknowledgement.
    ///
    /// Waits without limit unless [`Emitter::with_ack_timeout`] was set;
    /// use [`Emitter::timeout`] for the error-slot form.
    pub async fn emit_with_ack(
        &self,
        name: &str,
        args: Vec<ArgValue>,
    ) -> Result<Vec<ArgValue>, EmitError> {
        let (event, signature) = self.prepare(name, &args)?;
        let Some(ack) = signature.ack().cloned() else {
            return Err(mismatch(name, signature).into());
        };
        let event = event.clone();

        let (responder, rx) = AckResponder::channel();
        self.deliver(event, args, Some(responder)).await?;

        let received = match self.ack_timeout {
            Some(limit) => tokio::time::timeout(limit, rx)
                .await
                .map_err(|_| AckError::Timeout { deadline: limit })?,
            None => rx.await,
        };
        let values = received.map_err(|_| AckError::Dropped)?;
        if !ack.accepts(&values) {
            return Err(ContractError::AckMismatch {
                name: name.to_string(),
                expected: ack.to_string(),
            }
            .into());
        }
        Ok(values)
    }

    /// Derives a handle whose ack calls carry `deadline`.
    pub fn timeout(&self, deadline: Duration) -> TimeoutEmitter<'_> {
        TimeoutEmitter {
            emitter: self,
            deadline,
        }
    }

    /// Typed form of [`Emitter::emit`].
    pub async fn emit_event<E>(&self, args: E::Args) -> Result<(), EmitError>
    where
        E: ContractEvent<Ack = NoAck>,
    {
        self.emit(E::NAME, args.into_args()).await
    }

    /// Typed form of [`Emitter::emit_with_ack`].
    pub async fn emit_event_with_ack<E>(&self, args: E::Args) -> Result<E::Ack, EmitError>
    where
        E: ContractEvent,
        E::Ack: EventArgs,
    {
        let values = self.emit_with_ack(E::NAME, args.into_args()).await?;
        <E::Ack as EventArgs>::from_args(values)
            .map_err(|err| EmitError::Ack(AckError::Decode(err)))
    }

    /// Typed form of `timeout(deadline).emit_with_ack(..)`.
    pub async fn emit_event_with_timeout<E>(
        &self,
        deadline: Duration,
        args: E::Args,
    ) -> Result<TimeoutAck<E>, EmitError>
    where
        E: ContractEvent,
        E::Ack: EventArgs,
    {
        self.timeout(deadline).emit_event_with_ack::<E>(args).await
    }

    fn prepare(
        &self,
        name: &str,
        args: &[ArgValue],
    ) -> Result<(&EventName, &EventSignature), ContractError> {
        let (event, signature) = self.contract().entry(name)?;
        if !signature.accepts(args) {
            tracing::debug!(
                channel = %self.channel,
                direction = %self.direction,
                event = name,
                expected = %signature,
                "Rejected emit with non-conforming arguments"
            );
            return Err(mismatch(name, signature));
        }
        Ok((event, signature))
    }

    async fn deliver(
        &self,
        event: EventName,
        args: Vec<ArgValue>,
        ack: Option<AckResponder>,
    ) -> Result<(), EmitError> {
        tracing::trace!(
            channel = %self.channel,
            direction = %self.direction,
            event = %event,
            args = args.len(),
            with_ack = ack.is_some(),
            "Emitting event"
        );
        let route = match self.direction {
            Direction::InterServer => Route::InterServer,
            Direction::ClientToServer | Direction::ServerToClient => Route::Peer,
        };
        let packet = Packet {
            channel: self.channel.clone(),
            route,
            event,
            args,
            ack,
            origin: self.origin.clone(),
        };
        self.sink.deliver(packet).await?;
        Ok(())
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("channel", &self.channel)
            .field("direction", &self.direction)
            .field("origin", &self.origin)
            .field("ack_timeout", &self.ack_timeout)
            .finish_non_exhaustive()
    }
}

fn mismatch(name: &str, signature: &EventSignature) -> ContractError {
    ContractError::ArgumentMismatch {
        name: name.to_string(),
        expected: signature.to_string(),
    }
}

/// Emitter view that attaches a deadline to acknowledgements.
///
/// The acknowledgement gains a leading error slot: `Null` when the
/// receiver answered in time, `Error(..)` otherwise.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutEmitter<'a> {
    emitter: &'a Emitter,
    deadline: Duration,
}

impl TimeoutEmitter<'_> {
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Emits and waits at most the deadline for the acknowledgement.
    ///
    /// Returns `[Null, values..]` on success and `[Error(reason)]` when the
    /// deadline passed or the receiver dropped the acknowledgement.
    ///
    /// # Errors
    ///
    /// - `TimeoutWithoutAck` if the event declares no acknowledgement
    /// - `InvalidDeadline` for a zero deadline
    /// - everything [`Emitter::emit_with_ack`] can fail with before sending
    pub async fn emit_with_ack(
        &self,
        name: &str,
        args: Vec<ArgValue>,
    ) -> Result<Vec<ArgValue>, EmitError> {
        Ok(match self.call(name, args).await? {
            Ok(values) => std::iter::once(ArgValue::Null).chain(values).collect(),
            Err(err) => vec![ArgValue::Error(err.to_string())],
        })
    }

    /// Typed form of [`TimeoutEmitter::emit_with_ack`].
    ///
    /// The outer error is a failed call; the inner one is the error slot.
    pub async fn emit_event_with_ack<E>(&self, args: E::Args) -> Result<TimeoutAck<E>, EmitError>
    where
        E: ContractEvent,
        E::Ack: EventArgs,
    {
        let outcome = self.call(E::NAME, args.into_args()).await?;
        Ok(outcome.and_then(|values| {
            <E::Ack as EventArgs>::from_args(values).map_err(AckError::from)
        }))
    }

    async fn call(
        &self,
        name: &str,
        args: Vec<ArgValue>,
    ) -> Result<Result<Vec<ArgValue>, AckError>, EmitError> {
        let started = Instant::now();
        let emitter = self.emitter;
        let (event, signature) = emitter.contract().entry(name)?;
        let timed = derive_timeout_variant(signature, self.deadline)?;
        if !timed.accepts(&args) {
            return Err(mismatch(name, signature).into());
        }
        let event = event.clone();

        let (responder, rx) = AckResponder::channel();
        emitter.deliver(event, args, Some(responder)).await?;

        match tokio::time::timeout_at(started + self.deadline, rx).await {
            Ok(Ok(values)) => {
                if !conforms(timed.ack().receiver_params(), &values) {
                    return Err(ContractError::AckMismatch {
                        name: name.to_string(),
                        expected: timed.ack().to_string(),
                    }
                    .into());
                }
                Ok(Ok(values))
            }
            Ok(Err(_)) => Ok(Err(AckError::Dropped)),
            Err(_) => {
                tracing::debug!(
                    channel = %emitter.channel,
                    event = name,
                    deadline_ms = self.deadline.as_millis() as u64,
                    "Acknowledgement deadline passed"
                );
                Ok(Err(AckError::Timeout {
                    deadline: self.deadline,
                }))
            }
        }
    }
}
