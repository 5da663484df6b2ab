//! Receiver - checked inbound half of a contract handle.
//!
//! Handlers are registered per declared event. Incoming packets are
//! checked against the contract before any handler runs; a packet that
//! does not conform is logged and dropped, and the handler never sees it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::domain::contract::{ArgValue, ContractBundle, ContractError, Direction, EventMap, EventName};
use crate::domain::namespace::ChannelId;
use crate::domain::typed::{ContractEvent, EventArgs, NoAck};
use crate::ports::Packet;

use super::{Ack, TypedAck};

type HandlerFn = Arc<dyn Fn(Vec<ArgValue>, Option<Ack>) -> BoxFuture<'static, ()> + Send + Sync>;

/// What happened to an incoming packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A handler ran.
    Delivered,
    /// The packet conformed but nobody listens for the event.
    Unhandled,
    /// The packet broke the contract and was dropped.
    Rejected,
}

/// Inbound handle for one direction of one channel.
pub struct Receiver {
    channel: ChannelId,
    bundle: Arc<ContractBundle>,
    direction: Direction,
    handlers: RwLock<HashMap<EventName, HandlerFn>>,
}

impl Receiver {
    pub fn new(channel: ChannelId, bundle: Arc<ContractBundle>, direction: Direction) -> Self {
        Self {
            channel,
            bundle,
            direction,
            handlers: RwLock::new(HashMap::new()),
        }
    }

    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Contract incoming packets are checked against.
    pub fn contract(&self) -> &EventMap {
        self.bundle.map(self.direction)
    }

    /// Registers the handler for a declared event.
    ///
    /// The handler receives conforming arguments and, for ack-bearing
    /// events, the [`Ack`] to answer with.
    ///
    /// # Errors
    ///
    /// - `UnknownEvent` if the event is not declared for this direction
    /// - `HandlerAlreadyRegistered` if the event already has a handler
    pub fn on<F, Fut>(&self, name: &str, handler: F) -> Result<(), ContractError>
    where
        F: Fn(Vec<ArgValue>, Option<Ack>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (event, _) = self.contract().entry(name)?;
        let handler: HandlerFn = Arc::new(move |args, ack| handler(args, ack).boxed());

        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        if handlers.contains_key(event) {
            return Err(ContractError::HandlerAlreadyRegistered {
                name: name.to_string(),
            });
        }
        tracing::debug!(channel = %self.channel, direction = %self.direction, event = name, "Registered handler");
        handlers.insert(event.clone(), handler);
        Ok(())
    }

    /// Removes the handler for an event; returns true if one was registered.
    pub fn off(&self, name: &str) -> bool {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }

    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Registers a typed handler for an event without acknowledgement.
    ///
    /// # Errors
    ///
    /// As [`Receiver::on`], plus `ArgumentMismatch` if the runtime
    /// contract declares `E` with a different signature.
    pub fn on_event<E, F, Fut>(&self, handler: F) -> Result<(), ContractError>
    where
        E: ContractEvent<Ack = NoAck>,
        F: Fn(E::Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.check_declared::<E>()?;
        let handler = Arc::new(handler);
        self.on(E::NAME, move |args, _ack| {
            let handler = Arc::clone(&handler);
            async move {
                match <E::Args as EventArgs>::from_args(args) {
                    Ok(args) => handler(args).await,
                    Err(err) => tracing::warn!(event = E::NAME, error = %err, "Dropping undecodable arguments"),
                }
            }
        })
    }

    /// Registers a typed handler for an ack-bearing event.
    pub fn on_event_with_ack<E, F, Fut>(&self, handler: F) -> Result<(), ContractError>
    where
        E: ContractEvent,
        E::Ack: EventArgs,
        F: Fn(E::Args, TypedAck<E::Ack>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.check_declared::<E>()?;
        let handler = Arc::new(handler);
        self.on(E::NAME, move |args, ack| {
            let handler = Arc::clone(&handler);
            async move {
                let Some(ack) = ack else {
                    tracing::warn!(event = E::NAME, "Ack-bearing event arrived without acknowledgement");
                    return;
                };
                match <E::Args as EventArgs>::from_args(args) {
                    Ok(args) => handler(args, TypedAck::new(ack)).await,
                    Err(err) => tracing::warn!(event = E::NAME, error = %err, "Dropping undecodable arguments"),
                }
            }
        })
    }

    /// Checks an incoming packet and runs its handler.
    pub async fn dispatch(&self, packet: Packet) -> Dispatch {
        let Packet {
            channel,
            event,
            args,
            ack,
            ..
        } = packet;

        if channel != self.channel {
            tracing::warn!(
                expected = %self.channel,
                received = %channel,
                event = %event,
                "Dropping packet addressed to another channel"
            );
            return Dispatch::Rejected;
        }

        let Some(signature) = self.contract().get(event.as_str()) else {
            tracing::warn!(channel = %self.channel, direction = %self.direction, event = %event, "Dropping undeclared event");
            return Dispatch::Rejected;
        };

        if !signature.accepts(&args) {
            let received: Vec<&str> = args.iter().map(ArgValue::kind).collect();
            tracing::warn!(
                channel = %self.channel,
                direction = %self.direction,
                event = %event,
                expected = %signature,
                received = ?received,
                "Dropping non-conforming event"
            );
            return Dispatch::Rejected;
        }

        let ack = match (signature.ack(), ack) {
            (Some(ack_signature), Some(responder)) => {
                Some(Ack::new(event.clone(), ack_signature.clone(), responder))
            }
            (None, None) => None,
            (declared, _) => {
                tracing::warn!(
                    channel = %self.channel,
                    event = %event,
                    declared_ack = declared.is_some(),
                    "Dropping event whose acknowledgement does not match the contract"
                );
                return Dispatch::Rejected;
            }
        };

        let handler = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event)
            .cloned();

        match handler {
            Some(handler) => {
                handler(args, ack).await;
                Dispatch::Delivered
            }
            None => {
                tracing::debug!(channel = %self.channel, event = %event, "No handler registered");
                Dispatch::Unhandled
            }
        }
    }

    fn check_declared<E: ContractEvent>(&self) -> Result<(), ContractError> {
        let declared = self.contract().signature_of(E::NAME)?;
        if *declared != E::signature() {
            return Err(ContractError::ArgumentMismatch {
                name: E::NAME.to_string(),
                expected: declared.to_string(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for Receiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Receiver")
            .field("channel", &self.channel)
            .field("direction", &self.direction)
            .finish_non_exhaustive()
    }
}
