//! EventSink port - Interface for handing packets to a transport.
//!
//! The contract layer never touches sockets. Emitters build a validated
//! [`Packet`] and pass it to an `EventSink`; whatever sits behind the sink
//! (an in-process loopback, a cluster bus, a real connection) carries it
//! to the remote side, where it is dispatched to a receiver.

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::domain::contract::{ArgValue, EventName};
use crate::domain::foundation::{DomainError, ServerId};
use crate::domain::namespace::ChannelId;

/// Which contract a packet travels under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Client to server or server to client, decided by the sender's side.
    Peer,
    /// Between server instances.
    InterServer,
}

/// One event in flight.
#[derive(Debug)]
pub struct Packet {
    pub channel: ChannelId,
    pub route: Route,
    pub event: EventName,
    pub args: Vec<ArgValue>,
    /// Present only when the event declares an acknowledgement.
    pub ack: Option<AckResponder>,
    /// Sending server, for inter-server packets.
    pub origin: Option<ServerId>,
}

impl Packet {
    /// Copies everything except the acknowledgement.
    ///
    /// Used for fan-out, where a single responder cannot be shared.
    pub fn detached(&self) -> Packet {
        Packet {
            channel: self.channel.clone(),
            route: self.route,
            event: self.event.clone(),
            args: self.args.clone(),
            ack: None,
            origin: self.origin.clone(),
        }
    }
}

/// Sending half of an acknowledgement.
///
/// Consumed by [`AckResponder::respond`], so it fires at most once.
/// Dropping it unanswered tells the caller the ack will never come.
#[derive(Debug)]
pub struct AckResponder {
    tx: oneshot::Sender<Vec<ArgValue>>,
}

impl AckResponder {
    /// Creates a responder and the receiver the caller awaits.
    pub fn channel() -> (Self, oneshot::Receiver<Vec<ArgValue>>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Sends the acknowledgement values.
    ///
    /// Returns false if the caller stopped waiting (for example after a
    /// deadline passed).
    pub fn respond(self, values: Vec<ArgValue>) -> bool {
        self.tx.send(values).is_ok()
    }

    /// Returns true if the caller is no longer waiting.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Port for delivering packets to the remote side.
///
/// Implementations must:
/// - preserve the order of packets from one sink
/// - return `TransportUnavailable` when the remote side is gone
/// - never alter packet arguments
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn deliver(&self, packet: Packet) -> Result<(), DomainError>;
}
