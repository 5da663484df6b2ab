//! Typed sockets - compile-time checked wrappers around [`ContractSocket`].
//!
//! `TypedSocket<N, R>` only accepts events from the set its role sends
//! for namespace `N`, and only registers handlers for the set it
//! receives. Emitting a client-to-server event from a server socket, or
//! an event of another channel, does not compile.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::contract::{ContractError, Peer};
use crate::domain::namespace::{ChannelId, NamespaceRegistry};
use crate::domain::typed::{ContractEvent, EventArgs, EventSet, NamespaceContract, NoAck, TimeoutAck};
use crate::ports::EventSink;

use super::{ContractSocket, EmitError, SharedData, SocketBuilder, TypedAck};

/// Which side of the connection a typed socket is on.
pub trait SocketRole: Send + Sync + 'static {
    const PEER: Peer;

    /// Event set this role emits under namespace `N`.
    type Sends<N: NamespaceContract>: EventSet;

    /// Event set this role handles under namespace `N`.
    type Receives<N: NamespaceContract>: EventSet;
}

/// Server side of a connection.
#[derive(Debug)]
pub enum ServerRole {}

impl SocketRole for ServerRole {
    const PEER: Peer = Peer::Server;
    type Sends<N: NamespaceContract> = N::ServerToClient;
    type Receives<N: NamespaceContract> = N::ClientToServer;
}

/// Client side of a connection.
#[derive(Debug)]
pub enum ClientRole {}

impl SocketRole for ClientRole {
    const PEER: Peer = Peer::Client;
    type Sends<N: NamespaceContract> = N::ClientToServer;
    type Receives<N: NamespaceContract> = N::ServerToClient;
}

pub type ServerSocket<N> = TypedSocket<N, ServerRole>;
pub type ClientSocket<N> = TypedSocket<N, ClientRole>;

/// A [`ContractSocket`] tied to namespace `N` and role `R`.
pub struct TypedSocket<N, R> {
    inner: ContractSocket,
    _contract: PhantomData<fn() -> (N, R)>,
}

impl<N, R> std::fmt::Debug for TypedSocket<N, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TypedSocket").field(&self.inner).finish()
    }
}

impl<N: NamespaceContract, R: SocketRole> TypedSocket<N, R> {
    /// Starts a socket builder for `N`'s channel and `R`'s side.
    pub fn builder(registry: &NamespaceRegistry) -> Result<SocketBuilder, ContractError> {
        ContractSocket::builder(registry, N::CHANNEL, R::PEER)
    }

    /// Wraps a socket after checking it was built from `N`'s contract.
    ///
    /// # Errors
    ///
    /// - `Invalid` if the socket's channel or side differs
    /// - `ConflictingChannel` if its bundle is not `N`'s bundle
    pub fn from_socket(inner: ContractSocket) -> Result<Self, ContractError> {
        let channel = ChannelId::new(N::CHANNEL)?;
        inner.ensure_matches(&channel, R::PEER, &N::bundle()?)?;
        Ok(Self {
            inner,
            _contract: PhantomData,
        })
    }

    /// Builds and connects a socket for `N` that emits through `sink`.
    pub fn connect(
        registry: &NamespaceRegistry,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, ContractError> {
        Self::from_socket(Self::builder(registry)?.connect(sink))
    }

    pub fn inner(&self) -> &ContractSocket {
        &self.inner
    }

    pub fn into_inner(self) -> ContractSocket {
        self.inner
    }

    pub fn data(&self) -> &SharedData {
        self.inner.data()
    }

    pub async fn emit<E>(&self, args: E::Args) -> Result<(), EmitError>
    where
        E: ContractEvent<Set = R::Sends<N>, Ack = NoAck>,
    {
        self.inner.emitter().emit_event::<E>(args).await
    }

    pub async fn emit_with_ack<E>(&self, args: E::Args) -> Result<E::Ack, EmitError>
    where
        E: ContractEvent<Set = R::Sends<N>>,
        E::Ack: EventArgs,
    {
        self.inner.emitter().emit_event_with_ack::<E>(args).await
    }

    /// Emits under a deadline; the inner result is the error slot.
    pub async fn emit_with_timeout<E>(
        &self,
        deadline: Duration,
        args: E::Args,
    ) -> Result<TimeoutAck<E>, EmitError>
    where
        E: ContractEvent<Set = R::Sends<N>>,
        E::Ack: EventArgs,
    {
        self.inner
            .emitter()
            .timeout(deadline)
            .emit_event_with_ack::<E>(args)
            .await
    }

    pub fn on<E, F, Fut>(&self, handler: F) -> Result<(), ContractError>
    where
        E: ContractEvent<Set = R::Receives<N>, Ack = NoAck>,
        F: Fn(E::Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.inner.receiver().on_event::<E, F, Fut>(handler)
    }

    pub fn on_with_ack<E, F, Fut>(&self, handler: F) -> Result<(), ContractError>
    where
        E: ContractEvent<Set = R::Receives<N>>,
        E::Ack: EventArgs,
        F: Fn(E::Args, TypedAck<E::Ack>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.inner
            .receiver()
            .on_event_with_ack::<E, F, Fut>(handler)
    }
}

impl<N: NamespaceContract> TypedSocket<N, ServerRole> {
    /// Emits an inter-server event to sibling servers.
    ///
    /// Inter-server events never carry an acknowledgement.
    pub async fn server_side_emit<E>(&self, args: E::Args) -> Result<(), EmitError>
    where
        E: ContractEvent<Set = N::InterServer, Ack = NoAck>,
    {
        self.inner
            .inter_server_emitter()?
            .emit_event::<E>(args)
            .await
    }

    pub fn on_server_side<E, F, Fut>(&self, handler: F) -> Result<(), ContractError>
    where
        E: ContractEvent<Set = N::InterServer, Ack = NoAck>,
        F: Fn(E::Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.inner
            .inter_server_receiver()?
            .on_event::<E, F, Fut>(handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::{ContractBuilder, Direction, EventSignature};
    use crate::domain::foundation::DomainError;
    use crate::domain::typed::NoEvents;
    use crate::ports::Packet;
    use async_trait::async_trait;

    crate::event_set! {
        struct Outbound {
            Hello = "hello": (String);
        }
    }

    crate::event_set! {
        struct Inbound {
            Ping = "ping": ();
        }
    }

    struct Chat;

    impl NamespaceContract for Chat {
        const CHANNEL: &'static str = "/chat";
        type ClientToServer = Inbound;
        type ServerToClient = Outbound;
        type InterServer = NoEvents;
    }

    struct NullSink;

    #[async_trait]
    impl EventSink for NullSink {
        async fn deliver(&self, _packet: Packet) -> Result<(), DomainError> {
            Ok(())
        }
    }

    fn registry() -> NamespaceRegistry {
        let mut registry = NamespaceRegistry::new();
        Chat::bind(&mut registry).unwrap();
        registry
    }

    #[tokio::test]
    async fn typed_server_socket_emits_its_own_set() {
        let registry = registry();
        let socket = ServerSocket::<Chat>::connect(&registry, Arc::new(NullSink)).unwrap();

        socket.emit::<Hello>(("hi".to_string(),)).await.unwrap();
        socket.on::<Ping, _, _>(|()| async {}).unwrap();
    }

    #[test]
    fn wrapping_a_socket_of_the_wrong_side_fails() {
        let registry = registry();
        let client = ClientSocket::<Chat>::builder(&registry)
            .unwrap()
            .connect(Arc::new(NullSink));

        assert!(matches!(
            ServerSocket::<Chat>::from_socket(client),
            Err(ContractError::Invalid(_))
        ));
    }

    #[test]
    fn wrapping_a_socket_with_a_different_contract_fails() {
        let mut builder = ContractBuilder::new();
        builder
            .declare(Direction::ServerToClient, "other", EventSignature::notification())
            .unwrap();
        let mut registry = NamespaceRegistry::new();
        registry
            .bind_channel(ChannelId::new("/chat").unwrap(), builder.build().unwrap())
            .unwrap();

        let socket = ContractSocket::builder(&registry, "/chat", Peer::Server)
            .unwrap()
            .connect(Arc::new(NullSink));

        assert!(matches!(
            ServerSocket::<Chat>::from_socket(socket),
            Err(ContractError::ConflictingChannel { .. })
        ));
    }
}
