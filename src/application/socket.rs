//! ContractSocket - one connection's view of its channel contract.
//!
//! A socket belongs to one peer on one channel. It emits through the
//! peer's sending contract, dispatches through the receiving contract,
//! and (servers only) talks to sibling servers through the inter-server
//! contract. It also owns the connection's shared state.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ContractsConfig;
use crate::domain::contract::{ArgValue, ContractBundle, ContractError, Direction, Peer};
use crate::domain::foundation::{ConnectionId, DomainError, ErrorCode, ServerId, ValidationError};
use crate::domain::namespace::{ChannelId, NamespaceRegistry};
use crate::ports::EventSink;

use super::{Ack, EmitError, Emitter, Receiver, SharedData, TimeoutEmitter};

/// Builder for a [`ContractSocket`].
///
/// Receivers exist before the socket is connected, so a transport can be
/// wired to them first.
pub struct SocketBuilder {
    id: ConnectionId,
    peer: Peer,
    channel: ChannelId,
    bundle: Arc<ContractBundle>,
    receiver: Arc<Receiver>,
    inter_receiver: Option<Arc<Receiver>>,
    inter_link: Option<(ServerId, Arc<dyn EventSink>)>,
    ack_timeout: Option<Duration>,
    data: SharedData,
}

impl SocketBuilder {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Shared state the finished socket will own; clone it into handlers.
    pub fn data(&self) -> &SharedData {
        &self.data
    }

    /// Receiver the transport should dispatch incoming packets into.
    pub fn receiver(&self) -> Arc<Receiver> {
        Arc::clone(&self.receiver)
    }

    /// Receiver for inter-server packets.
    ///
    /// # Errors
    ///
    /// `InterServerFromClient` on a client socket.
    pub fn inter_server_receiver(&self) -> Result<Arc<Receiver>, ContractError> {
        self.inter_receiver
            .clone()
            .ok_or(ContractError::InterServerFromClient)
    }

    /// Attaches the sink that reaches sibling servers.
    pub fn with_inter_server(
        mut self,
        server: ServerId,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, ContractError> {
        if self.peer != Peer::Server {
            return Err(ContractError::InterServerFromClient);
        }
        self.inter_link = Some((server, sink));
        Ok(self)
    }

    /// Bounds acknowledgement waits of the socket's emitter.
    pub fn with_ack_timeout(mut self, limit: Duration) -> Self {
        self.ack_timeout = Some(limit);
        self
    }

    /// Applies the configured defaults (acknowledgement bound).
    pub fn with_config(self, config: &ContractsConfig) -> Self {
        self.with_ack_timeout(config.default_ack_timeout())
    }

    /// Finishes the socket, emitting through `sink`.
    pub fn connect(self, sink: Arc<dyn EventSink>) -> ContractSocket {
        let mut emitter = Emitter::new(
            self.channel.clone(),
            Arc::clone(&self.bundle),
            self.peer.sends(),
            sink,
        );
        if let Some(limit) = self.ack_timeout {
            emitter = emitter.with_ack_timeout(limit);
        }
        let inter_emitter = self.inter_link.map(|(server, sink)| {
            Emitter::new(
                self.channel.clone(),
                Arc::clone(&self.bundle),
                Direction::InterServer,
                sink,
            )
            .with_origin(server)
        });
        tracing::info!(
            connection_id = %self.id,
            channel = %self.channel,
            peer = %self.peer,
            inter_server = inter_emitter.is_some(),
            "Socket connected"
        );

        ContractSocket {
            id: self.id,
            peer: self.peer,
            channel: self.channel,
            bundle: self.bundle,
            emitter,
            receiver: self.receiver,
            inter_emitter,
            inter_receiver: self.inter_receiver,
            data: self.data,
        }
    }
}

impl std::fmt::Debug for SocketBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketBuilder")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .field("channel", &self.channel)
            .field("inter_server", &self.inter_link.as_ref().map(|(server, _)| server))
            .finish_non_exhaustive()
    }
}

/// Checked handle for one connection.
#[derive(Debug)]
pub struct ContractSocket {
    id: ConnectionId,
    peer: Peer,
    channel: ChannelId,
    bundle: Arc<ContractBundle>,
    emitter: Emitter,
    receiver: Arc<Receiver>,
    inter_emitter: Option<Emitter>,
    inter_receiver: Option<Arc<Receiver>>,
    data: SharedData,
}

impl ContractSocket {
    /// Starts a socket for `peer` on `channel`.
    ///
    /// # Errors
    ///
    /// - `Invalid` if `channel` is not a valid path
    /// - `UnboundChannel` if no contract is bound to it
    pub fn builder(
        registry: &NamespaceRegistry,
        channel: &str,
        peer: Peer,
    ) -> Result<SocketBuilder, ContractError> {
        let channel: ChannelId = channel.parse()?;
        let bundle = registry
            .get(&channel)
            .cloned()
            .ok_or_else(|| ContractError::UnboundChannel {
                channel: channel.to_string(),
            })?;

        let receiver = Arc::new(Receiver::new(
            channel.clone(),
            Arc::clone(&bundle),
            peer.receives(),
        ));
        let inter_receiver = (peer == Peer::Server).then(|| {
            Arc::new(Receiver::new(
                channel.clone(),
                Arc::clone(&bundle),
                Direction::InterServer,
            ))
        });

        let data = SharedData::new(bundle.shared_state().instantiate());

        Ok(SocketBuilder {
            id: ConnectionId::new(),
            peer,
            channel,
            bundle,
            receiver,
            inter_receiver,
            inter_link: None,
            ack_timeout: None,
            data,
        })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer(&self) -> Peer {
        self.peer
    }

    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    pub fn bundle(&self) -> &Arc<ContractBundle> {
        &self.bundle
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    pub fn receiver(&self) -> &Arc<Receiver> {
        &self.receiver
    }

    /// See [`Emitter::emit`].
    pub async fn emit(&self, name: &str, args: Vec<ArgValue>) -> Result<(), EmitError> {
        self.emitter.emit(name, args).await
    }

    /// See [`Emitter::emit_with_ack`].
    pub async fn emit_with_ack(
        &self,
        name: &str,
        args: Vec<ArgValue>,
    ) -> Result<Vec<ArgValue>, EmitError> {
        self.emitter.emit_with_ack(name, args).await
    }

    /// See [`Emitter::timeout`].
    pub fn timeout(&self, deadline: Duration) -> TimeoutEmitter<'_> {
        self.emitter.timeout(deadline)
    }

    /// See [`Receiver::on`].
    pub fn on<F, Fut>(&self, name: &str, handler: F) -> Result<(), ContractError>
    where
        F: Fn(Vec<ArgValue>, Option<Ack>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.receiver.on(name, handler)
    }

    /// Emitter for the inter-server contract.
    ///
    /// # Errors
    ///
    /// - `InterServerFromClient` on a client socket
    /// - `Transport` with `TransportUnavailable` if no bus is attached
    pub fn inter_server_emitter(&self) -> Result<&Emitter, EmitError> {
        if self.peer != Peer::Server {
            return Err(ContractError::InterServerFromClient.into());
        }
        self.inter_emitter.as_ref().ok_or_else(|| {
            EmitError::Transport(DomainError::new(
                ErrorCode::TransportUnavailable,
                "no inter-server link is attached to this socket",
            ))
        })
    }

    /// Receiver for inter-server packets; `InterServerFromClient` on clients.
    pub fn inter_server_receiver(&self) -> Result<&Arc<Receiver>, ContractError> {
        self.inter_receiver
            .as_ref()
            .ok_or(ContractError::InterServerFromClient)
    }

    /// Emits an inter-server event to every sibling server.
    ///
    /// Inter-server events are fire-and-forget; their contract never
    /// declares an acknowledgement.
    pub async fn server_side_emit(&self, name: &str, args: Vec<ArgValue>) -> Result<(), EmitError> {
        self.inter_server_emitter()?.emit(name, args).await
    }

    /// Registers a handler for an inter-server event.
    pub fn on_server_side<F, Fut>(&self, name: &str, handler: F) -> Result<(), ContractError>
    where
        F: Fn(Vec<ArgValue>, Option<Ack>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.inter_server_receiver()?.on(name, handler)
    }

    /// Shared state of this connection.
    ///
    /// Clone the handle into handlers that need to read or write it.
    pub fn data(&self) -> &SharedData {
        &self.data
    }

    /// Checks that this socket was built from `bundle` for `peer` on `channel`.
    pub(crate) fn ensure_matches(
        &self,
        channel: &ChannelId,
        peer: Peer,
        bundle: &ContractBundle,
    ) -> Result<(), ContractError> {
        if &self.channel != channel || self.peer != peer {
            return Err(ValidationError::invalid_format(
                "socket",
                format!(
                    "expected a {} socket on '{}', got a {} socket on '{}'",
                    peer, channel, self.peer, self.channel
                ),
            )
            .into());
        }
        if self.bundle.as_ref() != bundle {
            return Err(ContractError::ConflictingChannel {
                channel: channel.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::{ContractBuilder, EventSignature, ParamType, SharedStateShape};
    use crate::ports::Packet;
    use async_trait::async_trait;

    struct NullSink;

    #[async_trait]
    impl EventSink for NullSink {
        async fn deliver(&self, _packet: Packet) -> Result<(), DomainError> {
            Ok(())
        }
    }

    fn registry() -> NamespaceRegistry {
        let mut builder = ContractBuilder::new();
        builder
            .declare(Direction::ServerToClient, "noArg", EventSignature::notification())
            .unwrap()
            .declare(Direction::InterServer, "ping", EventSignature::notification())
            .unwrap()
            .shared_state(
                SharedStateShape::new()
                    .with_field("name", ParamType::String)
                    .unwrap(),
            );
        let mut registry = NamespaceRegistry::new();
        registry
            .bind_channel(ChannelId::main(), builder.build().unwrap())
            .unwrap();
        registry
    }

    #[test]
    fn unbound_channel_is_rejected() {
        let err = ContractSocket::builder(&registry(), "/admin", Peer::Server).unwrap_err();
        assert_eq!(
            err,
            ContractError::UnboundChannel {
                channel: "/admin".to_string()
            }
        );
    }

    #[test]
    fn invalid_channel_path_is_rejected() {
        assert!(matches!(
            ContractSocket::builder(&registry(), "admin", Peer::Server),
            Err(ContractError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn client_cannot_use_inter_server_contract() {
        let socket = ContractSocket::builder(&registry(), "/", Peer::Client)
            .unwrap()
            .connect(Arc::new(NullSink));

        let err = socket.server_side_emit("ping", vec![]).await.unwrap_err();
        assert!(matches!(
            err.as_contract(),
            Some(ContractError::InterServerFromClient)
        ));
        assert!(socket.on_server_side("ping", |_, _| async {}).is_err());
    }

    #[test]
    fn client_builder_refuses_inter_server_link() {
        let builder = ContractSocket::builder(&registry(), "/", Peer::Client).unwrap();
        assert!(builder.inter_server_receiver().is_err());
        assert!(builder
            .with_inter_server(ServerId::new("a"), Arc::new(NullSink))
            .is_err());
    }

    #[tokio::test]
    async fn server_without_bus_reports_transport_unavailable() {
        let socket = ContractSocket::builder(&registry(), "/", Peer::Server)
            .unwrap()
            .connect(Arc::new(NullSink));

        match socket.server_side_emit("ping", vec![]).await {
            Err(EmitError::Transport(err)) => assert_eq!(err.code, ErrorCode::TransportUnavailable),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn each_socket_gets_fresh_shared_state() {
        let registry = registry();
        let first = ContractSocket::builder(&registry, "/", Peer::Server)
            .unwrap()
            .connect(Arc::new(NullSink));
        let second = ContractSocket::builder(&registry, "/", Peer::Server)
            .unwrap()
            .connect(Arc::new(NullSink));

        first.data().set("name", "john").unwrap();

        assert_eq!(first.data().get("name"), Some(ArgValue::from("john")));
        assert!(second.data().get("name").is_none());
        assert_ne!(first.id(), second.id());
    }

    #[tokio::test]
    async fn handlers_reach_shared_state_through_the_builder() {
        let registry = registry();
        let builder = ContractSocket::builder(&registry, "/", Peer::Client).unwrap();
        let data = builder.data().clone();
        let receiver = builder.receiver();
        receiver
            .on("noArg", move |_, _| {
                let data = data.clone();
                async move {
                    data.set("name", "seen").unwrap();
                }
            })
            .unwrap();
        let socket = builder.connect(Arc::new(NullSink));

        let packet = Packet {
            channel: ChannelId::main(),
            route: crate::ports::Route::Peer,
            event: crate::domain::contract::EventName::new("noArg").unwrap(),
            args: vec![],
            ack: None,
            origin: None,
        };
        assert_eq!(receiver.dispatch(packet).await, crate::application::Dispatch::Delivered);
        assert_eq!(socket.data().get("name"), Some(ArgValue::from("seen")));
    }

    #[test]
    fn config_applies_default_ack_timeout() {
        let config = ContractsConfig {
            default_ack_timeout_ms: 40,
            ..ContractsConfig::default()
        };
        let socket = ContractSocket::builder(&registry(), "/", Peer::Server)
            .unwrap()
            .with_config(&config)
            .connect(Arc::new(NullSink));

        assert_eq!(socket.emitter().ack_timeout(), Some(Duration::from_millis(40)));
    }

    #[tokio::test]
    async fn server_emits_through_server_to_client_contract() {
        let socket = ContractSocket::builder(&registry(), "/", Peer::Server)
            .unwrap()
            .connect(Arc::new(NullSink));
        assert_eq!(socket.emitter().direction(), Direction::ServerToClient);
        assert_eq!(socket.receiver().direction(), Direction::ClientToServer);
        socket.emit("noArg", vec![]).await.unwrap();
    }
}
