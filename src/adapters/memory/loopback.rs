//! In-process loopback transport.
//!
//! Connects a client socket and a server socket in the same process.
//! Each direction gets its own queue and a task that dispatches packets
//! in order, so the two sides never share a lock.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::application::{ContractSocket, Dispatch, Receiver, SocketBuilder};
use crate::config::ContractsConfig;
use crate::domain::contract::{ContractError, Peer};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::namespace::NamespaceRegistry;
use crate::ports::{EventSink, Packet};

/// Sink that dispatches into a receiver in the same process.
#[derive(Debug, Clone)]
pub struct LoopbackSink {
    tx: mpsc::UnboundedSender<Packet>,
}

impl LoopbackSink {
    /// Spawns the dispatch task for `target`.
    ///
    /// Must be called inside a tokio runtime. The task ends once every
    /// clone of the sink is dropped.
    pub fn spawn(target: Arc<Receiver>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Packet>();
        tokio::spawn(async move {
            while let Some(packet) = rx.recv().await {
                let event = packet.event.clone();
                if target.dispatch(packet).await == Dispatch::Rejected {
                    tracing::debug!(channel = %target.channel(), event = %event, "Loopback packet rejected");
                }
            }
            tracing::trace!(channel = %target.channel(), "Loopback link closed");
        });
        Self { tx }
    }
}

#[async_trait]
impl EventSink for LoopbackSink {
    async fn deliver(&self, packet: Packet) -> Result<(), DomainError> {
        self.tx.send(packet).map_err(|_| {
            DomainError::new(
                ErrorCode::TransportUnavailable,
                "loopback peer has shut down",
            )
        })
    }
}

/// Connects a client and a server socket on `channel` to each other.
///
/// Returns `(client, server)`.
pub fn connect_pair(
    registry: &NamespaceRegistry,
    channel: &str,
) -> Result<(ContractSocket, ContractSocket), ContractError> {
    let client = ContractSocket::builder(registry, channel, Peer::Client)?;
    let server = ContractSocket::builder(registry, channel, Peer::Server)?;
    Ok(link(client, server))
}

/// [`connect_pair`] with `config` applied to both sockets.
pub fn connect_pair_with(
    registry: &NamespaceRegistry,
    channel: &str,
    config: &ContractsConfig,
) -> Result<(ContractSocket, ContractSocket), ContractError> {
    let client = ContractSocket::builder(registry, channel, Peer::Client)?.with_config(config);
    let server = ContractSocket::builder(registry, channel, Peer::Server)?.with_config(config);
    Ok(link(client, server))
}

fn link(client: SocketBuilder, server: SocketBuilder) -> (ContractSocket, ContractSocket) {
    let to_server = LoopbackSink::spawn(server.receiver());
    let to_client = LoopbackSink::spawn(client.receiver());

    (
        client.connect(Arc::new(to_server)),
        server.connect(Arc::new(to_client)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::{ArgValue, ContractBuilder, Direction, EventSignature, ParamType};
    use crate::domain::namespace::ChannelId;
    use crate::application::EmitError;
    use crate::domain::typed::AckError;
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn registry() -> NamespaceRegistry {
        let mut builder = ContractBuilder::new();
        builder
            .declare(
                Direction::ClientToServer,
                "withAck",
                EventSignature::new(vec![ParamType::String]).with_ack(vec![ParamType::Number]),
            )
            .unwrap()
            .declare(
                Direction::ServerToClient,
                "hello",
                EventSignature::new(vec![ParamType::String]),
            )
            .unwrap();
        let mut registry = NamespaceRegistry::new();
        registry
            .bind_channel(ChannelId::main(), builder.build().unwrap())
            .unwrap();
        registry
    }

    #[tokio::test]
    async fn server_event_reaches_client_handler() {
        let (client, server) = connect_pair(&registry(), "/").unwrap();
        let (tx, rx) = oneshot::channel();
        let tx = std::sync::Mutex::new(Some(tx));
        client
            .on("hello", move |args, _| {
                let tx = tx.lock().unwrap().take();
                async move {
                    if let Some(tx) = tx {
                        let _ = tx.send(args);
                    }
                }
            })
            .unwrap();

        server.emit("hello", vec![ArgValue::from("world")]).await.unwrap();

        assert_eq!(rx.await.unwrap(), vec![ArgValue::from("world")]);
    }

    #[tokio::test]
    async fn ack_round_trip() {
        let (client, server) = connect_pair(&registry(), "/").unwrap();
        server
            .on("withAck", |args, ack| async move {
                let len = match args.first() {
                    Some(ArgValue::String(s)) => s.len() as f64,
                    _ => 0.0,
                };
                if let Some(ack) = ack {
                    ack.send(vec![ArgValue::Number(len)]).unwrap();
                }
            })
            .unwrap();

        let values = client
            .emit_with_ack("withAck", vec![ArgValue::from("abc")])
            .await
            .unwrap();
        assert_eq!(values, vec![ArgValue::Number(3.0)]);
    }

    #[tokio::test]
    async fn configured_pair_bounds_ack_waits() {
        let config = ContractsConfig {
            default_ack_timeout_ms: 30,
            ..ContractsConfig::default()
        };
        let (client, server) = connect_pair_with(&registry(), "/", &config).unwrap();
        server
            .on("withAck", |_, ack| async move {
                tokio::time::sleep(Duration::from_millis(300)).await;
                drop(ack);
            })
            .unwrap();

        let err = client
            .emit_with_ack("withAck", vec![ArgValue::from("abc")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EmitError::Ack(AckError::Timeout { deadline }) if deadline == Duration::from_millis(30)
        ));
        assert_eq!(server.emitter().ack_timeout(), Some(Duration::from_millis(30)));
    }

    #[tokio::test]
    async fn closed_link_reports_transport_unavailable() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let sink = LoopbackSink { tx };
        let registry = registry();
        let server = ContractSocket::builder(&registry, "/", Peer::Server)
            .unwrap()
            .connect(Arc::new(sink));

        let err = server.emit("hello", vec![ArgValue::from("x")]).await.unwrap_err();
        assert!(err.to_string().contains("shut down"));
    }
}
