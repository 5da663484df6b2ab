//! In-memory inter-server bus.
//!
//! Simulates a cluster of server instances inside one process. Each
//! server joins a channel with the receiver of its inter-server contract;
//! a packet published by one member is delivered to every other member
//! of the same channel, never back to the sender.
//!
//! # Architecture
//!
//! ```text
//! Channel: /           Channel: /chat
//! ├── node-a           ├── node-a
//! ├── node-b           └── node-c
//! └── node-c
//! ```
//!
//! A `serverSideEmit` from node-a on `/` reaches node-b and node-c only.
//!
//! Delivery is fire-and-forget: acknowledgements are not supported across
//! servers and packets carrying one are refused.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};

use crate::application::Receiver;
use crate::domain::contract::Direction;
use crate::domain::foundation::{DomainError, ErrorCode, ServerId};
use crate::domain::namespace::ChannelId;
use crate::ports::{EventSink, Packet, Route};

type Members = HashMap<ServerId, mpsc::UnboundedSender<Packet>>;

/// Registry of server instances per channel.
///
/// # Thread Safety
///
/// Uses a tokio `RwLock`: publishes (reads) vastly outnumber joins and
/// leaves (writes).
#[derive(Debug, Default)]
pub struct InMemoryServerBus {
    channels: RwLock<HashMap<ChannelId, Members>>,
}

impl InMemoryServerBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins a server to the channel of `receiver`.
    ///
    /// Spawns a task that dispatches incoming packets into `receiver` in
    /// order. Joining again under the same id replaces the earlier member.
    ///
    /// # Arguments
    ///
    /// * `server` - Identity of the joining server
    /// * `receiver` - The server's inter-server receiver
    ///
    /// # Returns
    ///
    /// The sink the server publishes through.
    ///
    /// # Errors
    ///
    /// `ValidationFailed` if `receiver` is not an inter-server receiver.
    pub async fn join(
        self: &Arc<Self>,
        server: ServerId,
        receiver: Arc<Receiver>,
    ) -> Result<ServerBusLink, DomainError> {
        if receiver.direction() != Direction::InterServer {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                format!("cannot join the server bus with a {} receiver", receiver.direction()),
            ));
        }

        let channel = receiver.channel().clone();
        let (tx, mut rx) = mpsc::unbounded_channel::<Packet>();
        tokio::spawn(async move {
            while let Some(packet) = rx.recv().await {
                receiver.dispatch(packet).await;
            }
        });

        let replaced = self
            .channels
            .write()
            .await
            .entry(channel.clone())
            .or_default()
            .insert(server.clone(), tx)
            .is_some();

        tracing::info!(channel = %channel, server = %server, replaced, "Server joined bus");

        Ok(ServerBusLink {
            bus: Arc::clone(self),
            channel,
            server,
        })
    }

    /// Removes a server from a channel.
    ///
    /// Returns true if it was a member. Empty channels are cleaned up.
    pub async fn leave(&self, channel: &ChannelId, server: &ServerId) -> bool {
        let mut channels = self.channels.write().await;
        let Some(members) = channels.get_mut(channel) else {
            return false;
        };
        let removed = members.remove(server).is_some();
        if members.is_empty() {
            channels.remove(channel);
        }
        if removed {
            tracing::info!(channel = %channel, server = %server, "Server left bus");
        }
        removed
    }

    /// Number of servers joined to `channel`.
    pub async fn member_count(&self, channel: &ChannelId) -> usize {
        self.channels
            .read()
            .await
            .get(channel)
            .map(HashMap::len)
            .unwrap_or(0)
    }

    /// Delivers `packet` to every member of its channel except `origin`.
    ///
    /// Returns the number of servers reached.
    async fn publish(&self, origin: &ServerId, packet: Packet) -> Result<usize, DomainError> {
        if packet.route != Route::InterServer {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                "only inter-server packets travel on the server bus",
            ));
        }
        if packet.ack.is_some() {
            return Err(DomainError::new(
                ErrorCode::Forbidden,
                "acknowledgements are not supported between servers",
            )
            .with_detail("event", packet.event.to_string()));
        }

        let channels = self.channels.read().await;
        let Some(members) = channels.get(&packet.channel) else {
            return Ok(0);
        };

        let mut reached = 0;
        for (server, tx) in members.iter().filter(|(server, _)| *server != origin) {
            if tx.send(packet.detached()).is_ok() {
                reached += 1;
            } else {
                tracing::warn!(channel = %packet.channel, server = %server, "Server bus member is gone");
            }
        }

        tracing::trace!(
            channel = %packet.channel,
            event = %packet.event,
            origin = %origin,
            reached,
            "Published inter-server event"
        );
        Ok(reached)
    }
}

/// One server's handle on the bus.
#[derive(Debug, Clone)]
pub struct ServerBusLink {
    bus: Arc<InMemoryServerBus>,
    channel: ChannelId,
    server: ServerId,
}

impl ServerBusLink {
    pub fn server(&self) -> &ServerId {
        &self.server
    }

    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }
}

#[async_trait]
impl EventSink for ServerBusLink {
    async fn deliver(&self, mut packet: Packet) -> Result<(), DomainError> {
        if packet.origin.is_none() {
            packet.origin = Some(self.server.clone());
        }
        self.bus.publish(&self.server, packet).await.map(|_| ())
    }
}
