//! Tracks every live connection per recipient.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use perkhub_core::config::RealtimeConfig;

/// A serialized frame ready for a transport to write out.
pub type Frame = Arc<str>;

/// Sender half of one live connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    /// Unique connection identifier.
    pub id: Uuid,
    /// The recipient this connection belongs to.
    pub recipient_id: Uuid,
    sender: mpsc::Sender<Frame>,
}

impl ConnectionHandle {
    /// Push a frame without waiting. A full or closed channel counts as
    /// a failed delivery.
    pub fn push(&self, frame: Frame) -> bool {
        self.sender.try_send(frame).is_ok()
    }

    /// Whether the receiving side is gone.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Registry of live connections, keyed by recipient.
///
/// Each recipient may hold several connections (multiple tabs or
/// devices) up to the configured cap; registering past the cap evicts
/// the oldest connection.
#[derive(Debug)]
pub struct ConnectionRegistry {
    connections: DashMap<Uuid, Vec<ConnectionHandle>>,
    config: RealtimeConfig,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new(config: RealtimeConfig) -> Self {
        Self {
            connections: DashMap::new(),
            config,
        }
    }

    /// Register a new connection for a recipient. Returns the handle and
    /// the receiver the transport drains.
    pub fn register(&self, recipient_id: Uuid) -> (ConnectionHandle, mpsc::Receiver<Frame>) {
        let (sender, receiver) = mpsc::channel(self.config.channel_buffer_size);
        let handle = ConnectionHandle {
            id: Uuid::new_v4(),
            recipient_id,
            sender,
        };

        let mut entry = self.connections.entry(recipient_id).or_default();
        entry.retain(|c| !c.is_closed());
        if entry.len() >= self.config.max_connections_per_recipient {
            let evicted = entry.remove(0);
            warn!(
                recipient_id = %recipient_id,
                connection_id = %evicted.id,
                "Connection cap reached, evicting oldest connection"
            );
        }
        entry.push(handle.clone());
        debug!(
            recipient_id = %recipient_id,
            connection_id = %handle.id,
            connections = entry.len(),
            "Connection registered"
        );

        (handle, receiver)
    }

    /// Remove one connection. Recipients with no connections left are
    /// dropped from the map.
    pub fn unregister(&self, recipient_id: Uuid, connection_id: Uuid) {
        if let Some(mut entry) = self.connections.get_mut(&recipient_id) {
            entry.retain(|c| c.id != connection_id);
            let empty = entry.is_empty();
            drop(entry);
            if empty {
                self.connections
                    .remove_if(&recipient_id, |_, v| v.is_empty());
            }
        }
    }

    /// Deliver a frame to every live connection of a recipient. Returns
    /// how many connections accepted it. Closed connections are pruned
    /// on the way through.
    pub fn send_to(&self, recipient_id: Uuid, frame: Frame) -> usize {
        let Some(mut entry) = self.connections.get_mut(&recipient_id) else {
            return 0;
        };
        entry.retain(|c| !c.is_closed());

        let mut delivered = 0;
        for connection in entry.iter() {
            if connection.push(Arc::clone(&frame)) {
                delivered += 1;
            } else {
                warn!(
                    recipient_id = %recipient_id,
                    connection_id = %connection.id,
                    "Dropped frame for slow or closed connection"
                );
            }
        }
        delivered
    }

    /// Number of live connections for a recipient.
    pub fn connection_count(&self, recipient_id: Uuid) -> usize {
        self.connections
            .get(&recipient_id)
            .map(|v| v.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ConnectionRegistry {
        let config = RealtimeConfig {
            max_connections_per_recipient: 2,
            ..RealtimeConfig::default()
        };
        ConnectionRegistry::new(config)
    }

    #[tokio::test]
    async fn test_register_and_send() {
        let registry = registry();
        let recipient = Uuid::new_v4();
        let (_handle, mut receiver) = registry.register(recipient);

        let delivered = registry.send_to(recipient, Arc::from("hello"));
        assert_eq!(delivered, 1);
        assert_eq!(receiver.recv().await.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_cap_evicts_oldest() {
        let registry = registry();
        let recipient = Uuid::new_v4();
        let (_first, mut rx1) = registry.register(recipient);
        let (_second, mut rx2) = registry.register(recipient);
        let (_third, mut rx3) = registry.register(recipient);

        assert_eq!(registry.connection_count(recipient), 2);
        assert_eq!(registry.send_to(recipient, Arc::from("frame")), 2);
        assert!(rx1.try_recv().is_err());
        assert_eq!(rx2.try_recv().ok().as_deref(), Some("frame"));
        assert_eq!(rx3.try_recv().ok().as_deref(), Some("frame"));
    }

    #[tokio::test]
    async fn test_unregister_removes_connection() {
        let registry = registry();
        let recipient = Uuid::new_v4();
        let (handle, _rx) = registry.register(recipient);

        registry.unregister(recipient, handle.id);
        assert_eq!(registry.connection_count(recipient), 0);
        assert_eq!(registry.send_to(recipient, Arc::from("gone")), 0);
    }

    #[tokio::test]
    async fn test_send_to_unknown_recipient_is_zero() {
        let registry = registry();
        assert_eq!(registry.send_to(Uuid::new_v4(), Arc::from("nobody")), 0);
    }
}
