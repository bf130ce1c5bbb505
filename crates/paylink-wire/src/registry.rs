//! Client registry: tracks the Responder's live client connections.
//!
//! Accept inserts and per-client teardown removes, each from its own task,
//! so the registry is a concurrent map keyed by a monotonically allocated
//! client id. Insert and remove never contend on a single global lock and
//! a double remove is a no-op.

use crate::connection::Connection;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::AbortHandle;

/// Public view of a connected client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    /// Registry-assigned id, unique for the lifetime of the registry.
    pub id: u64,
    /// Remote socket address of the client.
    pub remote_address: SocketAddr,
    /// When the connection was accepted.
    pub connected_at: DateTime<Utc>,
}

/// A tracked client: its info, its connection, and its handler task.
#[derive(Debug)]
pub struct ClientEntry {
    pub info: ClientInfo,
    pub connection: Arc<Connection>,
    pub task: Option<AbortHandle>,
}

/// Thread-safe registry of connected clients.
#[derive(Debug, Clone, Default)]
pub struct ClientRegistry {
    clients: Arc<DashMap<u64, ClientEntry>>,
    next_id: Arc<AtomicU64>,
}

impl ClientRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly accepted connection and return its id.
    pub fn register(&self, connection: Arc<Connection>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let info = ClientInfo {
            id,
            remote_address: connection.remote_addr(),
            connected_at: Utc::now(),
        };
        self.clients.insert(
            id,
            ClientEntry {
                info,
                connection,
                task: None,
            },
        );
        id
    }

    /// Record the handler task of a client. Ignored if the client is gone.
    pub fn attach_task(&self, id: u64, task: AbortHandle) {
        if let Some(mut entry) = self.clients.get_mut(&id) {
            entry.task = Some(task);
        }
    }

    /// Stop tracking a client.
    pub fn remove(&self, id: u64) -> Option<ClientEntry> {
        self.clients.remove(&id).map(|(_, entry)| entry)
    }

    /// Remove and return every tracked client.
    pub fn drain(&self) -> Vec<ClientEntry> {
        let ids: Vec<u64> = self.clients.iter().map(|e| *e.key()).collect();
        ids.into_iter().filter_map(|id| self.remove(id)).collect()
    }

    /// Snapshot of connected clients, ordered by id.
    pub fn clients(&self) -> Vec<ClientInfo> {
        let mut clients: Vec<ClientInfo> =
            self.clients.iter().map(|e| e.value().info.clone()).collect();
        clients.sort_by_key(|c| c.id);
        clients
    }

    /// Number of connected clients.
    pub fn count(&self) -> usize {
        self.clients.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paylink_types::config::Framing;
    use tokio::net::TcpListener;

    async fn connection(listener: &TcpListener) -> Arc<Connection> {
        let addr = listener.local_addr().unwrap();
        let (conn, _rx) = Connection::connect("127.0.0.1", addr.port(), Framing::Raw)
            .await
            .unwrap();
        conn
    }

    #[tokio::test]
    async fn test_register_and_remove() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let registry = ClientRegistry::new();
        let a = registry.register(connection(&listener).await);
        let b = registry.register(connection(&listener).await);
        assert_ne!(a, b);
        assert_eq!(registry.count(), 2);

        assert!(registry.remove(a).is_some());
        assert!(registry.remove(a).is_none());
        assert_eq!(registry.count(), 1);
        assert_eq!(registry.clients()[0].id, b);
    }

    #[tokio::test]
    async fn test_drain_empties_registry() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let registry = ClientRegistry::new();
        for _ in 0..3 {
            registry.register(connection(&listener).await);
        }
        assert_eq!(registry.drain().len(), 3);
        assert_eq!(registry.count(), 0);
    }

    #[tokio::test]
    async fn test_interleaved_register_remove() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let registry = ClientRegistry::new();
        let mut conns = Vec::new();
        for _ in 0..8 {
            conns.push(connection(&listener).await);
        }

        let tasks: Vec<_> = conns
            .into_iter()
            .map(|conn| {
                let registry = registry.clone();
                tokio::spawn(async move {
                    let id = registry.register(conn);
                    tokio::task::yield_now().await;
                    registry.remove(id);
                })
            })
            .collect();
        for t in tasks {
            t.await.unwrap();
        }
        assert_eq!(registry.count(), 0);
    }
}
