//! Event bus: change notifications for the presentation layer, with a
//! history ring buffer.

use paylink_types::connection::ConnectionState;
use paylink_types::peer::PeerDescriptor;
use paylink_types::ring::BoundedRing;
use paylink_types::transaction::TransactionResponse;
use paylink_wire::ExchangeOutcome;
use tokio::sync::broadcast;
use tracing::debug;

/// Maximum events retained in the history ring buffer.
const HISTORY_SIZE: usize = 100;

/// Something observable changed.
#[derive(Debug, Clone, PartialEq)]
pub enum KernelEvent {
    /// The Initiator's connection moved to a new state.
    ConnectionChanged(ConnectionState),
    /// The discovered peer set changed; carries the new snapshot.
    PeersChanged(Vec<PeerDescriptor>),
    /// An Initiator request settled.
    TransactionSettled(ExchangeOutcome),
    /// The Responder decided a request.
    TransactionProcessed(TransactionResponse),
    ServerStarted { port: u16 },
    ServerStopped { clients_disconnected: usize },
}

impl KernelEvent {
    fn kind(&self) -> &'static str {
        match self {
            Self::ConnectionChanged(_) => "connection_changed",
            Self::PeersChanged(_) => "peers_changed",
            Self::TransactionSettled(_) => "transaction_settled",
            Self::TransactionProcessed(_) => "transaction_processed",
            Self::ServerStarted { .. } => "server_started",
            Self::ServerStopped { .. } => "server_stopped",
        }
    }
}

/// Broadcast channel plus recent history.
pub struct EventBus {
    sender: broadcast::Sender<KernelEvent>,
    history: BoundedRing<KernelEvent>,
}

impl EventBus {
    /// Create a new event bus.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self {
            sender,
            history: BoundedRing::new(HISTORY_SIZE),
        }
    }

    /// Publish an event to the bus.
    pub fn publish(&self, event: KernelEvent) {
        debug!(kind = event.kind(), "Publishing event");
        self.history.push(event.clone());
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<KernelEvent> {
        self.sender.subscribe()
    }

    /// Get recent event history, newest first.
    pub fn history(&self, limit: usize) -> Vec<KernelEvent> {
        self.history.snapshot().into_iter().take(limit).collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_and_history() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.publish(KernelEvent::ServerStarted { port: 8080 });
        bus.publish(KernelEvent::ServerStopped {
            clients_disconnected: 2,
        });

        assert_eq!(
            rx.recv().await.unwrap(),
            KernelEvent::ServerStarted { port: 8080 }
        );
        let history = bus.history(10);
        assert_eq!(history.len(), 2);
        assert_eq!(
            history[0],
            KernelEvent::ServerStopped {
                clients_disconnected: 2
            }
        );
    }

    #[test]
    fn test_history_is_bounded() {
        let bus = EventBus::new();
        for port in 0..(HISTORY_SIZE as u16 + 5) {
            bus.publish(KernelEvent::ServerStarted { port });
        }
        assert_eq!(bus.history(usize::MAX).len(), HISTORY_SIZE);
        assert_eq!(bus.history(1).len(), 1);
    }
}
