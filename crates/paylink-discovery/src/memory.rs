//! In-process discovery binding.
//!
//! Every [`MemoryDiscovery`] attached to the same [`MemoryNetwork`] sees the
//! records the others advertise. Used for tests and single-process demos.

use crate::transport::{
    DiscoveryError, DiscoveryEvent, DiscoveryTransport, ServiceRecord, ServiceType, BROWSE_BUFFER,
};

use async_trait::async_trait;
use paylink_types::peer::PeerDescriptor;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, RwLock};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::debug;

const NOTICE_CAPACITY: usize = 64;

/// Host reported for records advertised without addresses.
const LOOPBACK: &str = "127.0.0.1";

#[derive(Debug, Clone)]
enum Notice {
    Announce(ServiceRecord),
    Goodbye(ServiceRecord),
}

/// A shared in-process "network" of advertised records.
#[derive(Debug, Clone)]
pub struct MemoryNetwork {
    records: Arc<RwLock<HashMap<String, ServiceRecord>>>,
    notices: broadcast::Sender<Notice>,
}

impl Default for MemoryNetwork {
    fn default() -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            notices,
        }
    }
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide network.
    pub fn shared() -> Self {
        static NETWORK: OnceLock<MemoryNetwork> = OnceLock::new();
        NETWORK.get_or_init(MemoryNetwork::new).clone()
    }

    /// Records currently advertised, in no particular order.
    pub fn records(&self) -> Vec<ServiceRecord> {
        self.records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect()
    }

    fn publish(&self, record: ServiceRecord) {
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(record.name.clone(), record.clone());
        let _ = self.notices.send(Notice::Announce(record));
    }

    fn withdraw(&self, name: &str) -> bool {
        let removed = self
            .records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(name);
        match removed {
            Some(record) => {
                let _ = self.notices.send(Notice::Goodbye(record));
                true
            }
            None => false,
        }
    }
}

/// One node on a [`MemoryNetwork`].
#[derive(Debug)]
pub struct MemoryDiscovery {
    network: MemoryNetwork,
    browse_task: Mutex<Option<JoinHandle<()>>>,
}

impl MemoryDiscovery {
    pub fn new(network: MemoryNetwork) -> Self {
        Self {
            network,
            browse_task: Mutex::new(None),
        }
    }

    fn replace_browse(&self, task: Option<JoinHandle<()>>) {
        let previous = std::mem::replace(
            &mut *self.browse_task.lock().unwrap_or_else(|e| e.into_inner()),
            task,
        );
        if let Some(previous) = previous {
            previous.abort();
        }
    }
}

impl Drop for MemoryDiscovery {
    fn drop(&mut self) {
        self.replace_browse(None);
    }
}

fn resolve(record: &ServiceRecord) -> PeerDescriptor {
    let host = record
        .addresses
        .first()
        .cloned()
        .unwrap_or_else(|| LOOPBACK.to_string());
    PeerDescriptor::new(&record.name, host, record.port, record.addresses.clone())
}

async fn emit_found(tx: &mpsc::Sender<DiscoveryEvent>, record: &ServiceRecord) -> bool {
    tx.send(DiscoveryEvent::Found(record.name.clone())).await.is_ok()
        && tx.send(DiscoveryEvent::Resolved(resolve(record))).await.is_ok()
}

#[async_trait]
impl DiscoveryTransport for MemoryDiscovery {
    async fn advertise(&self, record: ServiceRecord) -> Result<(), DiscoveryError> {
        debug!(name = %record.name, service = %record.service, "memory advertise");
        self.network.publish(record);
        Ok(())
    }

    async fn unadvertise(&self, name: &str) -> Result<(), DiscoveryError> {
        if !self.network.withdraw(name) {
            debug!(name, "memory unadvertise of unknown record");
        }
        Ok(())
    }

    async fn browse(
        &self,
        service: &ServiceType,
    ) -> Result<mpsc::Receiver<DiscoveryEvent>, DiscoveryError> {
        let (tx, rx) = mpsc::channel(BROWSE_BUFFER);
        // Subscribe before the snapshot so nothing published in between is missed
        let mut notices = self.network.notices.subscribe();
        let existing: Vec<ServiceRecord> = self
            .network
            .records()
            .into_iter()
            .filter(|r| &r.service == service)
            .collect();
        let service = service.clone();

        let task = tokio::spawn(async move {
            for record in &existing {
                if !emit_found(&tx, record).await {
                    return;
                }
            }
            loop {
                let notice = match notices.recv().await {
                    Ok(notice) => notice,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        let detail = format!("missed {n} discovery notices");
                        if tx.send(DiscoveryEvent::Error(detail)).await.is_err() {
                            return;
                        }
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                };
                let delivered = match notice {
                    Notice::Announce(record) if record.service == service => {
                        emit_found(&tx, &record).await
                    }
                    Notice::Goodbye(record) if record.service == service => tx
                        .send(DiscoveryEvent::Removed(record.name))
                        .await
                        .is_ok(),
                    _ => true,
                };
                if !delivered {
                    return;
                }
            }
        });
        self.replace_browse(Some(task));
        Ok(rx)
    }

    async fn stop_browse(&self) {
        self.replace_browse(None);
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ServiceType {
        ServiceType::new("payment-device", "tcp", "local.")
    }

    fn record(name: &str, port: u16) -> ServiceRecord {
        ServiceRecord {
            service: service(),
            name: name.to_string(),
            port,
            addresses: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_browse_sees_existing_and_new_records() {
        let network = MemoryNetwork::new();
        let responder = MemoryDiscovery::new(network.clone());
        let initiator = MemoryDiscovery::new(network);

        responder.advertise(record("A", 8080)).await.unwrap();
        let mut rx = initiator.browse(&service()).await.unwrap();
        assert_eq!(rx.recv().await, Some(DiscoveryEvent::Found("A".to_string())));
        match rx.recv().await {
            Some(DiscoveryEvent::Resolved(peer)) => {
                assert_eq!(peer.address(), "127.0.0.1:8080");
            }
            other => panic!("Expected Resolved, got {other:?}"),
        }

        responder.advertise(record("B", 9090)).await.unwrap();
        assert_eq!(rx.recv().await, Some(DiscoveryEvent::Found("B".to_string())));
        assert!(matches!(rx.recv().await, Some(DiscoveryEvent::Resolved(_))));

        responder.unadvertise("A").await.unwrap();
        assert_eq!(rx.recv().await, Some(DiscoveryEvent::Removed("A".to_string())));
    }

    #[tokio::test]
    async fn test_other_service_types_are_filtered() {
        let network = MemoryNetwork::new();
        let node = MemoryDiscovery::new(network);
        let mut rx = node.browse(&service()).await.unwrap();

        let mut other = record("printer", 631);
        other.service = ServiceType::new("ipp", "tcp", "local.");
        node.advertise(other).await.unwrap();
        node.advertise(record("A", 1)).await.unwrap();

        assert_eq!(rx.recv().await, Some(DiscoveryEvent::Found("A".to_string())));
    }

    #[tokio::test]
    async fn test_stop_browse_closes_channel() {
        let node = MemoryDiscovery::new(MemoryNetwork::new());
        let mut rx = node.browse(&service()).await.unwrap();
        node.stop_browse().await;
        node.stop_browse().await;
        assert_eq!(rx.recv().await, None);
    }
}
