//! ServiceBrowser: tracks Responders as they come and go.

use crate::directory::PeerDirectory;
use crate::transport::{DiscoveryEvent, DiscoveryTransport, ServiceType};

use paylink_types::activity::ActivityLog;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Applies browse events to a [`PeerDirectory`] and republishes them.
///
/// Built without a transport when discovery failed to initialize; every
/// operation is then a logged no-op.
pub struct ServiceBrowser {
    transport: Option<Arc<dyn DiscoveryTransport>>,
    directory: PeerDirectory,
    events: broadcast::Sender<DiscoveryEvent>,
    task: Mutex<Option<JoinHandle<()>>>,
    log: ActivityLog,
}

impl ServiceBrowser {
    pub fn new(transport: Arc<dyn DiscoveryTransport>, log: ActivityLog) -> Self {
        Self::build(Some(transport), log)
    }

    /// A browser with no usable transport.
    pub fn disabled(log: ActivityLog) -> Self {
        Self::build(None, log)
    }

    fn build(transport: Option<Arc<dyn DiscoveryTransport>>, log: ActivityLog) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            transport,
            directory: PeerDirectory::new(),
            events,
            task: Mutex::new(None),
            log,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    pub fn is_browsing(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }

    pub fn directory(&self) -> &PeerDirectory {
        &self.directory
    }

    /// Every event applied to the directory, after it was applied.
    pub fn subscribe(&self) -> broadcast::Receiver<DiscoveryEvent> {
        self.events.subscribe()
    }

    /// Clear the directory and start browsing `service`, replacing any
    /// browse already running.
    pub async fn browse(&self, service: &ServiceType) {
        let Some(transport) = &self.transport else {
            self.log.warn("Discovery unavailable; scan skipped");
            return;
        };

        self.halt(transport.as_ref()).await;
        self.directory.clear();

        let rx = match transport.browse(service).await {
            Ok(rx) => rx,
            Err(e) => {
                self.log.error(format!("Scan error: {e}"));
                return;
            }
        };
        self.log.info(format!("Scanning for {service}"));

        let task = tokio::spawn(pump(
            rx,
            self.directory.clone(),
            self.events.clone(),
            self.log.clone(),
        ));
        *self.task.lock().unwrap_or_else(|e| e.into_inner()) = Some(task);
    }

    /// Stop browsing. Idempotent; the directory keeps its contents.
    pub async fn stop_browse(&self) {
        let Some(transport) = &self.transport else {
            return;
        };
        if self.halt(transport.as_ref()).await {
            self.log.info("Scan stopped");
        }
    }

    async fn halt(&self, transport: &dyn DiscoveryTransport) -> bool {
        let task = self.task.lock().unwrap_or_else(|e| e.into_inner()).take();
        let Some(task) = task else {
            return false;
        };
        task.abort();
        transport.stop_browse().await;
        true
    }
}

impl Drop for ServiceBrowser {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().unwrap_or_else(|e| e.into_inner()).take() {
            task.abort();
        }
    }
}

async fn pump(
    mut rx: mpsc::Receiver<DiscoveryEvent>,
    directory: PeerDirectory,
    events: broadcast::Sender<DiscoveryEvent>,
    log: ActivityLog,
) {
    while let Some(event) = rx.recv().await {
        match &event {
            DiscoveryEvent::Found(name) => log.info(format!("Device found: {name}")),
            DiscoveryEvent::Resolved(peer) => {
                if directory.insert(peer.clone()) {
                    log.info(format!("Device resolved: {} at {}", peer.name, peer.address()));
                }
            }
            DiscoveryEvent::Removed(name) => {
                if directory.remove(name) {
                    log.info(format!("Device removed: {name}"));
                }
            }
            DiscoveryEvent::Error(detail) => log.error(format!("Scan error: {detail}")),
        }
        let _ = events.send(event);
    }
}
