//! ServiceAdvertiser: publishes the Responder's service record.

use crate::transport::{DiscoveryError, DiscoveryTransport, ServiceRecord};

use paylink_types::activity::ActivityLog;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Publishes at most one record at a time.
///
/// Built without a transport when discovery failed to initialize; every
/// operation is then a logged no-op.
pub struct ServiceAdvertiser {
    transport: Option<Arc<dyn DiscoveryTransport>>,
    advertised: Mutex<Option<ServiceRecord>>,
    log: ActivityLog,
}

impl ServiceAdvertiser {
    pub fn new(transport: Arc<dyn DiscoveryTransport>, log: ActivityLog) -> Self {
        Self {
            transport: Some(transport),
            advertised: Mutex::new(None),
            log,
        }
    }

    /// An advertiser with no usable transport.
    pub fn disabled(log: ActivityLog) -> Self {
        Self {
            transport: None,
            advertised: Mutex::new(None),
            log,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// The record currently published, if any.
    pub async fn advertised(&self) -> Option<ServiceRecord> {
        self.advertised.lock().await.clone()
    }

    /// Publish `record`. A second call before `unadvertise` is ignored.
    pub async fn advertise(&self, record: ServiceRecord) -> Result<(), DiscoveryError> {
        let Some(transport) = &self.transport else {
            self.log
                .warn(format!("Discovery unavailable; {} not advertised", record.name));
            return Ok(());
        };

        let mut advertised = self.advertised.lock().await;
        if let Some(current) = advertised.as_ref() {
            self.log.warn(format!(
                "Service {} is already advertised; ignoring {}",
                current.name, record.name
            ));
            return Ok(());
        }

        match transport.advertise(record.clone()).await {
            Ok(()) => {
                self.log.info(format!(
                    "Service published: {} on port {} ({})",
                    record.name, record.port, record.service
                ));
                *advertised = Some(record);
                Ok(())
            }
            Err(e) => {
                self.log.error(format!("Failed to publish service: {e}"));
                Err(e)
            }
        }
    }

    /// Withdraw the record named `name`. No-op when it is not advertised.
    pub async fn unadvertise(&self, name: &str) {
        let Some(transport) = &self.transport else {
            return;
        };

        let mut advertised = self.advertised.lock().await;
        match advertised.as_ref() {
            Some(current) if current.name == name => {}
            _ => {
                self.log.info(format!("Service {name} is not advertised"));
                return;
            }
        }
        *advertised = None;
        match transport.unadvertise(name).await {
            Ok(()) => self.log.info(format!("Service unpublished: {name}")),
            Err(e) => self.log.error(format!("Failed to unpublish service: {e}")),
        }
    }
}
