//! The discovery transport seam.
//!
//! Advertisement and browsing go through [`DiscoveryTransport`] so the rest
//! of the system never depends on how records travel across the network.

use async_trait::async_trait;
use paylink_types::config::DiscoveryConfig;
use paylink_types::error::PayLinkError;
use paylink_types::peer::PeerDescriptor;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Capacity of a browse event channel.
pub(crate) const BROWSE_BUFFER: usize = 64;

/// Errors from the discovery layer.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Discovery unavailable: {0}")]
    Init(String),
    #[error("Advertise failed: {0}")]
    Advertise(String),
    #[error("Browse failed: {0}")]
    Browse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<DiscoveryError> for PayLinkError {
    fn from(err: DiscoveryError) -> Self {
        match err {
            DiscoveryError::Init(reason) => PayLinkError::DiscoveryInit(reason),
            other => PayLinkError::DiscoveryEvent(other.to_string()),
        }
    }
}

/// A service type triple, e.g. `payment-device` / `tcp` / `local.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceType {
    pub service_type: String,
    pub protocol: String,
    pub domain: String,
}

impl ServiceType {
    pub fn new(
        service_type: impl Into<String>,
        protocol: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            service_type: service_type.into(),
            protocol: protocol.into(),
            domain: domain.into(),
        }
    }

    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self::new(&config.service_type, &config.protocol, &config.domain)
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "_{}._{}.{}", self.service_type, self.protocol, self.domain)
    }
}

/// An advertised service instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
    pub service: ServiceType,
    /// Instance name, unique per advertisement.
    pub name: String,
    pub port: u16,
    /// Addresses to advertise. Empty lets the transport fill them in.
    pub addresses: Vec<String>,
}

/// Browse notifications, in the order the transport observed them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    /// A new instance name appeared.
    Found(String),
    /// An instance resolved to a connectable descriptor.
    Resolved(PeerDescriptor),
    /// An instance went away.
    Removed(String),
    /// The transport hit an error; browsing continues.
    Error(String),
}

/// A discovery binding.
///
/// Each instance browses at most one service type at a time; a new
/// [`browse`](Self::browse) replaces the previous one.
#[async_trait]
pub trait DiscoveryTransport: Send + Sync {
    /// Publish `record` until it is unadvertised.
    async fn advertise(&self, record: ServiceRecord) -> Result<(), DiscoveryError>;

    /// Withdraw the record published under `name`.
    async fn unadvertise(&self, name: &str) -> Result<(), DiscoveryError>;

    /// Start browsing `service`. Events arrive on the returned channel until
    /// [`stop_browse`](Self::stop_browse) is called.
    async fn browse(
        &self,
        service: &ServiceType,
    ) -> Result<mpsc::Receiver<DiscoveryEvent>, DiscoveryError>;

    /// Stop browsing. Idempotent.
    async fn stop_browse(&self);

    /// Short name for logs.
    fn name(&self) -> &'static str;
}
