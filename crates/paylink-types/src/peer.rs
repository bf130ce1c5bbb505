//! Discovered peer descriptors.

use serde::{Deserialize, Serialize};

/// A resolved, connectable record for a peer advertising the payment service.
///
/// Produced by discovery resolve events and never mutated afterwards. The
/// instance `name` is the identity used for deduplication and removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerDescriptor {
    /// Service instance name, unique per advertisement.
    pub name: String,
    /// Host name or IP address to dial.
    pub host: String,
    /// TCP port of the Responder.
    pub port: u16,
    /// Every address the peer resolved to, in resolution order.
    #[serde(default)]
    pub addresses: Vec<String>,
}

impl PeerDescriptor {
    /// Build a descriptor. When `addresses` is empty the host is used as the
    /// only address.
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        addresses: Vec<String>,
    ) -> Self {
        let host = host.into();
        let addresses = if addresses.is_empty() {
            vec![host.clone()]
        } else {
            addresses
        };
        Self {
            name: name.into(),
            host,
            port,
            addresses,
        }
    }

    /// `host:port` string used for dialing and display.
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}
