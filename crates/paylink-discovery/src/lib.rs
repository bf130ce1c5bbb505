//! PayLink service discovery.
//!
//! Responders advertise a `payment-device` service; Initiators browse for it
//! and collect resolved peers in a [`PeerDirectory`].
//!
//! ## Architecture
//!
//! - **DiscoveryTransport**: Trait every discovery binding implements
//! - **MemoryDiscovery**: In-process binding over a shared [`MemoryNetwork`]
//! - **MulticastDiscovery**: LAN binding using UDP multicast announcements
//! - **ServiceAdvertiser**: Publishes the Responder's record
//! - **ServiceBrowser**: Applies browse events to the peer directory

pub mod advertiser;
pub mod browser;
pub mod directory;
pub mod memory;
pub mod multicast;
pub mod transport;

pub use advertiser::ServiceAdvertiser;
pub use browser::ServiceBrowser;
pub use directory::PeerDirectory;
pub use memory::{MemoryDiscovery, MemoryNetwork};
pub use multicast::{MulticastConfig, MulticastDiscovery};
pub use transport::{DiscoveryError, DiscoveryEvent, DiscoveryTransport, ServiceRecord, ServiceType};

use paylink_types::config::{DiscoveryBackend, DiscoveryConfig};
use std::sync::Arc;

/// Open the binding selected by `config.backend`.
///
/// The memory backend attaches to the process-wide [`MemoryNetwork`].
pub async fn open_transport(
    config: &DiscoveryConfig,
) -> Result<Arc<dyn DiscoveryTransport>, DiscoveryError> {
    match config.backend {
        DiscoveryBackend::Memory => Ok(Arc::new(MemoryDiscovery::new(MemoryNetwork::shared()))),
        DiscoveryBackend::Multicast => {
            let multicast = MulticastConfig::from_config(config)?;
            Ok(Arc::new(MulticastDiscovery::bind(multicast).await?))
        }
    }
}
