//! Initiator: scan for Responders, connect, and send payments.
//!
//! Commands mirror what an operator does on the paying device; everything
//! else is a read-only projection. State changes are republished on the
//! [`EventBus`].

use crate::error::{KernelError, KernelResult};
use crate::event_bus::{EventBus, KernelEvent};

use paylink_discovery::{
    open_transport, DiscoveryTransport, PeerDirectory, ServiceBrowser, ServiceType,
};
use paylink_types::activity::{ActivityLog, LogEntry};
use paylink_types::config::PayLinkConfig;
use paylink_types::connection::ConnectionState;
use paylink_types::peer::PeerDescriptor;
use paylink_types::transaction::TransactionRequest;
use paylink_wire::{ExchangeOutcome, InitiatorLink, LinkConfig, LinkEvent, PendingResponse};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Parse operator-entered amount text.
///
/// Uses the longest numeric prefix, so `"12.5abc"` is 12.5; text with no
/// numeric prefix is 0.
pub fn parse_amount(text: &str) -> f64 {
    let text = text.trim();
    (1..=text.len())
        .rev()
        .filter(|&end| text.is_char_boundary(end))
        .find_map(|end| text[..end].parse::<f64>().ok())
        .filter(|amount| amount.is_finite())
        .unwrap_or(0.0)
}

/// Request id for a payment sent now.
pub fn next_request_id() -> String {
    format!("PAY_{}", paylink_types::now_millis())
}

/// The paying side.
pub struct Initiator {
    service: ServiceType,
    browser: ServiceBrowser,
    link: InitiatorLink,
    log: ActivityLog,
    bus: Arc<EventBus>,
    forwarders: Vec<JoinHandle<()>>,
}

impl Initiator {
    /// Build an Initiator using the configured discovery backend.
    ///
    /// A discovery backend that fails to open leaves scanning disabled; direct
    /// connections still work.
    pub async fn start(config: &PayLinkConfig) -> Self {
        let log = ActivityLog::new("initiator");
        let transport = match open_transport(&config.discovery).await {
            Ok(transport) => {
                log.info(format!("Discovery started ({})", transport.name()));
                Some(transport)
            }
            Err(e) => {
                log.error(format!("Failed to initialize discovery: {e}"));
                None
            }
        };
        Self::with_transport(config, transport, log)
    }

    /// Build an Initiator on an explicit discovery transport.
    pub fn with_transport(
        config: &PayLinkConfig,
        transport: Option<Arc<dyn DiscoveryTransport>>,
        log: ActivityLog,
    ) -> Self {
        let browser = match transport {
            Some(transport) => ServiceBrowser::new(transport, log.clone()),
            None => ServiceBrowser::disabled(log.clone()),
        };
        let link = InitiatorLink::new(
            LinkConfig {
                framing: config.exchange.framing,
                response_timeout: config.exchange.response_timeout(),
            },
            log.clone(),
        );
        let bus = Arc::new(EventBus::new());

        let forwarders = vec![
            tokio::spawn(forward_link(link.subscribe(), Arc::clone(&bus))),
            tokio::spawn(forward_peers(
                browser.subscribe(),
                browser.directory().clone(),
                Arc::clone(&bus),
            )),
        ];

        Self {
            service: ServiceType::from_config(&config.discovery),
            browser,
            link,
            log,
            bus,
            forwarders,
        }
    }

    // -- Commands ----------------------------------------------------------

    /// Clear the device list and start browsing.
    pub async fn start_scanning(&self) {
        self.browser.browse(&self.service).await;
    }

    pub async fn stop_scanning(&self) {
        self.browser.stop_browse().await;
    }

    /// Connect to the discovered device named `name`.
    pub async fn connect_to_device(&self, name: &str) -> KernelResult<()> {
        let Some(peer) = self.browser.directory().get(name) else {
            self.log.error(format!("Unknown device: {name}"));
            return Err(KernelError::UnknownPeer(name.to_string()));
        };
        self.connect_to(&peer).await
    }

    /// Connect to an explicit descriptor.
    pub async fn connect_to(&self, peer: &PeerDescriptor) -> KernelResult<()> {
        self.link.connect(peer).await?;
        Ok(())
    }

    /// Send a payment built from operator input.
    ///
    /// Fails immediately with "no active connection" when not connected.
    pub async fn send_transaction(
        &self,
        amount_text: &str,
        description: &str,
    ) -> KernelResult<PendingResponse> {
        let request = TransactionRequest::new(next_request_id(), parse_amount(amount_text), description);
        let pending = self.link.submit(&request).await?;
        self.log.info(format!(
            "Payment sent: {} - {}",
            request.amount, request.description
        ));
        Ok(pending)
    }

    /// Send a payment and wait for it to settle.
    pub async fn pay(&self, amount_text: &str, description: &str) -> KernelResult<ExchangeOutcome> {
        let pending = self.send_transaction(amount_text, description).await?;
        Ok(pending.outcome().await)
    }

    pub async fn disconnect(&self) {
        self.link.disconnect().await;
    }

    pub fn clear_logs(&self) {
        self.log.clear();
    }

    // -- Projections -------------------------------------------------------

    pub fn connection_state(&self) -> ConnectionState {
        self.link.state()
    }

    pub fn discovered_devices(&self) -> Vec<PeerDescriptor> {
        self.browser.directory().snapshot()
    }

    pub fn is_scanning(&self) -> bool {
        self.browser.is_browsing()
    }

    pub fn discovery_enabled(&self) -> bool {
        self.browser.is_enabled()
    }

    /// Activity log, newest first.
    pub fn logs(&self) -> Vec<LogEntry> {
        self.log.entries()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<KernelEvent> {
        self.bus.subscribe()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }
}

impl Drop for Initiator {
    fn drop(&mut self) {
        self.link.close_now();
        for task in &self.forwarders {
            task.abort();
        }
    }
}

async fn forward_link(mut rx: broadcast::Receiver<LinkEvent>, bus: Arc<EventBus>) {
    loop {
        match rx.recv().await {
            Ok(LinkEvent::StateChanged(state)) => bus.publish(KernelEvent::ConnectionChanged(state)),
            Ok(LinkEvent::Outcome(outcome)) => bus.publish(KernelEvent::TransactionSettled(outcome)),
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}

async fn forward_peers<T: Clone>(
    mut rx: broadcast::Receiver<T>,
    directory: PeerDirectory,
    bus: Arc<EventBus>,
) {
    loop {
        match rx.recv().await {
            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {
                bus.publish(KernelEvent::PeersChanged(directory.snapshot()));
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}
