//! Responder: accept payment requests and decide them.
//!
//! `start_server` binds first and only then advertises, using the port that
//! was actually bound. `stop_server` tears down in reverse: clients, then the
//! listener, then the advertisement.

use crate::error::{KernelError, KernelResult};
use crate::event_bus::{EventBus, KernelEvent};
use crate::processor::TransactionProcessor;

use paylink_discovery::{
    open_transport, DiscoveryTransport, ServiceAdvertiser, ServiceRecord, ServiceType,
};
use paylink_types::activity::{ActivityLog, LogEntry};
use paylink_types::config::PayLinkConfig;
use paylink_types::error::PayLinkError;
use paylink_types::ring::BoundedRing;
use paylink_types::transaction::{TransactionRequest, TransactionResponse};
use paylink_wire::{
    ClientInfo, RequestHandler, ResponderServer, ServerConfig, PROCESSED_LOG_CAPACITY,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

/// Publishes every decision on the bus.
struct PublishingHandler {
    processor: Arc<TransactionProcessor>,
    bus: Arc<EventBus>,
}

impl RequestHandler for PublishingHandler {
    fn process(&self, request: &TransactionRequest) -> TransactionResponse {
        let response = self.processor.process(request);
        self.bus
            .publish(KernelEvent::TransactionProcessed(response.clone()));
        response
    }
}

/// The receiving side.
pub struct Responder {
    config: PayLinkConfig,
    advertiser: ServiceAdvertiser,
    processor: Arc<TransactionProcessor>,
    processed: BoundedRing<TransactionResponse>,
    server: Mutex<Option<Arc<ResponderServer>>>,
    log: ActivityLog,
    bus: Arc<EventBus>,
}

impl Responder {
    /// Build a Responder using the configured discovery backend and the
    /// configured random approval policy.
    pub async fn start(config: &PayLinkConfig) -> Self {
        let log = ActivityLog::new("responder");
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
        let processor = TransactionProcessor::from_config(&config.processor, log.clone());
        Self::with_parts(config, transport, processor, log)
    }

    /// Build a Responder from explicit parts.
    pub fn with_parts(
        config: &PayLinkConfig,
        transport: Option<Arc<dyn DiscoveryTransport>>,
        processor: TransactionProcessor,
        log: ActivityLog,
    ) -> Self {
        let advertiser = match transport {
            Some(transport) => ServiceAdvertiser::new(transport, log.clone()),
            None => ServiceAdvertiser::disabled(log.clone()),
        };
        Self {
            config: config.clone(),
            advertiser,
            processor: Arc::new(processor),
            processed: BoundedRing::new(PROCESSED_LOG_CAPACITY),
            server: Mutex::new(None),
            log,
            bus: Arc::new(EventBus::new()),
        }
    }

    // -- Commands ----------------------------------------------------------

    /// Bind the listener, then advertise the bound port.
    pub async fn start_server(&self) -> KernelResult<SocketAddr> {
        let mut slot = self.server.lock().await;
        if let Some(server) = slot.as_ref() {
            let port = server.local_addr().port();
            self.log
                .warn(format!("Server is already running on port {port}"));
            return Err(KernelError::ServerAlreadyRunning(port));
        }

        let responder = &self.config.responder;
        let handler = Arc::new(PublishingHandler {
            processor: Arc::clone(&self.processor),
            bus: Arc::clone(&self.bus),
        });
        let server = match ResponderServer::start(
            ServerConfig {
                bind_host: responder.bind_host.clone(),
                port: responder.port,
                framing: self.config.exchange.framing,
            },
            handler,
            self.processed.clone(),
            self.log.clone(),
        )
        .await
        {
            Ok(server) => server,
            Err(e) => {
                let err = PayLinkError::from(e);
                self.log.error(format!("Failed to start server: {err}"));
                return Err(err.into());
            }
        };
        let addr = server.local_addr();
        *slot = Some(server);

        let record = ServiceRecord {
            service: ServiceType::from_config(&self.config.discovery),
            name: responder.service_name.clone(),
            port: addr.port(),
            addresses: Vec::new(),
        };
        // The server stays up even when the advertisement fails
        let _ = self.advertiser.advertise(record).await;

        self.bus.publish(KernelEvent::ServerStarted { port: addr.port() });
        Ok(addr)
    }

    /// Destroy every client, close the listener, unadvertise. Idempotent.
    ///
    /// Returns how many clients were disconnected.
    pub async fn stop_server(&self) -> usize {
        let server = self.server.lock().await.take();
        let Some(server) = server else {
            return 0;
        };

        let clients = server.stop().await;
        self.log
            .info(format!("Server stopped ({clients} clients disconnected)"));
        self.advertiser
            .unadvertise(&self.config.responder.service_name)
            .await;
        self.bus.publish(KernelEvent::ServerStopped {
            clients_disconnected: clients,
        });
        clients
    }

    pub fn clear_logs(&self) {
        self.log.clear();
    }

    pub fn clear_processed(&self) {
        self.processed.clear();
    }

    // -- Projections -------------------------------------------------------

    pub async fn is_running(&self) -> bool {
        self.server
            .lock()
            .await
            .as_ref()
            .is_some_and(|s| s.is_running())
    }

    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.server.lock().await.as_ref().map(|s| s.local_addr())
    }

    pub async fn client_count(&self) -> usize {
        self.server
            .lock()
            .await
            .as_ref()
            .map_or(0, |s| s.client_count())
    }

    pub async fn clients(&self) -> Vec<ClientInfo> {
        self.server
            .lock()
            .await
            .as_ref()
            .map(|s| s.clients())
            .unwrap_or_default()
    }

    /// Last processed transactions, newest first.
    pub fn processed_transactions(&self) -> Vec<TransactionResponse> {
        self.processed.snapshot()
    }

    /// Activity log, newest first.
    pub fn logs(&self) -> Vec<LogEntry> {
        self.log.entries()
    }

    pub fn service_name(&self) -> &str {
        &self.config.responder.service_name
    }

    pub fn subscribe(&self) -> broadcast::Receiver<KernelEvent> {
        self.bus.subscribe()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }
}
