//! ResponderServer - TCP listener for inbound transaction requests.
//!
//! A [`ResponderServer`] binds a local TCP listener and accepts any number of
//! Initiator connections. Each accepted connection gets its own handler task
//! that decodes requests, hands them to the [`RequestHandler`], and writes
//! the reply on the same connection. A failing client only ever tears down
//! itself; the listener and the other clients keep running.
//!
//! The [`RequestHandler`] trait abstracts the business decision so the wire
//! layer never contains policy.

use crate::connection::{Connection, ConnectionEvent, WireError};
use crate::exchange::{handle_inbound, Inbound};
use crate::message::encode_response;
use crate::registry::{ClientInfo, ClientRegistry};

use paylink_types::activity::ActivityLog;
use paylink_types::config::Framing;
use paylink_types::ring::BoundedRing;
use paylink_types::transaction::{TransactionRequest, TransactionResponse};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Number of processed transactions kept for display.
pub const PROCESSED_LOG_CAPACITY: usize = 10;

/// Trait for the kernel to decide inbound transactions.
///
/// Called once per decoded request. Must always return a response whose
/// `id` equals the request's id and must not panic.
pub trait RequestHandler: Send + Sync + 'static {
    fn process(&self, request: &TransactionRequest) -> TransactionResponse;
}

/// Configuration for a ResponderServer.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind.
    pub bind_host: String,
    /// Port to bind; 0 picks an ephemeral port.
    pub port: u16,
    pub framing: Framing,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: paylink_types::config::DEFAULT_PORT,
            framing: Framing::Raw,
        }
    }
}

/// State shared by the accept loop and every client task.
struct Shared {
    framing: Framing,
    handler: Arc<dyn RequestHandler>,
    clients: ClientRegistry,
    processed: BoundedRing<TransactionResponse>,
    log: ActivityLog,
    running: AtomicBool,
}

/// The listening side of the exchange.
pub struct ResponderServer {
    shared: Arc<Shared>,
    /// Actual bound address (useful when binding to port 0).
    local_addr: SocketAddr,
    accept_task: Mutex<Option<JoinHandle<()>>>,
}

impl ResponderServer {
    /// Bind and start accepting.
    ///
    /// `processed` receives every successfully processed response, newest
    /// first. Nothing is spawned if the bind fails.
    pub async fn start(
        config: ServerConfig,
        handler: Arc<dyn RequestHandler>,
        processed: BoundedRing<TransactionResponse>,
        log: ActivityLog,
    ) -> Result<Arc<Self>, WireError> {
        let address = format!("{}:{}", config.bind_host, config.port);
        let listener = TcpListener::bind((config.bind_host.as_str(), config.port))
            .await
            .map_err(|source| WireError::Bind {
                address: address.clone(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        log.info(format!("Server listening on port {}", local_addr.port()));

        let shared = Arc::new(Shared {
            framing: config.framing,
            handler,
            clients: ClientRegistry::new(),
            processed,
            log,
            running: AtomicBool::new(true),
        });

        let accept_task = tokio::spawn(accept_loop(listener, Arc::clone(&shared)));

        Ok(Arc::new(Self {
            shared,
            local_addr,
            accept_task: Mutex::new(Some(accept_task)),
        }))
    }

    /// Get the actual bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    pub fn client_count(&self) -> usize {
        self.shared.clients.count()
    }

    pub fn clients(&self) -> Vec<ClientInfo> {
        self.shared.clients.clients()
    }

    /// Destroy every client, then close the listener. Idempotent.
    ///
    /// Returns the number of clients that were destroyed.
    pub async fn stop(&self) -> usize {
        if !self.shared.running.swap(false, Ordering::SeqCst) {
            return 0;
        }

        let mut destroyed = destroy_all(&self.shared.clients).await;

        let accept = self
            .accept_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(task) = accept {
            task.abort();
        }
        // A client registered while the first pass ran
        destroyed += destroy_all(&self.shared.clients).await;
        destroyed
    }
}

impl Drop for ResponderServer {
    /// Dropping a server that was never stopped still releases the listener
    /// and every client socket.
    fn drop(&mut self) {
        if !self.shared.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let accept = self
            .accept_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(task) = accept {
            task.abort();
        }
        for entry in self.shared.clients.drain() {
            if let Some(task) = entry.task {
                task.abort();
            }
            entry.connection.close_now();
        }
        debug!(addr = %self.local_addr, "server dropped without stop");
    }
}

/// Tear down every registered client and return how many there were.
async fn destroy_all(clients: &ClientRegistry) -> usize {
    let entries = clients.drain();
    let count = entries.len();
    for entry in entries {
        if let Some(task) = entry.task {
            task.abort();
        }
        entry.connection.destroy().await;
        debug!(client = entry.info.id, "destroyed client {}", entry.info.remote_address);
    }
    count
}

/// Accept loop: runs in a spawned task until aborted.
async fn accept_loop(listener: TcpListener, shared: Arc<Shared>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                if !shared.running.load(Ordering::SeqCst) {
                    drop(stream);
                    continue;
                }
                let (conn, events) = match Connection::from_stream(stream, shared.framing) {
                    Ok(pair) => pair,
                    Err(e) => {
                        shared
                            .log
                            .error(format!("Failed to set up client {addr}: {e}"));
                        continue;
                    }
                };
                let id = shared.clients.register(Arc::clone(&conn));
                shared.log.info(format!(
                    "Client connected: {addr} ({} connected)",
                    shared.clients.count()
                ));
                let task = tokio::spawn(serve_client(id, conn, events, Arc::clone(&shared)));
                shared.clients.attach_task(id, task.abort_handle());
            }
            Err(e) => {
                error!("accept error: {}", e);
                shared.log.error(format!("Server error: {e}"));
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            }
        }
    }
}

/// Per-client loop: one reply per inbound frame until the client goes away.
async fn serve_client(
    id: u64,
    conn: Arc<Connection>,
    mut events: mpsc::Receiver<ConnectionEvent>,
    shared: Arc<Shared>,
) {
    while let Some(event) = events.recv().await {
        let inbound = match event {
            ConnectionEvent::Frame(body) => handle_inbound(&body, &*shared.handler),
            ConnectionEvent::Invalid(error) => Inbound::Malformed {
                error,
                response: TransactionResponse::protocol_error(),
            },
            ConnectionEvent::Error(reason) => {
                shared.log.error(format!("Client error: {reason}"));
                continue;
            }
            ConnectionEvent::Closed => break,
        };
        if let Err(e) = reply(&conn, inbound, &shared).await {
            let err = paylink_types::error::PayLinkError::ClientIsolated {
                client_id: id,
                reason: e.to_string(),
            };
            shared.log.error(err.to_string());
            break;
        }
    }

    conn.destroy().await;
    if shared.clients.remove(id).is_some() {
        shared.log.info(format!(
            "Client disconnected ({} connected)",
            shared.clients.count()
        ));
    }
}

/// Log one inbound item and write its reply.
async fn reply(conn: &Connection, inbound: Inbound, shared: &Shared) -> Result<(), WireError> {
    match &inbound {
        Inbound::Processed { request, .. } => {
            shared.log.info(format!(
                "Payment received: {} - {}",
                request.amount, request.description
            ));
        }
        Inbound::Malformed { error, .. } => {
            shared.log.error(format!("Failed to process data: {error}"));
        }
    }

    let bytes = encode_response(inbound.response(), shared.framing)?;
    conn.write_raw(&bytes).await?;

    if let Inbound::Processed { response, .. } = inbound {
        shared.processed.push(response);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{decode_response, encode_request, Decoded, FrameDecoder};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    /// Approves everything.
    struct ApproveAll;

    impl RequestHandler for ApproveAll {
        fn process(&self, request: &TransactionRequest) -> TransactionResponse {
            TransactionResponse::approved(&request.id, "approved")
        }
    }

    async fn start_server() -> (Arc<ResponderServer>, BoundedRing<TransactionResponse>) {
        start_server_with(Framing::LengthPrefixed).await
    }

    async fn start_server_with(
        framing: Framing,
    ) -> (Arc<ResponderServer>, BoundedRing<TransactionResponse>) {
        let processed = BoundedRing::new(PROCESSED_LOG_CAPACITY);
        let config = ServerConfig {
            bind_host: "127.0.0.1".to_string(),
            port: 0,
            framing,
        };
        let server = ResponderServer::start(
            config,
            Arc::new(ApproveAll),
            processed.clone(),
            ActivityLog::new("test"),
        )
        .await
        .unwrap();
        (server, processed)
    }

    async fn read_response(stream: &mut TcpStream) -> TransactionResponse {
        read_response_with(stream, Framing::LengthPrefixed).await
    }

    async fn read_response_with(stream: &mut TcpStream, framing: Framing) -> TransactionResponse {
        let mut decoder = FrameDecoder::new(framing);
        let mut buf = [0u8; 1024];
        loop {
            let n = tokio::time::timeout(Duration::from_secs(2), stream.read(&mut buf))
                .await
                .expect("no reply within 2s")
                .unwrap();
            assert!(n > 0, "server closed the connection");
            if let Some(Decoded::Frame(frame)) = decoder.push(&buf[..n]).into_iter().next() {
                return decode_response(&frame).unwrap();
            }
        }
    }

    async fn wait_for_count(server: &ResponderServer, expected: usize) {
        for _ in 0..100 {
            if server.client_count() == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("client count never reached {expected}, is {}", server.client_count());
    }

    #[tokio::test]
    async fn test_request_gets_correlated_reply() {
        let (server, processed) = start_server().await;
        let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();

        let req = TransactionRequest::new("PAY_1", 100.0, "test");
        stream
            .write_all(&encode_request(&req, Framing::LengthPrefixed).unwrap())
            .await
            .unwrap();

        let resp = read_response(&mut stream).await;
        assert_eq!(resp.id, "PAY_1");
        assert!(resp.approved);
        assert_eq!(processed.len(), 1);
        assert_eq!(processed.latest().unwrap().id, "PAY_1");
    }

    #[tokio::test]
    async fn test_malformed_request_keeps_connection_open() {
        let (server, processed) = start_server().await;
        let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();

        stream
            .write_all(&crate::message::encode_frame(b"garbage", Framing::LengthPrefixed))
            .await
            .unwrap();
        let resp = read_response(&mut stream).await;
        assert_eq!(resp.id, "ERROR");
        assert!(!resp.approved);
        assert!(processed.is_empty());

        // Same connection still serves a valid request afterwards
        let req = TransactionRequest::new("PAY_2", 5.0, "after error");
        stream
            .write_all(&encode_request(&req, Framing::LengthPrefixed).unwrap())
            .await
            .unwrap();
        assert_eq!(read_response(&mut stream).await.id, "PAY_2");
        assert_eq!(server.client_count(), 1);
    }

    #[tokio::test]
    async fn test_client_close_is_isolated() {
        let (server, _processed) = start_server().await;
        let first = TcpStream::connect(server.local_addr()).await.unwrap();
        let mut second = TcpStream::connect(server.local_addr()).await.unwrap();
        wait_for_count(&server, 2).await;

        drop(first);
        wait_for_count(&server, 1).await;

        let req = TransactionRequest::new("PAY_3", 1.0, "still here");
        second
            .write_all(&encode_request(&req, Framing::LengthPrefixed).unwrap())
            .await
            .unwrap();
        assert_eq!(read_response(&mut second).await.id, "PAY_3");
    }

    #[tokio::test]
    async fn test_stop_destroys_all_clients() {
        let (server, _processed) = start_server().await;
        let mut streams = Vec::new();
        for _ in 0..5 {
            streams.push(TcpStream::connect(server.local_addr()).await.unwrap());
        }
        wait_for_count(&server, 5).await;

        assert_eq!(server.stop().await, 5);
        assert_eq!(server.client_count(), 0);
        assert!(!server.is_running());

        // Clients observe EOF
        for stream in &mut streams {
            let mut buf = [0u8; 16];
            let n = stream.read(&mut buf).await.unwrap_or(0);
            assert_eq!(n, 0);
        }

        // Second stop is a no-op
        assert_eq!(server.stop().await, 0);
    }

    #[tokio::test]
    async fn test_bind_conflict_reports_bind_error() {
        let (server, _processed) = start_server().await;
        let config = ServerConfig {
            bind_host: "127.0.0.1".to_string(),
            port: server.local_addr().port(),
            framing: Framing::LengthPrefixed,
        };
        let result = ResponderServer::start(
            config,
            Arc::new(ApproveAll),
            BoundedRing::new(PROCESSED_LOG_CAPACITY),
            ActivityLog::new("test"),
        )
        .await;
        assert!(matches!(result, Err(WireError::Bind { .. })));
    }

    #[tokio::test]
    async fn test_default_framing_is_raw() {
        assert_eq!(ServerConfig::default().framing, Framing::Raw);
    }

    #[tokio::test]
    async fn test_raw_garbage_gets_one_error_reply() {
        let (server, processed) = start_server_with(Framing::Raw).await;
        let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();

        stream.write_all(b"not json at all").await.unwrap();
        let resp = read_response_with(&mut stream, Framing::Raw).await;
        assert_eq!(resp.id, "ERROR");
        assert!(!resp.approved);
        assert_eq!(resp.message, "Failed to process payment");

        stream.write_all(b"xx").await.unwrap();
        assert_eq!(read_response_with(&mut stream, Framing::Raw).await.id, "ERROR");

        // Plain JSON request on the same connection
        stream
            .write_all(br#"{"id":"PAY_1","amount":100,"description":"coffee","timestamp":1}"#)
            .await
            .unwrap();
        let resp = read_response_with(&mut stream, Framing::Raw).await;
        assert_eq!(resp.id, "PAY_1");
        assert!(resp.approved);
        assert_eq!(processed.len(), 1);
        assert_eq!(server.client_count(), 1);
    }

    #[tokio::test]
    async fn test_unframed_input_under_length_prefix_gets_error_reply() {
        let (server, _processed) = start_server().await;
        let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();

        stream.write_all(b"not json at all").await.unwrap();
        assert_eq!(read_response(&mut stream).await.id, "ERROR");

        // Resynchronized: a framed request still works
        let req = TransactionRequest::new("PAY_9", 9.0, "after resync");
        stream
            .write_all(&encode_request(&req, Framing::LengthPrefixed).unwrap())
            .await
            .unwrap();
        assert_eq!(read_response(&mut stream).await.id, "PAY_9");
        assert_eq!(server.client_count(), 1);
    }

    #[tokio::test]
    async fn test_processed_log_keeps_newest_ten() {
        let (server, processed) = start_server().await;
        let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();

        for i in 0..12 {
            let req = TransactionRequest::new(format!("PAY_{i}"), i as f64, "bulk");
            stream
                .write_all(&encode_request(&req, Framing::LengthPrefixed).unwrap())
                .await
                .unwrap();
            assert_eq!(read_response(&mut stream).await.id, format!("PAY_{i}"));
        }

        let ids: Vec<String> = processed.snapshot().into_iter().map(|r| r.id).collect();
        let expected: Vec<String> = (2..12).rev().map(|i| format!("PAY_{i}")).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_drop_without_stop_closes_clients() {
        let (server, _processed) = start_server().await;
        let addr = server.local_addr();
        let mut stream = TcpStream::connect(addr).await.unwrap();
        wait_for_count(&server, 1).await;

        drop(server);

        let mut buf = [0u8; 8];
        let n = tokio::time::timeout(Duration::from_secs(2), stream.read(&mut buf))
            .await
            .expect("client socket stayed open")
            .unwrap_or(0);
        assert_eq!(n, 0);
    }
}
