//! InitiatorLink: the Initiator's single outbound connection.
//!
//! An [`InitiatorLink`] owns at most one live session. A session is one TCP
//! connection, its [`InitiatorExchange`], and a driver task that feeds
//! inbound frames and deadlines into the exchange. Outcomes are delivered to
//! the caller that submitted the request and published on the link's event
//! channel.
//!
//! Connection lifecycle: `Disconnected -> Connecting -> Connected` (or back to
//! `Disconnected` on failure), `Connected -> Closing -> Disconnected` on a
//! local disconnect, and `Connected -> Disconnected` when the transport
//! closes or fails. A `disconnect` while `Connecting` cancels the dial.
//! There is no reconnection.

use crate::connection::{Connection, ConnectionEvent, WireError};
use crate::exchange::{ExchangeOutcome, FrameDisposition, InitiatorExchange};
use crate::message::encode_request;

use paylink_types::activity::ActivityLog;
use paylink_types::config::Framing;
use paylink_types::connection::ConnectionState;
use paylink_types::peer::PeerDescriptor;
use paylink_types::transaction::TransactionRequest;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, Notify};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::Instant;
use tracing::debug;

/// Capacity of the link event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Configuration for an InitiatorLink.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    pub framing: Framing,
    /// Per-request deadline; `None` waits indefinitely.
    pub response_timeout: Option<Duration>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            framing: Framing::Raw,
            response_timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Change notifications published by the link.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    StateChanged(ConnectionState),
    Outcome(ExchangeOutcome),
}

/// Handle to an outstanding request.
#[derive(Debug)]
pub struct PendingResponse {
    request_id: String,
    rx: oneshot::Receiver<ExchangeOutcome>,
}

impl PendingResponse {
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Wait for the request to settle.
    pub async fn outcome(self) -> ExchangeOutcome {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => ExchangeOutcome::ConnectionLost {
                request_id: self.request_id,
            },
        }
    }
}

/// One live connection and its exchange.
struct Session {
    id: u64,
    peer_name: String,
    connection: Arc<Connection>,
    exchange: Mutex<InitiatorExchange>,
    waiter: Mutex<Option<oneshot::Sender<ExchangeOutcome>>>,
    /// Woken when a new deadline is armed.
    wake: Notify,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    fn exchange(&self) -> std::sync::MutexGuard<'_, InitiatorExchange> {
        self.exchange.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn take_waiter(&self) -> Option<oneshot::Sender<ExchangeOutcome>> {
        self.waiter.lock().unwrap_or_else(|e| e.into_inner()).take()
    }

    fn take_driver(&self) -> Option<JoinHandle<()>> {
        self.driver.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

/// A dial in flight.
struct Dial {
    id: u64,
    peer_name: String,
    abort: AbortHandle,
}

struct LinkShared {
    config: LinkConfig,
    state: RwLock<ConnectionState>,
    /// Never held across the dial itself.
    session: tokio::sync::Mutex<Option<Arc<Session>>>,
    dial: Mutex<Option<Dial>>,
    next_session: AtomicU64,
    events: broadcast::Sender<LinkEvent>,
    log: ActivityLog,
}

impl LinkShared {
    fn dial(&self) -> std::sync::MutexGuard<'_, Option<Dial>> {
        self.dial.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Clear the pending dial if it is still `id`.
    fn finish_dial(&self, id: u64) -> bool {
        let mut dial = self.dial();
        if dial.as_ref().is_some_and(|d| d.id == id) {
            dial.take();
            true
        } else {
            false
        }
    }

    fn refuse(&self, peer_name: &str) -> WireError {
        let err = WireError::AlreadyConnected(peer_name.to_string());
        self.log.error(format!("Connection refused: {err}"));
        err
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = state.clone();
        let _ = self.events.send(LinkEvent::StateChanged(state));
    }

    fn settle(&self, session: &Session, outcome: ExchangeOutcome) {
        match &outcome {
            ExchangeOutcome::Approved(_)
            | ExchangeOutcome::Rejected(_)
            | ExchangeOutcome::ProtocolError(_) => {
                self.log.info(format!("Response received: {outcome}"));
            }
            ExchangeOutcome::TimedOut { request_id } => {
                self.log
                    .error(format!("No response for {request_id} before the deadline"));
            }
            ExchangeOutcome::ConnectionLost { request_id } => {
                self.log
                    .error(format!("Connection lost while awaiting {request_id}"));
            }
        }
        if let Some(waiter) = session.take_waiter() {
            let _ = waiter.send(outcome.clone());
        }
        let _ = self.events.send(LinkEvent::Outcome(outcome));
    }

    /// Take the session out if it is still `session_id`.
    async fn detach(&self, session_id: u64) -> Option<Arc<Session>> {
        let mut slot = self.session.lock().await;
        match slot.as_ref() {
            Some(current) if current.id == session_id => slot.take(),
            _ => None,
        }
    }
}

/// The Initiator's connection manager. Cloning shares the link.
#[derive(Clone)]
pub struct InitiatorLink {
    shared: Arc<LinkShared>,
}

impl InitiatorLink {
    pub fn new(config: LinkConfig, log: ActivityLog) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(LinkShared {
                config,
                state: RwLock::new(ConnectionState::disconnected()),
                session: tokio::sync::Mutex::new(None),
                dial: Mutex::new(None),
                next_session: AtomicU64::new(1),
                events,
                log,
            }),
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.shared
            .state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Subscribe to state changes and outcomes.
    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.shared.events.subscribe()
    }

    /// Open a connection to `peer`.
    ///
    /// Refused while another connection is open or being dialed. The dial
    /// runs in its own task so that [`disconnect`](Self::disconnect) can
    /// cancel it.
    pub async fn connect(&self, peer: &PeerDescriptor) -> Result<(), WireError> {
        let shared = &self.shared;
        let address = peer.address();

        let (dial_id, dial) = {
            let slot = shared.session.lock().await;
            if let Some(current) = slot.as_ref() {
                return Err(shared.refuse(&current.peer_name));
            }
            let mut pending = shared.dial();
            if let Some(other) = pending.as_ref() {
                return Err(shared.refuse(&other.peer_name));
            }

            shared.log.info(format!("Connecting to {} at {address}", peer.name));
            shared.set_state(ConnectionState::connecting(&peer.name, &address));

            let id = shared.next_session.fetch_add(1, Ordering::Relaxed);
            let host = peer.host.clone();
            let port = peer.port;
            let framing = shared.config.framing;
            let task = tokio::spawn(async move { Connection::connect(&host, port, framing).await });
            *pending = Some(Dial {
                id,
                peer_name: peer.name.clone(),
                abort: task.abort_handle(),
            });
            (id, task)
        };

        let result = dial.await;
        let mut slot = shared.session.lock().await;
        let ours = shared.finish_dial(dial_id);
        let (connection, events) = match result {
            Ok(Ok(pair)) if ours => pair,
            Ok(Ok((connection, _))) => {
                connection.destroy().await;
                return Err(WireError::ConnectCancelled { address });
            }
            Ok(Err(e)) => {
                if ours {
                    shared.log.error(format!("Connection error: {e}"));
                    shared.set_state(ConnectionState::disconnected());
                }
                return Err(e);
            }
            Err(_) => return Err(WireError::ConnectCancelled { address }),
        };

        let session = Arc::new(Session {
            id: dial_id,
            peer_name: peer.name.clone(),
            connection,
            exchange: Mutex::new(InitiatorExchange::new(shared.config.response_timeout)),
            waiter: Mutex::new(None),
            wake: Notify::new(),
            driver: Mutex::new(None),
        });
        let driver = tokio::spawn(drive(
            Arc::clone(shared),
            Arc::clone(&session),
            events,
        ));
        *session.driver.lock().unwrap_or_else(|e| e.into_inner()) = Some(driver);
        *slot = Some(session);

        shared.set_state(ConnectionState::connected(&peer.name, &address));
        shared.log.info(format!("Connected to {}", peer.name));
        Ok(())
    }

    /// Write `request` and return a handle to its outcome.
    ///
    /// Fails without touching any exchange state when no connection is open,
    /// and is refused while a previous request is still outstanding.
    pub async fn submit(&self, request: &TransactionRequest) -> Result<PendingResponse, WireError> {
        let shared = &self.shared;
        if !self.is_connected() {
            shared.log.error("Failed to send: no active connection");
            return Err(WireError::NotConnected);
        }
        let session = shared.session.lock().await.clone();
        let Some(session) = session else {
            shared.log.error("Failed to send: no active connection");
            return Err(WireError::NotConnected);
        };

        let bytes = encode_request(request, shared.config.framing)?;

        if let Err(e) = session.exchange().begin(&request.id, Instant::now()) {
            shared.log.error(format!("Failed to send: {e}"));
            return Err(e);
        }
        let (tx, rx) = oneshot::channel();
        *session.waiter.lock().unwrap_or_else(|e| e.into_inner()) = Some(tx);
        session.wake.notify_one();

        if let Err(e) = session.connection.write_raw(&bytes).await {
            session.exchange().abandon();
            session.take_waiter();
            shared.log.error(format!("Failed to send: {e}"));
            return Err(e);
        }
        debug!(request = %request.id, "request written");

        Ok(PendingResponse {
            request_id: request.id.clone(),
            rx,
        })
    }

    /// Close the connection, or cancel a dial in flight. Idempotent.
    ///
    /// An outstanding request settles as connection-lost.
    pub async fn disconnect(&self) {
        let shared = &self.shared;
        let dial = shared.dial().take();
        if let Some(dial) = dial {
            dial.abort.abort();
            shared.set_state(ConnectionState::disconnected());
            shared
                .log
                .info(format!("Connection attempt to {} cancelled", dial.peer_name));
            return;
        }

        let session = shared.session.lock().await.take();
        let Some(session) = session else {
            return;
        };

        shared.set_state(self.state().closing());
        if let Some(driver) = session.take_driver() {
            driver.abort();
        }
        session.connection.destroy().await;
        let lost = session.exchange().on_connection_lost();
        if let Some(outcome) = lost {
            shared.settle(&session, outcome);
        }
        shared.set_state(ConnectionState::disconnected());
        shared.log.info("Disconnected");
    }
}

impl InitiatorLink {
    /// Synchronous teardown for drop paths: cancel a dial, stop the driver,
    /// and close the socket without settling anything.
    pub fn close_now(&self) {
        let shared = &self.shared;
        if let Some(dial) = shared.dial().take() {
            dial.abort.abort();
        }
        match shared.session.try_lock() {
            Ok(mut slot) => {
                if let Some(session) = slot.take() {
                    if let Some(driver) = session.take_driver() {
                        driver.abort();
                    }
                    session.connection.close_now();
                }
            }
            Err(_) => debug!("session busy during close_now"),
        }
        shared.set_state(ConnectionState::disconnected());
    }
}

/// Session driver: inbound frames, deadlines, and remote teardown.
async fn drive(
    shared: Arc<LinkShared>,
    session: Arc<Session>,
    mut events: mpsc::Receiver<ConnectionEvent>,
) {
    loop {
        let deadline = session.exchange().deadline();
        let expiry = async {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            event = events.recv() => match event {
                Some(ConnectionEvent::Frame(body)) => on_frame(&shared, &session, &body),
                Some(ConnectionEvent::Invalid(reason)) => {
                    shared.log.error(format!("Failed to process response: {reason}"));
                }
                Some(ConnectionEvent::Error(reason)) => {
                    shared.log.error(format!("Connection error: {reason}"));
                }
                Some(ConnectionEvent::Closed) | None => break,
            },
            _ = expiry => {
                let expired = session.exchange().on_deadline(Instant::now());
                if let Some(outcome) = expired {
                    shared.settle(&session, outcome);
                }
            }
            _ = session.wake.notified() => {}
        }
    }

    // The transport ended on its own; a local disconnect aborts this task
    // before it gets here.
    if shared.detach(session.id).await.is_none() {
        return;
    }
    session.take_driver();
    session.connection.destroy().await;
    let lost = session.exchange().on_connection_lost();
    if let Some(outcome) = lost {
        shared.settle(&session, outcome);
    }
    shared.set_state(ConnectionState::disconnected());
    shared.log.info("Connection closed");
}

fn on_frame(shared: &LinkShared, session: &Session, body: &[u8]) {
    let disposition = session.exchange().on_frame(body);
    match disposition {
        FrameDisposition::Completed(outcome) => shared.settle(session, outcome),
        FrameDisposition::Malformed(e) => {
            shared.log.error(format!("Failed to process response: {e}"));
        }
        FrameDisposition::Mismatched { expected, received } => {
            shared.log.warn(format!(
                "Ignoring response for {received} while awaiting {expected}"
            ));
        }
        FrameDisposition::Unsolicited(resp) => {
            shared
                .log
                .warn(format!("Ignoring unsolicited response {}", resp.id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{encode_frame, encode_response, Decoded, FrameDecoder};
    use paylink_types::connection::ConnectionPhase;
    use paylink_types::transaction::TransactionResponse;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn link(timeout: Option<Duration>) -> InitiatorLink {
        InitiatorLink::new(
            LinkConfig {
                framing: Framing::LengthPrefixed,
                response_timeout: timeout,
            },
            ActivityLog::new("test"),
        )
    }

    async fn listener() -> (TcpListener, PeerDescriptor) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let peer = PeerDescriptor::new("PaymentDevice-B", "127.0.0.1", port, Vec::new());
        (listener, peer)
    }

    async fn read_request(stream: &mut TcpStream) -> TransactionRequest {
        let mut decoder = FrameDecoder::new(Framing::LengthPrefixed);
        let mut buf = [0u8; 1024];
        loop {
            let n = stream.read(&mut buf).await.unwrap();
            assert!(n > 0);
            if let Some(Decoded::Frame(frame)) = decoder.push(&buf[..n]).into_iter().next() {
                return serde_json::from_slice(&frame).unwrap();
            }
        }
    }

    async fn reply(stream: &mut TcpStream, resp: &TransactionResponse) {
        stream
            .write_all(&encode_response(resp, Framing::LengthPrefixed).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_submit_without_connection() {
        let link = link(None);
        let req = TransactionRequest::new("PAY_1", 1.0, "x");
        assert!(matches!(
            link.submit(&req).await,
            Err(WireError::NotConnected)
        ));
        assert_eq!(link.state().phase, ConnectionPhase::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_failure_returns_to_disconnected() {
        let (listener, peer) = listener().await;
        drop(listener);
        let link = link(None);
        assert!(matches!(
            link.connect(&peer).await,
            Err(WireError::Connect { .. })
        ));
        assert_eq!(link.state(), ConnectionState::disconnected());
    }

    #[tokio::test]
    async fn test_connect_twice_refused() {
        let (listener, peer) = listener().await;
        let link = link(None);
        link.connect(&peer).await.unwrap();
        let _server = listener.accept().await.unwrap();
        let state = link.state();
        assert!(state.is_connected());
        assert_eq!(state.peer_name.as_deref(), Some("PaymentDevice-B"));

        assert!(matches!(
            link.connect(&peer).await,
            Err(WireError::AlreadyConnected(_))
        ));
        assert!(link.is_connected());
    }

    #[tokio::test]
    async fn test_round_trip_skips_mismatched_response() {
        let (listener, peer) = listener().await;
        let link = link(None);
        link.connect(&peer).await.unwrap();
        let (mut server, _) = listener.accept().await.unwrap();

        let pending = link
            .submit(&TransactionRequest::new("PAY_7", 42.0, "coffee"))
            .await
            .unwrap();
        let req = read_request(&mut server).await;
        assert_eq!(req.id, "PAY_7");

        reply(&mut server, &TransactionResponse::approved("PAY_6", "stale")).await;
        reply(&mut server, &TransactionResponse::rejected("PAY_7", "no funds")).await;

        match pending.outcome().await {
            ExchangeOutcome::Rejected(r) => assert_eq!(r.id, "PAY_7"),
            other => panic!("Expected Rejected, got {other:?}"),
        }
        assert!(link.is_connected());
    }

    #[tokio::test]
    async fn test_second_submit_while_pending_refused() {
        let (listener, peer) = listener().await;
        let link = link(None);
        link.connect(&peer).await.unwrap();
        let _server = listener.accept().await.unwrap();

        let _pending = link
            .submit(&TransactionRequest::new("PAY_1", 1.0, "a"))
            .await
            .unwrap();
        assert!(matches!(
            link.submit(&TransactionRequest::new("PAY_2", 2.0, "b")).await,
            Err(WireError::RequestPending(id)) if id == "PAY_1"
        ));
    }

    #[tokio::test]
    async fn test_deadline_yields_timed_out() {
        let (listener, peer) = listener().await;
        let link = link(Some(Duration::from_millis(100)));
        link.connect(&peer).await.unwrap();
        let _server = listener.accept().await.unwrap();

        let pending = link
            .submit(&TransactionRequest::new("PAY_1", 1.0, "slow"))
            .await
            .unwrap();
        assert_eq!(
            pending.outcome().await,
            ExchangeOutcome::TimedOut {
                request_id: "PAY_1".to_string()
            }
        );

        // Idle again: a new request is accepted
        assert!(link
            .submit(&TransactionRequest::new("PAY_2", 1.0, "next"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_remote_close_while_waiting() {
        let (listener, peer) = listener().await;
        let link = link(None);
        let mut events = link.subscribe();
        link.connect(&peer).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();

        let pending = link
            .submit(&TransactionRequest::new("PAY_1", 1.0, "x"))
            .await
            .unwrap();
        drop(server);

        assert_eq!(
            pending.outcome().await,
            ExchangeOutcome::ConnectionLost {
                request_id: "PAY_1".to_string()
            }
        );

        // Connecting, Connected, Outcome, then Disconnected
        let mut saw_disconnect = false;
        while let Ok(Ok(event)) =
            tokio::time::timeout(Duration::from_secs(1), events.recv()).await
        {
            if event == LinkEvent::StateChanged(ConnectionState::disconnected()) {
                saw_disconnect = true;
                break;
            }
        }
        assert!(saw_disconnect);
        assert!(!link.is_connected());
    }

    #[tokio::test]
    async fn test_disconnect_settles_pending_and_is_idempotent() {
        let (listener, peer) = listener().await;
        let link = link(None);
        link.connect(&peer).await.unwrap();
        let _server = listener.accept().await.unwrap();

        let pending = link
            .submit(&TransactionRequest::new("PAY_1", 1.0, "x"))
            .await
            .unwrap();
        link.disconnect().await;
        link.disconnect().await;

        assert!(matches!(
            pending.outcome().await,
            ExchangeOutcome::ConnectionLost { .. }
        ));
        assert_eq!(link.state(), ConnectionState::disconnected());
    }

    #[tokio::test]
    async fn test_malformed_response_keeps_waiting() {
        let (listener, peer) = listener().await;
        let link = link(None);
        link.connect(&peer).await.unwrap();
        let (mut server, _) = listener.accept().await.unwrap();

        let pending = link
            .submit(&TransactionRequest::new("PAY_1", 1.0, "x"))
            .await
            .unwrap();
        read_request(&mut server).await;
        server
            .write_all(&encode_frame(b"not json", Framing::LengthPrefixed))
            .await
            .unwrap();
        reply(&mut server, &TransactionResponse::approved("PAY_1", "ok")).await;

        assert!(pending.outcome().await.is_approved());
    }

    /// A listener whose accept queue is full, so further dials hang.
    async fn saturated_listener() -> (TcpListener, Vec<TcpStream>, PeerDescriptor) {
        let socket = tokio::net::TcpSocket::new_v4().unwrap();
        socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let listener = socket.listen(0).unwrap();
        let addr = listener.local_addr().unwrap();
        let mut fillers = Vec::new();
        for _ in 0..4 {
            match tokio::time::timeout(Duration::from_millis(200), TcpStream::connect(addr)).await {
                Ok(Ok(stream)) => fillers.push(stream),
                _ => break,
            }
        }
        let peer = PeerDescriptor::new("Busy", "127.0.0.1", addr.port(), Vec::new());
        (listener, fillers, peer)
    }

    async fn wait_for_phase(link: &InitiatorLink, phase: ConnectionPhase) {
        for _ in 0..100 {
            if link.state().phase == phase {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("link never reached {phase:?}, is {:?}", link.state().phase);
    }

    #[test]
    fn test_default_framing_is_raw() {
        assert_eq!(LinkConfig::default().framing, Framing::Raw);
    }

    #[tokio::test]
    async fn test_submit_while_connecting_fails_fast() {
        let (_listener, _fillers, peer) = saturated_listener().await;
        let link = link(None);
        let dialer = link.clone();
        let dial = tokio::spawn(async move { dialer.connect(&peer).await });
        wait_for_phase(&link, ConnectionPhase::Connecting).await;

        let req = TransactionRequest::new("PAY_1", 1.0, "early");
        let result = tokio::time::timeout(Duration::from_millis(500), link.submit(&req))
            .await
            .expect("submit waited on the dial");
        assert!(matches!(result, Err(WireError::NotConnected)));

        link.disconnect().await;
        let _ = dial.await;
    }

    #[tokio::test]
    async fn test_disconnect_cancels_dial() {
        let (_listener, _fillers, peer) = saturated_listener().await;
        let link = link(None);
        let dialer = link.clone();
        let second = peer.clone();
        let dial = tokio::spawn(async move { dialer.connect(&peer).await });
        wait_for_phase(&link, ConnectionPhase::Connecting).await;

        // Only one dial at a time
        assert!(matches!(
            link.connect(&second).await,
            Err(WireError::AlreadyConnected(name)) if name == "Busy"
        ));

        tokio::time::timeout(Duration::from_millis(500), link.disconnect())
            .await
            .expect("disconnect waited on the dial");
        assert_eq!(link.state(), ConnectionState::disconnected());
        assert!(matches!(
            dial.await.unwrap(),
            Err(WireError::ConnectCancelled { .. })
        ));
    }

    #[tokio::test]
    async fn test_close_now_releases_socket() {
        let (listener, peer) = listener().await;
        let link = link(None);
        link.connect(&peer).await.unwrap();
        let (mut server, _) = listener.accept().await.unwrap();

        link.close_now();
        assert!(!link.is_connected());
        let mut buf = [0u8; 8];
        let n = tokio::time::timeout(Duration::from_secs(2), server.read(&mut buf))
            .await
            .expect("socket stayed open")
            .unwrap_or(0);
        assert_eq!(n, 0);
    }
}
