//! A single TCP connection and its inbound event stream.
//!
//! [`Connection`] owns the write half of a stream; a spawned reader task owns
//! the read half, runs the frame decoder, and turns transport activity into
//! [`ConnectionEvent`]s on an mpsc channel. Both Initiator and Responder
//! connections use this type; what differs is who consumes the events.

use crate::message::{encode_frame, Decoded, FrameDecoder};

use bytes::Bytes;
use paylink_types::config::Framing;
use paylink_types::error::PayLinkError;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Errors from the wire protocol layer.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("Frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: u32, max: u32 },
    #[error("Connect to {address} failed: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Connect to {address} was cancelled")]
    ConnectCancelled { address: String },
    #[error("Bind on {address} failed: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("No active connection")]
    NotConnected,
    #[error("Already connected to {0}")]
    AlreadyConnected(String),
    #[error("Request {0} is still awaiting a response")]
    RequestPending(String),
}

impl From<WireError> for PayLinkError {
    fn from(err: WireError) -> Self {
        match err {
            WireError::Io(e) => PayLinkError::Io(e),
            WireError::Json(e) => PayLinkError::Decode(e.to_string()),
            WireError::ConnectionClosed | WireError::FrameTooLarge { .. } => {
                PayLinkError::Transport(err.to_string())
            }
            WireError::Connect { address, source } => PayLinkError::Connect {
                address,
                reason: source.to_string(),
            },
            WireError::ConnectCancelled { address } => PayLinkError::Connect {
                address,
                reason: "cancelled".to_string(),
            },
            WireError::Bind { address, source } => PayLinkError::ServerBind {
                address,
                reason: source.to_string(),
            },
            WireError::NotConnected => PayLinkError::NotConnected,
            WireError::AlreadyConnected(peer) => PayLinkError::AlreadyConnected(peer),
            WireError::RequestPending(id) => PayLinkError::RequestPending(id),
        }
    }
}

/// Bytes requested from the socket per read.
const READ_CHUNK: usize = 16 * 1024;

/// Capacity of the per-connection event channel.
const EVENT_BUFFER: usize = 64;

/// Transport activity on one connection, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// One complete message body.
    Frame(Bytes),
    /// Bytes that could not be framed. They were discarded and the stream
    /// stays open.
    Invalid(String),
    /// The transport failed. Always followed by `Closed`.
    Error(String),
    /// The peer closed the stream, or the stream failed.
    Closed,
}

/// Write side of an established connection plus the handle of its reader.
#[derive(Debug)]
pub struct Connection {
    remote_addr: SocketAddr,
    framing: Framing,
    writer: tokio::sync::Mutex<Option<OwnedWriteHalf>>,
    reader_task: Mutex<Option<JoinHandle<()>>>,
}

impl Connection {
    /// Dial `host:port` and start reading.
    pub async fn connect(
        host: &str,
        port: u16,
        framing: Framing,
    ) -> Result<(Arc<Self>, mpsc::Receiver<ConnectionEvent>), WireError> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|source| WireError::Connect {
                address: format!("{host}:{port}"),
                source,
            })?;
        Self::from_stream(stream, framing)
    }

    /// Wrap an accepted or dialed stream and start reading.
    pub fn from_stream(
        stream: TcpStream,
        framing: Framing,
    ) -> Result<(Arc<Self>, mpsc::Receiver<ConnectionEvent>), WireError> {
        let remote_addr = stream.peer_addr()?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!(peer = %remote_addr, "set_nodelay failed: {e}");
        }
        let (reader, writer) = stream.into_split();
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        let reader_task = tokio::spawn(read_loop(reader, framing, tx));

        let conn = Arc::new(Self {
            remote_addr,
            framing,
            writer: tokio::sync::Mutex::new(Some(writer)),
            reader_task: Mutex::new(Some(reader_task)),
        });
        Ok((conn, rx))
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Frame a JSON body and write it.
    pub async fn write_body(&self, body: &[u8]) -> Result<(), WireError> {
        self.write_raw(&encode_frame(body, self.framing)).await
    }

    /// Write bytes that are already framed.
    pub async fn write_raw(&self, bytes: &[u8]) -> Result<(), WireError> {
        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(WireError::ConnectionClosed)?;
        writer.write_all(bytes).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Whether [`destroy`](Self::destroy) has not run yet.
    pub async fn is_open(&self) -> bool {
        self.writer.lock().await.is_some()
    }

    /// Tear the connection down. Safe to call any number of times.
    ///
    /// Stops the reader (the event channel then closes without a `Closed`
    /// event) and shuts down the write half.
    pub async fn destroy(&self) {
        let reader = self
            .reader_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(task) = reader {
            task.abort();
        }
        let writer = self.writer.lock().await.take();
        if let Some(mut writer) = writer {
            if let Err(e) = writer.shutdown().await {
                debug!(peer = %self.remote_addr, "shutdown after destroy failed: {e}");
            }
        }
    }
}

impl Connection {
    /// Synchronous teardown for drop paths: stop the reader and drop the
    /// write half, which closes the socket.
    pub fn close_now(&self) {
        let reader = self
            .reader_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(task) = reader {
            task.abort();
        }
        match self.writer.try_lock() {
            Ok(mut writer) => {
                writer.take();
            }
            Err(_) => debug!(peer = %self.remote_addr, "writer busy during close_now"),
        }
    }
}

/// Reader task: socket bytes in, events out.
async fn read_loop(
    mut reader: OwnedReadHalf,
    framing: Framing,
    tx: mpsc::Sender<ConnectionEvent>,
) {
    let mut decoder = FrameDecoder::new(framing);
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        let n = match reader.read(&mut chunk).await {
            Ok(0) => {
                let _ = tx.send(ConnectionEvent::Closed).await;
                return;
            }
            Ok(n) => n,
            Err(e) => {
                let _ = tx.send(ConnectionEvent::Error(e.to_string())).await;
                let _ = tx.send(ConnectionEvent::Closed).await;
                return;
            }
        };
        for item in decoder.push(&chunk[..n]) {
            let event = match item {
                Decoded::Frame(body) => ConnectionEvent::Frame(body),
                Decoded::Invalid(reason) => ConnectionEvent::Invalid(reason),
            };
            if tx.send(event).await.is_err() {
                return;
            }
        }
    }
}
