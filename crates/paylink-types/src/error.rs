//! Shared error types for the PayLink system.

use thiserror::Error;

/// Top-level error type shared across PayLink crates.
///
/// Each variant maps to one class of failure in the exchange. All of them are
/// caught at the boundary where they occur and written to the activity log;
/// none is allowed to take the process down.
#[derive(Error, Debug)]
pub enum PayLinkError {
    /// The discovery transport could not be initialized.
    #[error("Discovery unavailable: {0}")]
    DiscoveryInit(String),

    /// The discovery transport reported an error while browsing or advertising.
    #[error("Discovery error: {0}")]
    DiscoveryEvent(String),

    /// Opening a connection to a peer failed.
    #[error("Connect failed to {address}: {reason}")]
    Connect {
        /// `host:port` that was dialed.
        address: String,
        /// Why it failed.
        reason: String,
    },

    /// A send was attempted with no active connection.
    #[error("No active connection")]
    NotConnected,

    /// A connect was attempted while a connection is already open.
    #[error("Already connected to {0}")]
    AlreadyConnected(String),

    /// A request is already awaiting its response on this connection.
    #[error("Request {0} is still awaiting a response")]
    RequestPending(String),

    /// An established connection failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// An inbound payload could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The listening socket could not be bound.
    #[error("Server bind failed on {address}: {reason}")]
    ServerBind {
        /// Address the server tried to bind.
        address: String,
        /// Why it failed.
        reason: String,
    },

    /// A single Responder client failed; other clients are unaffected.
    #[error("Client {client_id} failed: {reason}")]
    ClientIsolated {
        /// Registry id of the failed client.
        client_id: u64,
        /// Why it failed.
        reason: String,
    },

    /// A configuration value was invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Alias for Result with PayLinkError.
pub type PayLinkResult<T> = Result<T, PayLinkError>;
