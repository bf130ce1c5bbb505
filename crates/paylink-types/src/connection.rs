//! Connection state as seen by the presentation layer.

use serde::Serialize;

/// Lifecycle phase of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPhase {
    /// No connection.
    Disconnected,
    /// Dial in progress.
    Connecting,
    /// Stream established.
    Connected,
    /// Local teardown in progress.
    Closing,
}

impl std::fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Closing => write!(f, "closing"),
        }
    }
}

/// Snapshot of the Initiator's connection.
///
/// `peer_name` and `remote_address` are only populated while connecting or
/// connected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionState {
    pub phase: ConnectionPhase,
    pub peer_name: Option<String>,
    pub remote_address: Option<String>,
}

impl ConnectionState {
    pub fn disconnected() -> Self {
        Self {
            phase: ConnectionPhase::Disconnected,
            peer_name: None,
            remote_address: None,
        }
    }

    pub fn connecting(peer_name: impl Into<String>, remote_address: impl Into<String>) -> Self {
        Self {
            phase: ConnectionPhase::Connecting,
            peer_name: Some(peer_name.into()),
            remote_address: Some(remote_address.into()),
        }
    }

    pub fn connected(peer_name: impl Into<String>, remote_address: impl Into<String>) -> Self {
        Self {
            phase: ConnectionPhase::Connected,
            peer_name: Some(peer_name.into()),
            remote_address: Some(remote_address.into()),
        }
    }

    /// Same peer, now closing.
    pub fn closing(&self) -> Self {
        Self {
            phase: ConnectionPhase::Closing,
            ..self.clone()
        }
    }

    pub fn is_connected(&self) -> bool {
        self.phase == ConnectionPhase::Connected
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::disconnected()
    }
}
