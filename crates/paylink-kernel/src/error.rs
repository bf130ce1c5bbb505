//! Kernel-specific error types.

use paylink_discovery::DiscoveryError;
use paylink_types::error::PayLinkError;
use paylink_wire::WireError;
use thiserror::Error;

/// Kernel error type wrapping PayLinkError with kernel-specific context.
#[derive(Error, Debug)]
pub enum KernelError {
    /// A wrapped PayLinkError.
    #[error(transparent)]
    PayLink(#[from] PayLinkError),

    /// No discovered device has this name.
    #[error("No discovered device named {0}")]
    UnknownPeer(String),

    /// `start_server` was called while the server is running.
    #[error("Server is already running on port {0}")]
    ServerAlreadyRunning(u16),

    /// The configuration file could not be written.
    #[error("Config write failed: {0}")]
    ConfigWrite(String),
}

impl From<WireError> for KernelError {
    fn from(err: WireError) -> Self {
        Self::PayLink(err.into())
    }
}

impl From<DiscoveryError> for KernelError {
    fn from(err: DiscoveryError) -> Self {
        Self::PayLink(err.into())
    }
}

/// Alias for kernel results.
pub type KernelResult<T> = Result<T, KernelError>;
