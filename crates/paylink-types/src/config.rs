//! Configuration types.
//!
//! Every section carries `#[serde(default)]`, so a config file only needs the
//! keys it overrides. Loading lives in the kernel crate.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default DNS-SD style service type advertised by Responders.
pub const DEFAULT_SERVICE_TYPE: &str = "payment-device";
/// Default transport protocol label.
pub const DEFAULT_PROTOCOL: &str = "tcp";
/// Default discovery domain.
pub const DEFAULT_DOMAIN: &str = "local.";
/// Default Responder instance name.
pub const DEFAULT_SERVICE_NAME: &str = "PaymentDevice-B";
/// Default Responder port.
pub const DEFAULT_PORT: u16 = 8080;

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayLinkConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_level: String,
    pub responder: ResponderConfig,
    pub discovery: DiscoveryConfig,
    pub exchange: ExchangeConfig,
    pub processor: ProcessorConfig,
}

impl Default for PayLinkConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            responder: ResponderConfig::default(),
            discovery: DiscoveryConfig::default(),
            exchange: ExchangeConfig::default(),
            processor: ProcessorConfig::default(),
        }
    }
}

/// Responder listener and advertisement settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponderConfig {
    /// Advertised service instance name.
    pub service_name: String,
    /// Listening port. 0 binds an ephemeral port and advertises it.
    pub port: u16,
    /// Interface to bind.
    pub bind_host: String,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            port: DEFAULT_PORT,
            bind_host: "0.0.0.0".to_string(),
        }
    }
}

/// Which discovery transport binding to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryBackend {
    /// UDP multicast announcements on the local network.
    Multicast,
    /// In-process registry (single-process demos and tests).
    Memory,
}

/// Service discovery settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub service_type: String,
    pub protocol: String,
    pub domain: String,
    pub backend: DiscoveryBackend,
    /// IPv4 multicast group for announcements.
    pub multicast_group: String,
    /// UDP port for announcements.
    pub multicast_port: u16,
    /// Interval between repeated announcements.
    pub announce_interval_ms: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            service_type: DEFAULT_SERVICE_TYPE.to_string(),
            protocol: DEFAULT_PROTOCOL.to_string(),
            domain: DEFAULT_DOMAIN.to_string(),
            backend: DiscoveryBackend::Multicast,
            multicast_group: "224.0.0.251".to_string(),
            multicast_port: 5354,
            announce_interval_ms: 2_000,
        }
    }
}

impl DiscoveryConfig {
    pub fn announce_interval(&self) -> Duration {
        Duration::from_millis(self.announce_interval_ms.max(100))
    }
}

/// How messages are delimited on the byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    /// Each transport read carries exactly one JSON message, with no
    /// delimiter and no length prefix.
    Raw,
    /// Opt-in: 4-byte big-endian length prefix followed by the JSON body.
    LengthPrefixed,
}

/// Request/response exchange settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub framing: Framing,
    /// How long a submitted request waits for its response. 0 waits forever.
    pub response_timeout_ms: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            framing: Framing::Raw,
            response_timeout_ms: 30_000,
        }
    }
}

impl ExchangeConfig {
    pub fn response_timeout(&self) -> Option<Duration> {
        (self.response_timeout_ms > 0).then(|| Duration::from_millis(self.response_timeout_ms))
    }
}

/// Simulated authorization policy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Probability of approving a request, in `[0, 1]`.
    pub approval_rate: f64,
    /// Fixed RNG seed for reproducible decisions.
    pub seed: Option<u64>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            approval_rate: 0.7,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PayLinkConfig::default();
        assert_eq!(config.responder.port, 8080);
        assert_eq!(config.responder.service_name, "PaymentDevice-B");
        assert_eq!(config.discovery.service_type, "payment-device");
        assert_eq!(config.discovery.domain, "local.");
        assert_eq!(config.exchange.framing, Framing::Raw);
        assert_eq!(config.processor.approval_rate, 0.7);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: PayLinkConfig = toml::from_str(
            r#"
            [responder]
            port = 9090

            [exchange]
            framing = "length_prefixed"
            response_timeout_ms = 0
        "#,
        )
        .unwrap();
        assert_eq!(config.responder.port, 9090);
        assert_eq!(config.responder.service_name, "PaymentDevice-B");
        assert_eq!(config.exchange.framing, Framing::LengthPrefixed);
        assert_eq!(config.exchange.response_timeout(), None);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_backend_names() {
        let config: DiscoveryConfig = toml::from_str("backend = \"memory\"").unwrap();
        assert_eq!(config.backend, DiscoveryBackend::Memory);
    }
}
