//! Configuration loading from `~/.paylink/config.toml` with defaults.

use crate::error::{KernelError, KernelResult};
use paylink_types::config::PayLinkConfig;
use paylink_types::error::{PayLinkError, PayLinkResult};
use std::path::{Path, PathBuf};
use tracing::info;

/// Load configuration from a TOML file, with defaults.
///
/// Never fails: a missing, unreadable, or invalid file is logged and the
/// defaults are used instead. Out-of-range values are clamped.
pub fn load_config(path: Option<&Path>) -> PayLinkConfig {
    let config_path = path
        .map(|p| p.to_path_buf())
        .unwrap_or_else(default_config_path);

    let config = if config_path.exists() {
        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match parse_config(&contents) {
                Ok(config) => {
                    info!(path = %config_path.display(), "Loaded configuration");
                    config
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        path = %config_path.display(),
                        "Using defaults"
                    );
                    PayLinkConfig::default()
                }
            },
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %config_path.display(),
                    "Failed to read config file, using defaults"
                );
                PayLinkConfig::default()
            }
        }
    } else {
        info!(
            path = %config_path.display(),
            "Config file not found, using defaults"
        );
        PayLinkConfig::default()
    };

    sanitize(config)
}

/// Parse TOML text into a config. Missing keys take their defaults.
pub fn parse_config(contents: &str) -> PayLinkResult<PayLinkConfig> {
    toml::from_str(contents).map_err(|e| PayLinkError::Config(e.to_string()))
}

/// Clamp values that would otherwise misbehave at runtime.
fn sanitize(mut config: PayLinkConfig) -> PayLinkConfig {
    let rate = config.processor.approval_rate;
    if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
        let clamped = if rate.is_finite() {
            rate.clamp(0.0, 1.0)
        } else {
            paylink_types::config::ProcessorConfig::default().approval_rate
        };
        tracing::warn!(
            approval_rate = rate,
            using = clamped,
            "approval_rate must be within 0.0..=1.0"
        );
        config.processor.approval_rate = clamped;
    }
    if config.responder.service_name.trim().is_empty() {
        tracing::warn!("responder.service_name is empty, using the default name");
        config.responder.service_name = paylink_types::config::DEFAULT_SERVICE_NAME.to_string();
    }
    config
}

/// Write `config` as TOML to `path`, creating parent directories.
pub fn save_config(config: &PayLinkConfig, path: &Path) -> KernelResult<()> {
    let contents = toml::to_string_pretty(config)
        .map_err(|e| KernelError::ConfigWrite(e.to_string()))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| KernelError::ConfigWrite(e.to_string()))?;
    }
    std::fs::write(path, contents).map_err(|e| KernelError::ConfigWrite(e.to_string()))?;
    info!(path = %path.display(), "Wrote configuration");
    Ok(())
}

/// Get the default config file path.
pub fn default_config_path() -> PathBuf {
    paylink_home().join("config.toml")
}

/// Get the default PayLink home directory.
pub fn paylink_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".paylink")
}

#[cfg(test)]
mod tests {
    use super::*;
    use paylink_types::config::{DiscoveryBackend, Framing};

    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(&dir.path().join("nope.toml")));
        assert_eq!(config, PayLinkConfig::default());
    }

    #[test]
    fn test_load_partial_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [responder]
            port = 9090

            [discovery]
            backend = "memory"

            [exchange]
            framing = "length_prefixed"
            response_timeout_ms = 0
            "#,
        )
        .unwrap();

        let config = load_config(Some(&path));
        assert_eq!(config.responder.port, 9090);
        assert_eq!(config.responder.service_name, "PaymentDevice-B");
        assert_eq!(config.discovery.backend, DiscoveryBackend::Memory);
        assert_eq!(config.exchange.framing, Framing::LengthPrefixed);
        assert_eq!(config.exchange.response_timeout(), None);
        assert_eq!(config.processor.approval_rate, 0.7);
    }

    #[test]
    fn test_invalid_toml_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();
        assert_eq!(load_config(Some(&path)), PayLinkConfig::default());
    }

    #[test]
    fn test_parse_error_is_config_error() {
        assert!(matches!(
            parse_config("this is = = not toml"),
            Err(PayLinkError::Config(_))
        ));
        assert!(matches!(
            parse_config("[exchange]\nframing = \"carrier_pigeon\"\n"),
            Err(PayLinkError::Config(msg)) if msg.contains("framing") || msg.contains("variant")
        ));
        assert_eq!(parse_config("").unwrap(), PayLinkConfig::default());
    }

    #[test]
    fn test_out_of_range_values_are_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[processor]\napproval_rate = 1.5\n\n[responder]\nservice_name = \"  \"\n",
        )
        .unwrap();
        let config = load_config(Some(&path));
        assert_eq!(config.processor.approval_rate, 1.0);
        assert_eq!(config.responder.service_name, "PaymentDevice-B");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = PayLinkConfig::default();
        config.responder.port = 0;
        config.processor.seed = Some(42);
        save_config(&config, &path).unwrap();
        assert_eq!(load_config(Some(&path)), config);
    }
}
