//! `paylink config`: show or initialize the configuration.

use crate::ui;
use paylink_kernel::config::{default_config_path, save_config};
use paylink_types::config::PayLinkConfig;
use std::path::Path;

pub fn cmd_config(config: &PayLinkConfig, path: Option<&Path>, init: bool) {
    let config_path = path
        .map(|p| p.to_path_buf())
        .unwrap_or_else(default_config_path);

    if init {
        if config_path.exists() {
            ui::hint(&format!(
                "{} already exists; leaving it untouched",
                config_path.display()
            ));
        } else {
            match save_config(&PayLinkConfig::default(), &config_path) {
                Ok(()) => ui::success(&format!("Wrote {}", config_path.display())),
                Err(e) => {
                    ui::error(&e.to_string());
                    std::process::exit(1);
                }
            }
        }
        ui::blank();
    }

    ui::section("Configuration");
    let source = if config_path.exists() {
        config_path.display().to_string()
    } else {
        format!("{} (not found, defaults)", config_path.display())
    };
    ui::kv("File", &source);
    ui::blank();
    match toml::to_string_pretty(config) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            ui::error(&format!("Failed to render config: {e}"));
            std::process::exit(1);
        }
    }
}
