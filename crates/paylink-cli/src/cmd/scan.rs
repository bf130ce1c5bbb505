//! `paylink scan`: list Responders on the network.

use crate::ui;
use paylink_kernel::Initiator;
use paylink_types::config::PayLinkConfig;
use std::time::Duration;

pub fn cmd_scan(config: PayLinkConfig, wait: u64, json: bool) {
    let rt = super::runtime();
    rt.block_on(async {
        let initiator = Initiator::start(&config).await;
        if !initiator.discovery_enabled() {
            for entry in initiator.logs().iter().rev() {
                ui::log_entry(entry);
            }
            ui::error_with_fix(
                "Discovery is unavailable",
                "Check the [discovery] section with `paylink config`",
            );
            std::process::exit(1);
        }

        initiator.start_scanning().await;
        tokio::time::sleep(Duration::from_secs(wait)).await;
        initiator.stop_scanning().await;

        let devices = initiator.discovered_devices();
        if json {
            match serde_json::to_string_pretty(&devices) {
                Ok(text) => println!("{text}"),
                Err(e) => {
                    ui::error(&format!("Failed to render devices: {e}"));
                    std::process::exit(1);
                }
            }
            return;
        }

        ui::section(&format!("Devices ({})", devices.len()));
        if devices.is_empty() {
            ui::hint("No payment devices found. Is `paylink respond` running?");
            return;
        }
        for device in devices {
            ui::kv(&device.name, &device.address());
        }
    });
}
