//! `paylink respond`: serve payment requests until Ctrl+C.

use crate::ui;
use paylink_kernel::{KernelEvent, Responder};
use paylink_types::config::PayLinkConfig;
use tokio::sync::broadcast::error::RecvError;

pub fn cmd_respond(
    mut config: PayLinkConfig,
    port: Option<u16>,
    name: Option<String>,
    bind: Option<String>,
) {
    if let Some(port) = port {
        config.responder.port = port;
    }
    if let Some(name) = name {
        config.responder.service_name = name;
    }
    if let Some(bind) = bind {
        config.responder.bind_host = bind;
    }

    let rt = super::runtime();
    rt.block_on(async {
        let responder = Responder::start(&config).await;
        let mut events = responder.subscribe();

        let addr = match responder.start_server().await {
            Ok(addr) => addr,
            Err(e) => {
                ui::error_with_fix(
                    &format!("Could not start the server: {e}"),
                    "Pick another port with --port, or --port 0 for any free port",
                );
                std::process::exit(1);
            }
        };

        ui::section("Responder");
        ui::kv("Service", responder.service_name());
        ui::kv("Listening", &addr.to_string());
        ui::kv(
            "Policy",
            &format!(
                "approve {:.0}% of payments",
                config.processor.approval_rate * 100.0
            ),
        );
        ui::blank();
        ui::hint("Press Ctrl+C to stop");
        ui::blank();

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                event = events.recv() => match event {
                    Ok(KernelEvent::TransactionProcessed(resp)) => {
                        if resp.approved {
                            ui::success(&format!("{} {}", resp.id, resp.message));
                        } else {
                            ui::error(&format!("{} {}", resp.id, resp.message));
                        }
                    }
                    Ok(_) | Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                },
            }
        }

        ui::blank();
        let clients = responder.stop_server().await;
        ui::success(&format!("Server stopped ({clients} clients disconnected)"));
        let processed = responder.processed_transactions();
        if !processed.is_empty() {
            ui::blank();
            ui::section("Recent transactions");
            for resp in processed {
                let verdict = if resp.approved { "approved" } else { "rejected" };
                ui::kv(&resp.id, verdict);
            }
        }
    });
}
