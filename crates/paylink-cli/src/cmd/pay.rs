//! `paylink pay`: send one payment and print the outcome.

use crate::ui;
use paylink_kernel::Initiator;
use paylink_types::config::PayLinkConfig;
use paylink_types::peer::PeerDescriptor;
use std::time::Duration;
use tokio::time::Instant;

/// Parse `host:port` (IPv6 hosts in brackets) into a descriptor.
fn parse_addr(addr: &str) -> Option<PeerDescriptor> {
    let (host, port) = addr.rsplit_once(':')?;
    let port: u16 = port.parse().ok().filter(|p| *p != 0)?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return None;
    }
    Some(PeerDescriptor::new(addr, host, port, Vec::new()))
}

/// Browse until a matching device shows up or `wait` runs out.
async fn discover(initiator: &Initiator, name: Option<&str>, wait: Duration) -> Option<PeerDescriptor> {
    initiator.start_scanning().await;
    let deadline = Instant::now() + wait;
    let found = loop {
        let hit = initiator
            .discovered_devices()
            .into_iter()
            .find(|d| name.map_or(true, |n| d.name == n));
        if hit.is_some() || Instant::now() >= deadline {
            break hit;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    };
    initiator.stop_scanning().await;
    found
}

pub fn cmd_pay(
    config: PayLinkConfig,
    amount: &str,
    description: &str,
    peer: Option<&str>,
    addr: Option<&str>,
    wait: u64,
) {
    let rt = super::runtime();
    let approved = rt.block_on(async {
        let initiator = Initiator::start(&config).await;

        let target = match addr {
            Some(addr) => match parse_addr(addr) {
                Some(target) => target,
                None => {
                    ui::error_with_fix(
                        &format!("Invalid address '{addr}'"),
                        "Use host:port, e.g. 192.168.1.20:8080",
                    );
                    std::process::exit(1);
                }
            },
            None => match discover(&initiator, peer, Duration::from_secs(wait)).await {
                Some(target) => target,
                None => {
                    let what = peer.map_or("No payment device".to_string(), |n| {
                        format!("Device '{n}'")
                    });
                    ui::error_with_fix(
                        &format!("{what} found within {wait}s"),
                        "Start one with `paylink respond`, or pass --addr host:port",
                    );
                    std::process::exit(1);
                }
            },
        };

        if let Err(e) = initiator.connect_to(&target).await {
            ui::error(&format!("Could not connect to {}: {e}", target.address()));
            std::process::exit(1);
        }
        ui::success(&format!("Connected to {} ({})", target.name, target.address()));

        let result = initiator.pay(amount, description).await;
        initiator.disconnect().await;
        match result {
            Ok(outcome) => {
                ui::blank();
                ui::outcome(&outcome);
                outcome.is_approved()
            }
            Err(e) => {
                ui::error(&format!("Payment failed: {e}"));
                false
            }
        }
    });

    if !approved {
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_addr() {
        let peer = parse_addr("192.168.1.20:8080").unwrap();
        assert_eq!(peer.host, "192.168.1.20");
        assert_eq!(peer.port, 8080);

        let v6 = parse_addr("[::1]:9000").unwrap();
        assert_eq!(v6.host, "::1");
        assert_eq!(v6.address(), "[::1]:9000");

        assert!(parse_addr("no-port").is_none());
        assert!(parse_addr("host:0").is_none());
        assert!(parse_addr(":8080").is_none());
        assert!(parse_addr("host:99999").is_none());
    }
}
