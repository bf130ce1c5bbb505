//! LAN discovery over UDP multicast.
//!
//! Each advertised record is announced as a JSON datagram to the configured
//! multicast group every `announce_interval`, and a goodbye datagram is sent
//! when it is withdrawn. Browsers join the group, resolve the host from the
//! datagram source address, and expire names that stop announcing.

use crate::transport::{
    DiscoveryError, DiscoveryEvent, DiscoveryTransport, ServiceRecord, ServiceType, BROWSE_BUFFER,
};

use async_trait::async_trait;
use paylink_types::config::DiscoveryConfig;
use paylink_types::peer::PeerDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Announcement intervals a name may miss before it is removed.
const MISSED_INTERVALS: u32 = 3;

/// Largest datagram accepted.
const MAX_DATAGRAM: usize = 2048;

/// Multicast binding settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MulticastConfig {
    pub group: Ipv4Addr,
    pub port: u16,
    pub announce_interval: Duration,
}

impl MulticastConfig {
    pub fn from_config(config: &DiscoveryConfig) -> Result<Self, DiscoveryError> {
        let group: Ipv4Addr = config.multicast_group.parse().map_err(|_| {
            DiscoveryError::Init(format!(
                "invalid multicast group '{}'",
                config.multicast_group
            ))
        })?;
        if !group.is_multicast() {
            return Err(DiscoveryError::Init(format!(
                "{group} is not a multicast address"
            )));
        }
        Ok(Self {
            group,
            port: config.multicast_port,
            announce_interval: config.announce_interval(),
        })
    }

    fn target(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.group, self.port))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum AnnouncementKind {
    Announce,
    Goodbye,
}

/// Datagram payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Announcement {
    kind: AnnouncementKind,
    service_type: String,
    protocol: String,
    domain: String,
    name: String,
    port: u16,
    #[serde(default)]
    addresses: Vec<String>,
}

impl Announcement {
    fn new(kind: AnnouncementKind, record: &ServiceRecord) -> Self {
        Self {
            kind,
            service_type: record.service.service_type.clone(),
            protocol: record.service.protocol.clone(),
            domain: record.service.domain.clone(),
            name: record.name.clone(),
            port: record.port,
            addresses: record.addresses.clone(),
        }
    }

    fn matches(&self, service: &ServiceType) -> bool {
        self.service_type == service.service_type
            && self.protocol == service.protocol
            && self.domain == service.domain
    }
}

struct Advertisement {
    record: ServiceRecord,
    task: JoinHandle<()>,
}

/// UDP multicast discovery binding.
pub struct MulticastDiscovery {
    config: MulticastConfig,
    sender: Arc<UdpSocket>,
    advertised: Mutex<HashMap<String, Advertisement>>,
    browse_task: Mutex<Option<JoinHandle<()>>>,
}

impl MulticastDiscovery {
    /// Open the sending socket. Fails when no UDP socket can be created.
    pub async fn bind(config: MulticastConfig) -> Result<Self, DiscoveryError> {
        let sender = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
            .await
            .map_err(|e| DiscoveryError::Init(format!("cannot open UDP socket: {e}")))?;
        sender
            .set_multicast_loop_v4(true)
            .map_err(|e| DiscoveryError::Init(format!("cannot enable multicast loop: {e}")))?;
        Ok(Self {
            config,
            sender: Arc::new(sender),
            advertised: Mutex::new(HashMap::new()),
            browse_task: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &MulticastConfig {
        &self.config
    }

    fn replace_browse(&self, task: Option<JoinHandle<()>>) {
        let previous = std::mem::replace(
            &mut *self.browse_task.lock().unwrap_or_else(|e| e.into_inner()),
            task,
        );
        if let Some(previous) = previous {
            previous.abort();
        }
    }
}

impl Drop for MulticastDiscovery {
    fn drop(&mut self) {
        self.replace_browse(None);
        let advertised = self.advertised.get_mut().unwrap_or_else(|e| e.into_inner());
        for (_, ad) in advertised.drain() {
            ad.task.abort();
        }
    }
}

async fn send(socket: &UdpSocket, target: SocketAddr, msg: &Announcement) -> Result<(), DiscoveryError> {
    let bytes = serde_json::to_vec(msg)?;
    socket.send_to(&bytes, target).await?;
    Ok(())
}

/// Re-announce `msg` every `interval` until aborted.
async fn announce_loop(
    socket: Arc<UdpSocket>,
    target: SocketAddr,
    interval: Duration,
    msg: Announcement,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        if let Err(e) = send(&socket, target, &msg).await {
            warn!(name = %msg.name, "Failed to send announcement: {e}");
        }
    }
}

/// Receive announcements for `service` and expire silent names.
async fn browse_loop(
    socket: UdpSocket,
    service: ServiceType,
    interval: Duration,
    tx: mpsc::Sender<DiscoveryEvent>,
) {
    let ttl = interval * MISSED_INTERVALS;
    let mut seen: HashMap<String, Instant> = HashMap::new();
    let mut sweep = tokio::time::interval(interval);
    let mut buf = [0u8; MAX_DATAGRAM];

    loop {
        let mut events = Vec::new();
        tokio::select! {
            res = socket.recv_from(&mut buf) => match res {
                Ok((n, src)) => match serde_json::from_slice::<Announcement>(&buf[..n]) {
                    Ok(msg) if msg.matches(&service) => {
                        apply(&mut seen, msg, src, &mut events);
                    }
                    Ok(_) => {}
                    Err(e) => debug!(%src, "Ignoring malformed announcement: {e}"),
                },
                Err(e) => events.push(DiscoveryEvent::Error(format!("receive failed: {e}"))),
            },
            _ = sweep.tick() => {
                let now = Instant::now();
                seen.retain(|name, last| {
                    let alive = now.duration_since(*last) < ttl;
                    if !alive {
                        events.push(DiscoveryEvent::Removed(name.clone()));
                    }
                    alive
                });
            }
        }
        for event in events {
            if tx.send(event).await.is_err() {
                return;
            }
        }
    }
}

fn apply(
    seen: &mut HashMap<String, Instant>,
    msg: Announcement,
    src: SocketAddr,
    events: &mut Vec<DiscoveryEvent>,
) {
    match msg.kind {
        AnnouncementKind::Announce => {
            if msg.port == 0 {
                debug!(name = %msg.name, %src, "ignoring announcement with port 0");
                return;
            }
            let known = seen.insert(msg.name.clone(), Instant::now()).is_some();
            if !known {
                let peer = PeerDescriptor::new(
                    &msg.name,
                    src.ip().to_string(),
                    msg.port,
                    msg.addresses,
                );
                events.push(DiscoveryEvent::Found(msg.name));
                events.push(DiscoveryEvent::Resolved(peer));
            }
        }
        AnnouncementKind::Goodbye => {
            if seen.remove(&msg.name).is_some() {
                events.push(DiscoveryEvent::Removed(msg.name));
            }
        }
    }
}

#[async_trait]
impl DiscoveryTransport for MulticastDiscovery {
    async fn advertise(&self, record: ServiceRecord) -> Result<(), DiscoveryError> {
        let msg = Announcement::new(AnnouncementKind::Announce, &record);
        // Surface send errors to the caller once before going periodic
        send(&self.sender, self.config.target(), &msg)
            .await
            .map_err(|e| DiscoveryError::Advertise(e.to_string()))?;

        let task = tokio::spawn(announce_loop(
            Arc::clone(&self.sender),
            self.config.target(),
            self.config.announce_interval,
            msg,
        ));
        let previous = self
            .advertised
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(record.name.clone(), Advertisement { record, task });
        if let Some(previous) = previous {
            previous.task.abort();
        }
        Ok(())
    }

    async fn unadvertise(&self, name: &str) -> Result<(), DiscoveryError> {
        let removed = self
            .advertised
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(name);
        let Some(ad) = removed else {
            return Ok(());
        };
        ad.task.abort();
        let goodbye = Announcement::new(AnnouncementKind::Goodbye, &ad.record);
        send(&self.sender, self.config.target(), &goodbye)
            .await
            .map_err(|e| DiscoveryError::Advertise(e.to_string()))
    }

    async fn browse(
        &self,
        service: &ServiceType,
    ) -> Result<mpsc::Receiver<DiscoveryEvent>, DiscoveryError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, self.config.port))
            .await
            .map_err(|e| {
                DiscoveryError::Browse(format!("cannot bind port {}: {e}", self.config.port))
            })?;
        socket
            .join_multicast_v4(self.config.group, Ipv4Addr::UNSPECIFIED)
            .map_err(|e| {
                DiscoveryError::Browse(format!("cannot join {}: {e}", self.config.group))
            })?;

        let (tx, rx) = mpsc::channel(BROWSE_BUFFER);
        let task = tokio::spawn(browse_loop(
            socket,
            service.clone(),
            self.config.announce_interval,
            tx,
        ));
        self.replace_browse(Some(task));
        Ok(rx)
    }

    async fn stop_browse(&self) {
        self.replace_browse(None);
    }

    fn name(&self) -> &'static str {
        "multicast"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ServiceType {
        ServiceType::new("payment-device", "tcp", "local.")
    }

    fn announcement(kind: AnnouncementKind, name: &str) -> Announcement {
        Announcement {
            kind,
            service_type: "payment-device".to_string(),
            protocol: "tcp".to_string(),
            domain: "local.".to_string(),
            name: name.to_string(),
            port: 8080,
            addresses: Vec::new(),
        }
    }

    fn src() -> SocketAddr {
        "192.168.1.20:40000".parse().unwrap()
    }

    #[test]
    fn test_config_rejects_unicast_group() {
        let mut config = DiscoveryConfig::default();
        assert!(MulticastConfig::from_config(&config).is_ok());
        config.multicast_group = "10.0.0.1".to_string();
        assert!(matches!(
            MulticastConfig::from_config(&config),
            Err(DiscoveryError::Init(_))
        ));
        config.multicast_group = "nonsense".to_string();
        assert!(MulticastConfig::from_config(&config).is_err());
    }

    #[test]
    fn test_announcement_wire_shape() {
        let json = serde_json::to_value(announcement(AnnouncementKind::Goodbye, "B")).unwrap();
        assert_eq!(json["kind"], "goodbye");
        assert_eq!(json["service_type"], "payment-device");
        assert_eq!(json["port"], 8080);
        assert!(announcement(AnnouncementKind::Announce, "B").matches(&service()));
    }

    #[test]
    fn test_first_announce_resolves_from_source_address() {
        let mut seen = HashMap::new();
        let mut events = Vec::new();
        apply(&mut seen, announcement(AnnouncementKind::Announce, "B"), src(), &mut events);
        assert_eq!(events[0], DiscoveryEvent::Found("B".to_string()));
        match &events[1] {
            DiscoveryEvent::Resolved(peer) => assert_eq!(peer.address(), "192.168.1.20:8080"),
            other => panic!("Expected Resolved, got {other:?}"),
        }

        // Repeats only refresh the timestamp
        events.clear();
        apply(&mut seen, announcement(AnnouncementKind::Announce, "B"), src(), &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn test_goodbye_removes_known_name_once() {
        let mut seen = HashMap::new();
        let mut events = Vec::new();
        apply(&mut seen, announcement(AnnouncementKind::Announce, "B"), src(), &mut events);
        events.clear();
        apply(&mut seen, announcement(AnnouncementKind::Goodbye, "B"), src(), &mut events);
        apply(&mut seen, announcement(AnnouncementKind::Goodbye, "B"), src(), &mut events);
        assert_eq!(events, vec![DiscoveryEvent::Removed("B".to_string())]);
    }

    #[test]
    fn test_announcement_with_port_zero_is_dropped() {
        let mut seen = HashMap::new();
        let mut events = Vec::new();
        let mut msg = announcement(AnnouncementKind::Announce, "B");
        msg.port = 0;
        apply(&mut seen, msg, src(), &mut events);
        assert!(events.is_empty());
        assert!(seen.is_empty());
    }
}
