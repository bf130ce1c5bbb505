//! The set of discovered peers.

use paylink_types::peer::PeerDescriptor;
use std::sync::{Arc, RwLock};

/// Discovered descriptors in resolution order, unique by name.
///
/// Cloning shares the directory.
#[derive(Debug, Clone, Default)]
pub struct PeerDirectory {
    peers: Arc<RwLock<Vec<PeerDescriptor>>>,
}

impl PeerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `peer` unless its name is already known. Returns whether it was added.
    pub fn insert(&self, peer: PeerDescriptor) -> bool {
        let mut peers = self.peers.write().unwrap_or_else(|e| e.into_inner());
        if peers.iter().any(|p| p.name == peer.name) {
            return false;
        }
        peers.push(peer);
        true
    }

    /// Remove the peer named `name`. Returns whether one was removed.
    pub fn remove(&self, name: &str) -> bool {
        let mut peers = self.peers.write().unwrap_or_else(|e| e.into_inner());
        match peers.iter().position(|p| p.name == name) {
            Some(index) => {
                peers.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<PeerDescriptor> {
        let peers = self.peers.read().unwrap_or_else(|e| e.into_inner());
        peers.iter().find(|p| p.name == name).cloned()
    }

    pub fn snapshot(&self) -> Vec<PeerDescriptor> {
        self.peers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.peers.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.peers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}
