//! Fixed-capacity, newest-first ring shared between a producer and readers.
//!
//! Push and trim happen under a single write lock, so a reader never sees
//! the ring above capacity and two pushes never interleave their trims.
//! Readers get owned snapshots, never references into the live buffer.

use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

/// Thread-safe bounded ring. Cloning shares the underlying buffer.
#[derive(Debug, Clone)]
pub struct BoundedRing<T> {
    capacity: usize,
    entries: Arc<RwLock<VecDeque<T>>>,
}

impl<T: Clone> BoundedRing<T> {
    /// Create an empty ring holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
        }
    }

    /// Prepend an entry, evicting the oldest once capacity is exceeded.
    pub fn push(&self, entry: T) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.push_front(entry);
        entries.truncate(self.capacity);
    }

    /// Newest-first copy of the current contents.
    pub fn snapshot(&self) -> Vec<T> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.iter().cloned().collect()
    }

    /// Most recent entry, if any.
    pub fn latest(&self) -> Option<T> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.front().cloned()
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first() {
        let ring = BoundedRing::new(3);
        ring.push(1);
        ring.push(2);
        assert_eq!(ring.snapshot(), vec![2, 1]);
        assert_eq!(ring.latest(), Some(2));
    }

    #[test]
    fn test_evicts_oldest_past_capacity() {
        let ring = BoundedRing::new(3);
        for i in 0..5 {
            ring.push(i);
        }
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.snapshot(), vec![4, 3, 2]);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let ring = BoundedRing::new(2);
        ring.push("a");
        let snap = ring.snapshot();
        ring.push("b");
        ring.clear();
        assert_eq!(snap, vec!["a"]);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_concurrent_pushes_respect_capacity() {
        let ring = BoundedRing::new(10);
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let ring = ring.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        ring.push(t * 1000 + i);
                        assert!(ring.len() <= 10);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(ring.len(), 10);
    }
}
