//! Watched-address set.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

use crate::types::Address;

/// Thread-safe set of subscribed addresses.
///
/// Addresses are inserted at most once and never removed. The poll loop
/// works from [`snapshot`](Self::snapshot) copies so that concurrent
/// subscribers never wait on a tick.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    inner: RwLock<HashSet<Address>>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `address`. Returns `true` if it was not already present.
    pub fn add(&self, address: impl Into<Address>) -> bool {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(address.into())
    }

    /// Point-in-time copy of the set.
    pub fn snapshot(&self) -> HashSet<Address> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn contains(&self, address: &str) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(address)
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn add_is_idempotent() {
        let set = SubscriptionSet::new();
        assert!(set.add("0xabc"));
        assert!(!set.add("0xabc"));
        assert_eq!(set.len(), 1);
        assert!(set.contains("0xabc"));
    }

    #[test]
    fn snapshot_is_detached() {
        let set = SubscriptionSet::new();
        set.add("0xa");
        let snap = set.snapshot();
        set.add("0xb");
        assert_eq!(snap.len(), 1);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn concurrent_adds_lose_nothing() {
        let set = Arc::new(SubscriptionSet::new());
        let added = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..100)
            .map(|i| {
                let set = Arc::clone(&set);
                let added = Arc::clone(&added);
                std::thread::spawn(move || {
                    if set.add(format!("0x{:02}", i % 50)) {
                        added.fetch_add(1, Ordering::Relaxed);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(set.len(), 50);
        assert_eq!(added.load(Ordering::Relaxed), 50);
    }
}
