//! Callback fan-out registry
//!
//! Fan-out is synchronous: every subscriber runs to completion inside
//! `notify_all`, before it returns. Each pass iterates a stable snapshot of
//! the registry taken at the moment the pass begins — a subscriber added or
//! removed mid-pass does not affect that pass. The lock is dropped before
//! any callback runs, so callbacks are free to subscribe or release.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::bridge::Disposer;

/// Callback receiving each notification payload
pub type Subscriber<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Registry of active subscriber callbacks for one store or topic
pub struct SubscriberRegistry<T> {
    entries: Arc<Mutex<HashMap<u64, Subscriber<T>>>>,
    next_id: Arc<AtomicU64>,
}

impl<T: 'static> SubscriberRegistry<T> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Register a subscriber; releasing the disposer removes it (idempotent)
    pub fn add(&self, subscriber: Subscriber<T>) -> Disposer {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().insert(id, subscriber);

        let entries = Arc::clone(&self.entries);
        Disposer::new(move || {
            entries.lock().remove(&id);
        })
    }

    /// Deliver `payload` to every currently registered subscriber
    pub fn notify_all(&self, payload: &T) {
        let snapshot: Vec<Subscriber<T>> = self.entries.lock().values().cloned().collect();
        for subscriber in snapshot {
            subscriber(payload);
        }
    }

    pub fn count(&self) -> usize {
        self.entries.lock().len()
    }
}

impl<T: 'static> Default for SubscriberRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SubscriberRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn test_fan_out_reaches_all() {
        let registry = SubscriberRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let counter = Arc::clone(&hits);
            let _ = registry.add(Arc::new(move |n: &u32| {
                counter.fetch_add(*n as usize, Ordering::SeqCst);
            }));
        }

        registry.notify_all(&2);
        assert_eq!(hits.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_disposer_removes_and_is_idempotent() {
        let registry = SubscriberRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        let mut disposer = registry.add(Arc::new(move |_: &()| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(registry.count(), 1);

        disposer.release();
        disposer.release();
        assert_eq!(registry.count(), 0);

        registry.notify_all(&());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_removal_during_pass_does_not_affect_pass() {
        let registry: SubscriberRegistry<()> = SubscriberRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        // Two counting subscribers, plus one that releases both mid-pass
        let disposers: Arc<Mutex<DisposerPair>> = Arc::default();
        for _ in 0..2 {
            let counter = Arc::clone(&hits);
            let disposer = registry.add(Arc::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
            disposers.lock().0.push(disposer);
        }
        let to_release = Arc::clone(&disposers);
        let _saboteur = registry.add(Arc::new(move |_| {
            for disposer in to_release.lock().0.iter_mut() {
                disposer.release();
            }
        }));

        // The pass snapshot was taken before any callback ran, so both
        // counters still fire regardless of iteration order
        registry.notify_all(&());
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        // The next pass sees only the saboteur
        registry.notify_all(&());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_subscriber_added_during_pass_waits_for_next() {
        let registry: SubscriberRegistry<()> = SubscriberRegistry::new();
        let late_hits = Arc::new(AtomicUsize::new(0));

        let reg = registry.clone();
        let counter = Arc::clone(&late_hits);
        let _ = registry.add(Arc::new(move |_| {
            let late_counter = Arc::clone(&counter);
            let _ = reg.add(Arc::new(move |_| {
                late_counter.fetch_add(1, Ordering::SeqCst);
            }));
        }));

        registry.notify_all(&());
        assert_eq!(late_hits.load(Ordering::SeqCst), 0);

        registry.notify_all(&());
        assert_eq!(late_hits.load(Ordering::SeqCst), 1);
    }

    #[derive(Default)]
    struct DisposerPair(Vec<Disposer>);
}
