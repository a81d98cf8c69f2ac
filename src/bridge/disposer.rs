//! Idempotent cancellation handles
//!
//! A [`Disposer`] wraps the teardown of exactly one effect (a channel
//! listener, a registry entry). The action runs at most once no matter how
//! many times `release` is called. Dropping an unreleased disposer does NOT
//! run the action: cancellation is an explicit lifecycle step, and an RAII
//! drop would tear down subscriptions the caller meant to keep alive.

/// Handle that cancels one effect when released
pub struct Disposer {
    action: Option<Box<dyn FnOnce() + Send>>,
}

impl Disposer {
    /// Create a disposer that runs `action` on first release
    pub fn new(action: impl FnOnce() + Send + 'static) -> Self {
        Self {
            action: Some(Box::new(action)),
        }
    }

    /// Create an already-released disposer
    pub fn noop() -> Self {
        Self { action: None }
    }

    /// Run the teardown action; subsequent calls are no-ops
    pub fn release(&mut self) {
        if let Some(action) = self.action.take() {
            action();
        }
    }

    /// Whether the teardown action has already run (or never existed)
    pub fn is_released(&self) -> bool {
        self.action.is_none()
    }
}

impl std::fmt::Debug for Disposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disposer")
            .field("released", &self.is_released())
            .finish()
    }
}

/// Small registry of live disposers for deterministic "stop all" teardown
#[derive(Debug, Default)]
pub struct DisposerSet {
    items: Vec<Disposer>,
}

impl DisposerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a disposer for later collective release
    pub fn insert(&mut self, disposer: Disposer) {
        self.items.push(disposer);
    }

    /// Release every tracked disposer and forget them
    pub fn release_all(&mut self) {
        for mut disposer in self.items.drain(..) {
            disposer.release();
        }
    }

    /// Number of tracked (not yet collectively released) disposers
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_release_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut disposer = Disposer::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!disposer.is_released());
        disposer.release();
        disposer.release();

        assert!(disposer.is_released());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_does_not_release() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        {
            let _disposer = Disposer::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_noop_is_released() {
        let mut disposer = Disposer::noop();
        assert!(disposer.is_released());
        disposer.release();
    }

    #[test]
    fn test_set_release_all() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut set = DisposerSet::new();
        for _ in 0..3 {
            let counter = Arc::clone(&calls);
            set.insert(Disposer::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        assert_eq!(set.len(), 3);

        set.release_all();
        set.release_all();

        assert!(set.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
