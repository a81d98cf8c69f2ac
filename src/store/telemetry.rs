//! Bounded, subscribable view of one telemetry stream
//!
//! `start()` seeds the window from a historical snapshot, notifies whoever
//! is already subscribed, then splices in live pushes from the shared
//! telemetry channel. Pushes for other keys are filtered out on the
//! envelope key. Everything a subscriber sees goes through the same path:
//! append (or reseed), then one synchronous fan-out of the whole window.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::backend::{BackendError, Gateway};
use crate::bridge::{Disposer, EventBridge};
use crate::model::TelemetryRecord;

use super::buffer::StreamBuffer;
use super::error::{ConfigError, StoreStartError};
use super::subscribers::{Subscriber, SubscriberRegistry};
use super::StoreState;

struct StoreInner {
    key: String,
    state: Mutex<StoreState>,
    buffer: Mutex<StreamBuffer<TelemetryRecord>>,
    subscribers: SubscriberRegistry<Vec<TelemetryRecord>>,
}

impl StoreInner {
    /// Append one pushed record and fan out the updated window
    fn ingest(&self, record: TelemetryRecord) {
        // A delivery can still be in flight right after stop(); ignore it.
        // Starting is accepted: channels that buffer across the snapshot gap
        // replay into the tail end of start().
        let state = *self.state.lock();
        if !matches!(state, StoreState::Starting | StoreState::Active) {
            tracing::trace!(key = %self.key, ?state, "Dropping push delivered outside live states");
            return;
        }

        let window = {
            let mut buffer = self.buffer.lock();
            buffer.append(record);
            buffer.window()
        };
        self.subscribers.notify_all(&window);
    }

    fn notify_current(&self) {
        let window = self.buffer.lock().window();
        self.subscribers.notify_all(&window);
    }
}

/// Bounded rolling window over one telemetry key, with live updates
pub struct TelemetryStore {
    gateway: Gateway,
    bridge: EventBridge,
    inner: Arc<StoreInner>,
    subscription: Mutex<Option<Disposer>>,
}

impl TelemetryStore {
    /// Create a store for `key` retaining at most `capacity` records
    pub fn new(
        gateway: Gateway,
        bridge: EventBridge,
        key: impl Into<String>,
        capacity: usize,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            gateway,
            bridge,
            inner: Arc::new(StoreInner {
                key: key.into(),
                state: Mutex::new(StoreState::Idle),
                buffer: Mutex::new(StreamBuffer::new(capacity)?),
                subscribers: SubscriberRegistry::new(),
            }),
            subscription: Mutex::new(None),
        })
    }

    pub fn key(&self) -> &str {
        &self.inner.key
    }

    pub fn capacity(&self) -> usize {
        self.inner.buffer.lock().capacity()
    }

    pub fn state(&self) -> StoreState {
        *self.inner.state.lock()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.count()
    }

    /// Seed from a fresh snapshot and attach the live subscription
    ///
    /// On failure the store keeps its prior state and `start()` may simply
    /// be retried. Starting an already started store fails rather than
    /// double-subscribing.
    pub async fn start(&self) -> Result<(), StoreStartError> {
        let prior = {
            let mut state = self.inner.state.lock();
            match *state {
                StoreState::Starting | StoreState::Active => {
                    return Err(StoreStartError::AlreadyActive {
                        key: self.inner.key.clone(),
                    });
                }
                prior => {
                    *state = StoreState::Starting;
                    prior
                }
            }
        };

        let snapshot = match self
            .gateway
            .get_telemetry(&self.inner.key, Some(self.capacity()))
            .await
        {
            Ok(records) => records,
            Err(source) => {
                *self.inner.state.lock() = prior;
                return Err(StoreStartError::Snapshot {
                    key: self.inner.key.clone(),
                    source,
                });
            }
        };
        let seeded = snapshot.len();
        self.inner.buffer.lock().reseed(snapshot);
        self.inner.notify_current();

        let inner = Arc::clone(&self.inner);
        let disposer = match self
            .bridge
            .on_telemetry(move |event| {
                if event.key == inner.key {
                    inner.ingest(event.record);
                } else {
                    tracing::trace!(
                        store = %inner.key,
                        event = %event.key,
                        "Ignoring push for another key"
                    );
                }
            })
            .await
        {
            Ok(disposer) => disposer,
            Err(source) => {
                *self.inner.state.lock() = prior;
                return Err(StoreStartError::Subscription {
                    key: self.inner.key.clone(),
                    source,
                });
            }
        };

        {
            let mut state = self.inner.state.lock();
            if *state != StoreState::Starting {
                // stop() won the interleaving while we were subscribing
                drop(state);
                let mut disposer = disposer;
                disposer.release();
                return Ok(());
            }
            *state = StoreState::Active;
        }
        *self.subscription.lock() = Some(disposer);

        tracing::info!(key = %self.inner.key, seeded, "Telemetry store started");
        Ok(())
    }

    /// Release the live subscription; window and subscribers are retained
    ///
    /// Idempotent. A never-started store stays Idle.
    pub fn stop(&self) {
        if let Some(mut disposer) = self.subscription.lock().take() {
            disposer.release();
        }
        let mut state = self.inner.state.lock();
        if matches!(*state, StoreState::Starting | StoreState::Active) {
            *state = StoreState::Stopped;
            tracing::info!(key = %self.inner.key, "Telemetry store stopped");
        }
    }

    /// Re-fetch the snapshot out of band and notify subscribers
    ///
    /// Works in any state and leaves the live subscription untouched; this
    /// is the recovery path when a missed event is suspected.
    pub async fn refresh(&self) -> Result<(), BackendError> {
        let snapshot = self
            .gateway
            .get_telemetry(&self.inner.key, Some(self.capacity()))
            .await?;
        self.inner.buffer.lock().reseed(snapshot);
        self.inner.notify_current();
        tracing::debug!(key = %self.inner.key, "Telemetry store refreshed");
        Ok(())
    }

    /// Register a subscriber callback
    ///
    /// The current window (possibly empty) is delivered synchronously to the
    /// new subscriber before this returns, so a late joiner always has an
    /// initial view.
    pub fn subscribe(
        &self,
        on_update: impl Fn(&[TelemetryRecord]) + Send + Sync + 'static,
    ) -> Disposer {
        let subscriber: Subscriber<Vec<TelemetryRecord>> =
            Arc::new(move |window| on_update(window.as_slice()));
        let disposer = self.inner.subscribers.add(Arc::clone(&subscriber));

        let window = self.inner.buffer.lock().window();
        subscriber(&window);
        disposer
    }

    /// The most recent record, if any
    pub fn current_data(&self) -> Option<TelemetryRecord> {
        self.inner.buffer.lock().latest().cloned()
    }

    /// The whole window, oldest first
    pub fn all_data(&self) -> Vec<TelemetryRecord> {
        self.inner.buffer.lock().window()
    }
}
