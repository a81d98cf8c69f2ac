//! Bounded, subscribable view of one camera stream
//!
//! Same lifecycle as the telemetry store, with two differences: the backend
//! only retains the latest frame per camera, so the seed is at most one
//! frame; and the live path goes through the process-wide
//! [`FrameDispatcher`](super::FrameDispatcher), whose per-key topics are
//! what keeps frames from other cameras out of this store's window.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::backend::{BackendError, Gateway};
use crate::bridge::Disposer;
use crate::model::EncodedVideoFrame;

use super::buffer::StreamBuffer;
use super::dispatch::FrameDispatcher;
use super::error::{ConfigError, StoreStartError};
use super::subscribers::{Subscriber, SubscriberRegistry};
use super::StoreState;

struct StoreInner {
    key: String,
    state: Mutex<StoreState>,
    buffer: Mutex<StreamBuffer<EncodedVideoFrame>>,
    subscribers: SubscriberRegistry<Vec<EncodedVideoFrame>>,
}

impl StoreInner {
    fn ingest(&self, frame: EncodedVideoFrame) {
        let state = *self.state.lock();
        if !matches!(state, StoreState::Starting | StoreState::Active) {
            tracing::trace!(key = %self.key, ?state, "Dropping frame delivered outside live states");
            return;
        }

        let window = {
            let mut buffer = self.buffer.lock();
            buffer.append(frame);
            buffer.window()
        };
        self.subscribers.notify_all(&window);
    }

    fn notify_current(&self) {
        let window = self.buffer.lock().window();
        self.subscribers.notify_all(&window);
    }
}

/// Bounded rolling window over one camera key, with live frames
pub struct VideoStore {
    gateway: Gateway,
    dispatcher: FrameDispatcher,
    inner: Arc<StoreInner>,
    subscription: Mutex<Option<Disposer>>,
}

impl VideoStore {
    /// Create a store for camera `key` retaining at most `capacity` frames
    pub fn new(
        gateway: Gateway,
        dispatcher: FrameDispatcher,
        key: impl Into<String>,
        capacity: usize,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            gateway,
            dispatcher,
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

    /// Seed from the latest retained frame and join the live frame feed
    ///
    /// The per-key topic is registered before the dispatcher attaches its
    /// channel subscription, so no routed frame can fall between the two.
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

        let latest = match self.gateway.get_latest_video_frame(&self.inner.key).await {
            Ok(frame) => frame,
            Err(source) => {
                *self.inner.state.lock() = prior;
                return Err(StoreStartError::Snapshot {
                    key: self.inner.key.clone(),
                    source,
                });
            }
        };
        self.inner.buffer.lock().reseed(latest);
        self.inner.notify_current();

        let inner = Arc::clone(&self.inner);
        let topic: Subscriber<EncodedVideoFrame> =
            Arc::new(move |frame| inner.ingest(frame.clone()));
        let mut topic_disposer = self.dispatcher.subscribe(&self.inner.key, topic);

        if let Err(source) = self.dispatcher.attach().await {
            topic_disposer.release();
            *self.inner.state.lock() = prior;
            return Err(StoreStartError::Subscription {
                key: self.inner.key.clone(),
                source,
            });
        }

        {
            let mut state = self.inner.state.lock();
            if *state != StoreState::Starting {
                // stop() won the interleaving while the dispatcher attached
                drop(state);
                topic_disposer.release();
                return Ok(());
            }
            *state = StoreState::Active;
        }
        *self.subscription.lock() = Some(topic_disposer);

        tracing::info!(key = %self.inner.key, "Video store started");
        Ok(())
    }

    /// Leave the live frame feed; window and subscribers are retained
    ///
    /// Releases only this store's topic registration. The dispatcher's
    /// channel subscription stays up for other video stores.
    pub fn stop(&self) {
        if let Some(mut disposer) = self.subscription.lock().take() {
            disposer.release();
        }
        let mut state = self.inner.state.lock();
        if matches!(*state, StoreState::Starting | StoreState::Active) {
            *state = StoreState::Stopped;
            tracing::info!(key = %self.inner.key, "Video store stopped");
        }
    }

    /// Re-fetch the latest frame out of band and notify subscribers
    ///
    /// Appends only when the fetched frame is newer than the current one,
    /// so an unchanged backend does not produce duplicate window entries.
    pub async fn refresh(&self) -> Result<(), BackendError> {
        let Some(fetched) = self.gateway.get_latest_video_frame(&self.inner.key).await? else {
            return Ok(());
        };

        let appended = {
            let mut buffer = self.inner.buffer.lock();
            let stale = buffer
                .latest()
                .is_none_or(|current| current.timestamp < fetched.timestamp);
            if stale {
                buffer.append(fetched);
            }
            stale
        };
        if appended {
            self.inner.notify_current();
            tracing::debug!(key = %self.inner.key, "Video store refreshed");
        }
        Ok(())
    }

    /// Register a subscriber callback
    ///
    /// The current window (possibly empty) is delivered synchronously to the
    /// new subscriber before this returns.
    pub fn subscribe(
        &self,
        on_update: impl Fn(&[EncodedVideoFrame]) + Send + Sync + 'static,
    ) -> Disposer {
        let subscriber: Subscriber<Vec<EncodedVideoFrame>> =
            Arc::new(move |window| on_update(window.as_slice()));
        let disposer = self.inner.subscribers.add(Arc::clone(&subscriber));

        let window = self.inner.buffer.lock().window();
        subscriber(&window);
        disposer
    }

    /// The most recent frame, if any
    pub fn current_frame(&self) -> Option<EncodedVideoFrame> {
        self.inner.buffer.lock().latest().cloned()
    }

    /// The whole frame window, oldest first
    pub fn all_frames(&self) -> Vec<EncodedVideoFrame> {
        self.inner.buffer.lock().window()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bytes::Bytes;

    use crate::backend::{gateway::op, FakeBackend};
    use crate::bridge::EventBridge;
    use crate::model::{FrameFormat, VideoFrame, VIDEO_FRAME_UPDATE};

    use super::*;

    fn frame(ts: u64) -> VideoFrame {
        VideoFrame::new(ts, 4, 4, FrameFormat::Jpeg, Bytes::from_static(b"frame"))
    }

    struct Rig {
        backend: Arc<FakeBackend>,
        gateway: Gateway,
        dispatcher: FrameDispatcher,
    }

    fn rig() -> Rig {
        let backend = Arc::new(FakeBackend::new());
        let transport: Arc<dyn crate::backend::Transport> = backend.clone();
        Rig {
            backend,
            gateway: Gateway::new(Arc::clone(&transport)),
            dispatcher: FrameDispatcher::new(EventBridge::new(transport)),
        }
    }

    fn store_for(rig: &Rig, key: &str, capacity: usize) -> VideoStore {
        VideoStore::new(rig.gateway.clone(), rig.dispatcher.clone(), key, capacity).unwrap()
    }

    #[tokio::test]
    async fn test_start_seeds_from_latest_frame() {
        let rig = rig();
        rig.gateway.add_video_frame("cam-a", &frame(10)).await.unwrap();

        let store = store_for(&rig, "cam-a", 8);
        store.start().await.unwrap();

        assert_eq!(store.all_frames().len(), 1);
        assert_eq!(store.current_frame().unwrap().timestamp, 10);
    }

    #[tokio::test]
    async fn test_live_frames_append_in_order() {
        let rig = rig();
        let store = store_for(&rig, "cam-a", 3);
        store.start().await.unwrap();

        for ts in 1..=5 {
            rig.gateway.add_video_frame("cam-a", &frame(ts)).await.unwrap();
        }

        let stamps: Vec<u64> = store.all_frames().iter().map(|f| f.timestamp).collect();
        assert_eq!(stamps, vec![3, 4, 5]);
    }

    #[tokio::test]
    async fn test_never_shows_another_cameras_frames() {
        let rig = rig();
        let store_a = store_for(&rig, "cam-a", 4);
        let store_b = store_for(&rig, "cam-b", 4);
        store_a.start().await.unwrap();
        store_b.start().await.unwrap();

        rig.gateway.add_video_frame("cam-b", &frame(7)).await.unwrap();

        // Store A's current frame never moves on a push for key B
        assert!(store_a.current_frame().is_none());
        assert_eq!(store_b.current_frame().unwrap().timestamp, 7);
    }

    #[tokio::test]
    async fn test_stores_share_one_channel_subscription() {
        let rig = rig();
        let store_a = store_for(&rig, "cam-a", 4);
        let store_b = store_for(&rig, "cam-b", 4);
        store_a.start().await.unwrap();
        store_b.start().await.unwrap();

        assert_eq!(rig.backend.listener_count(VIDEO_FRAME_UPDATE), 1);

        // Stopping one store leaves the shared subscription up
        store_a.stop();
        assert_eq!(rig.backend.listener_count(VIDEO_FRAME_UPDATE), 1);

        rig.gateway.add_video_frame("cam-a", &frame(1)).await.unwrap();
        rig.gateway.add_video_frame("cam-b", &frame(2)).await.unwrap();
        assert!(store_a.current_frame().is_none());
        assert_eq!(store_b.current_frame().unwrap().timestamp, 2);
    }

    #[tokio::test]
    async fn test_stop_idempotent_restart_reseeds() {
        let rig = rig();
        let store = store_for(&rig, "cam-a", 4);
        store.start().await.unwrap();
        rig.gateway.add_video_frame("cam-a", &frame(1)).await.unwrap();

        store.stop();
        store.stop();
        assert_eq!(store.state(), StoreState::Stopped);

        rig.gateway.add_video_frame("cam-a", &frame(2)).await.unwrap();
        store.start().await.unwrap();

        // Fresh seed from the backend's latest, not a merge
        let stamps: Vec<u64> = store.all_frames().iter().map(|f| f.timestamp).collect();
        assert_eq!(stamps, vec![2]);
    }

    #[tokio::test]
    async fn test_subscribe_initial_view_and_fan_out() {
        let rig = rig();
        let store = store_for(&rig, "cam-a", 4);
        store.start().await.unwrap();

        let passes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&passes);
        let mut sub = store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(passes.load(Ordering::SeqCst), 1);

        rig.gateway.add_video_frame("cam-a", &frame(1)).await.unwrap();
        assert_eq!(passes.load(Ordering::SeqCst), 2);

        sub.release();
        rig.gateway.add_video_frame("cam-a", &frame(2)).await.unwrap();
        assert_eq!(passes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_seed_leaves_prior_state() {
        let rig = rig();
        let store = store_for(&rig, "cam-a", 4);
        rig.backend.fail_operation(op::GET_LATEST_VIDEO_FRAME);

        let err = store.start().await.unwrap_err();
        assert!(matches!(err, StoreStartError::Snapshot { .. }));
        assert_eq!(store.state(), StoreState::Idle);
        assert_eq!(rig.dispatcher.topic_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_attach_rolls_back_topic() {
        let rig = rig();
        let store = store_for(&rig, "cam-a", 4);
        rig.backend.fail_channel(VIDEO_FRAME_UPDATE);

        let err = store.start().await.unwrap_err();
        assert!(matches!(err, StoreStartError::Subscription { .. }));
        assert_eq!(store.state(), StoreState::Idle);

        // The half-registered topic was rolled back: once another store
        // brings the dispatcher up, frames for this key still cannot reach
        // a store that never went live
        rig.backend.restore_channel(VIDEO_FRAME_UPDATE);
        let other = store_for(&rig, "cam-b", 4);
        other.start().await.unwrap();
        rig.gateway.add_video_frame("cam-a", &frame(9)).await.unwrap();
        assert!(store.current_frame().is_none());
    }

    #[tokio::test]
    async fn test_refresh_appends_only_newer_frames() {
        let rig = rig();
        let store = store_for(&rig, "cam-a", 4);
        store.start().await.unwrap();
        rig.gateway.add_video_frame("cam-a", &frame(5)).await.unwrap();

        // Backend unchanged: refresh must not duplicate the frame
        store.refresh().await.unwrap();
        assert_eq!(store.all_frames().len(), 1);

        // Frame arrives while stopped; refresh recovers it
        store.stop();
        rig.gateway.add_video_frame("cam-a", &frame(6)).await.unwrap();
        store.refresh().await.unwrap();
        let stamps: Vec<u64> = store.all_frames().iter().map(|f| f.timestamp).collect();
        assert_eq!(stamps, vec![5, 6]);
    }
}
