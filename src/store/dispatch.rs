//! Shared-channel fan-in with per-key routing
//!
//! Every camera pushes on the one `video-frame-update` channel. A naive
//! store that subscribes to the channel directly and skips key filtering
//! will happily display whichever camera pushed last. The dispatcher owns
//! the single underlying channel subscription for the whole process and
//! re-publishes each frame to an internal per-key topic, so a video store
//! only ever sees frames addressed to its own key.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::backend::BackendError;
use crate::bridge::{Disposer, EventBridge};
use crate::model::{EncodedVideoFrame, VideoFrameEvent};

use super::subscribers::{Subscriber, SubscriberRegistry};

/// Process-wide router from the shared frame channel to per-key topics
///
/// Cheap to clone; clones share topics and the underlying subscription.
#[derive(Clone)]
pub struct FrameDispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    bridge: EventBridge,
    topics: Mutex<HashMap<String, SubscriberRegistry<EncodedVideoFrame>>>,
    subscription: Mutex<Option<Disposer>>,
}

impl Inner {
    fn route(&self, event: VideoFrameEvent) {
        let topic = self.topics.lock().get(&event.key).cloned();
        match topic {
            Some(registry) => registry.notify_all(&event.frame),
            None => {
                tracing::trace!(key = %event.key, "Frame for key with no local stores; dropped");
            }
        }
    }
}

impl FrameDispatcher {
    pub fn new(bridge: EventBridge) -> Self {
        Self {
            inner: Arc::new(Inner {
                bridge,
                topics: Mutex::new(HashMap::new()),
                subscription: Mutex::new(None),
            }),
        }
    }

    /// Attach the single underlying channel subscription, if not yet attached
    ///
    /// Idempotent: later calls (and a racing concurrent attach) leave exactly
    /// one live subscription behind.
    pub async fn attach(&self) -> Result<(), BackendError> {
        if self.inner.subscription.lock().is_some() {
            return Ok(());
        }

        let router = Arc::clone(&self.inner);
        let disposer = self
            .inner
            .bridge
            .on_video_frame(move |event| router.route(event))
            .await?;

        let mut slot = self.inner.subscription.lock();
        if slot.is_some() {
            // Another attach won the race while we were subscribing
            let mut redundant = disposer;
            redundant.release();
        } else {
            *slot = Some(disposer);
            tracing::debug!("Frame dispatcher attached");
        }
        Ok(())
    }

    /// Release the underlying channel subscription
    ///
    /// Topic registrations survive; a later [`attach`](Self::attach) resumes
    /// routing to them.
    pub fn detach(&self) {
        if let Some(mut disposer) = self.inner.subscription.lock().take() {
            disposer.release();
            tracing::debug!("Frame dispatcher detached");
        }
    }

    /// Whether the underlying channel subscription is live
    pub fn is_attached(&self) -> bool {
        self.inner.subscription.lock().is_some()
    }

    /// Register a subscriber on the internal topic for `key`
    pub fn subscribe(&self, key: &str, subscriber: Subscriber<EncodedVideoFrame>) -> Disposer {
        self.inner
            .topics
            .lock()
            .entry(key.to_string())
            .or_default()
            .add(subscriber)
    }

    /// Number of keys with at least one registered topic
    pub fn topic_count(&self) -> usize {
        self.inner.topics.lock().len()
    }
}
