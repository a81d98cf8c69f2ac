//! Typed push-channel subscriptions
//!
//! Wraps the transport's raw `listen` with payload decoding. An event that
//! fails to decode is dropped with a warning: the push path has no caller to
//! propagate an error to, and one malformed event must not tear down a live
//! subscription.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::backend::{BackendError, EventHandler, Transport};
use crate::model::{TelemetryEvent, VideoFrameEvent, TELEMETRY_UPDATE, VIDEO_FRAME_UPDATE};

use super::disposer::Disposer;

/// Typed subscription facade over a [`Transport`]'s push channels
#[derive(Clone)]
pub struct EventBridge {
    transport: Arc<dyn Transport>,
}

impl EventBridge {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Attach a raw JSON handler to a named channel
    ///
    /// One call, one underlying subscription; the disposer cancels only that
    /// subscription, idempotently.
    pub async fn subscribe_raw(
        &self,
        channel: &str,
        handler: EventHandler,
    ) -> Result<Disposer, BackendError> {
        self.transport.listen(channel, handler).await
    }

    async fn subscribe_typed<T>(
        &self,
        channel: &'static str,
        on_event: impl Fn(T) + Send + Sync + 'static,
    ) -> Result<Disposer, BackendError>
    where
        T: DeserializeOwned,
    {
        self.subscribe_raw(
            channel,
            Arc::new(move |payload| match serde_json::from_value::<T>(payload) {
                Ok(event) => on_event(event),
                Err(err) => {
                    tracing::warn!(channel, error = %err, "Dropping undecodable push event");
                }
            }),
        )
        .await
    }

    /// Subscribe to telemetry pushes (all keys; filter on the envelope key)
    pub async fn on_telemetry(
        &self,
        on_event: impl Fn(TelemetryEvent) + Send + Sync + 'static,
    ) -> Result<Disposer, BackendError> {
        self.subscribe_typed(TELEMETRY_UPDATE, on_event).await
    }

    /// Subscribe to video frame pushes (all camera keys)
    pub async fn on_video_frame(
        &self,
        on_event: impl Fn(VideoFrameEvent) + Send + Sync + 'static,
    ) -> Result<Disposer, BackendError> {
        self.subscribe_typed(VIDEO_FRAME_UPDATE, on_event).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use crate::backend::FakeBackend;
    use crate::model::TelemetryRecord;

    use super::*;

    #[tokio::test]
    async fn test_typed_delivery() {
        let backend = Arc::new(FakeBackend::new());
        let bridge = EventBridge::new(backend.clone());

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let mut disposer = bridge
            .on_telemetry(move |event| {
                assert_eq!(event.key, "imu");
                assert_eq!(event.record.field_f64("gx"), 0.5);
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();

        backend.emit_telemetry_event("imu", TelemetryRecord::with_timestamp(1).field("gx", 0.5));
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        // After release no further events arrive
        disposer.release();
        backend.emit_telemetry_event("imu", TelemetryRecord::with_timestamp(2).field("gx", 0.7));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_undecodable_event_dropped() {
        let backend = Arc::new(FakeBackend::new());
        let bridge = EventBridge::new(backend.clone());

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let _disposer = bridge
            .on_telemetry(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();

        backend.emit_raw(TELEMETRY_UPDATE, json!({ "not": "an envelope" }));
        assert_eq!(seen.load(Ordering::SeqCst), 0);

        backend.emit_telemetry_event("imu", TelemetryRecord::with_timestamp(1));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_listen_propagates() {
        let backend = Arc::new(FakeBackend::new());
        backend.fail_channel(TELEMETRY_UPDATE);
        let bridge = EventBridge::new(backend);

        let result = bridge.on_telemetry(|_| {}).await;
        assert!(result.is_err());
    }
}
