//! Reactive distribution layer for telemetry and video streams
//!
//! The backend service owns the data: per-key telemetry histories, the latest
//! frame per camera, and recording state. This crate is the consumer-side
//! plumbing that turns that remote state into live, bounded, subscribable
//! per-key windows.
//!
//! # Architecture
//!
//! ```text
//!                       Arc<dyn Transport>
//!                (request/response + push channels)
//!                  ┌──────────┴──────────┐
//!                  │                     │
//!                  ▼                     ▼
//!              [Gateway]           [EventBridge]
//!           typed invoke()        typed channel subs
//!                  │                     │
//!                  │          ┌──────────┴──────────┐
//!                  │          │                     │
//!                  ▼          ▼                     ▼
//!          [TelemetryStore]            [FrameDispatcher]
//!          snapshot + live               one channel sub,
//!          key-filtered window           per-key topics
//!                  │                           │
//!                  ▼                           ▼
//!          subscribers (sync fan-out)    [VideoStore] ──► subscribers
//! ```
//!
//! # Lifecycle
//!
//! A store is created `Idle`. `start()` fetches a historical snapshot through
//! the [`Gateway`](backend::Gateway), seeds the bounded window, then attaches
//! a live push subscription; every subsequent push for the store's key
//! appends to the window and fans out synchronously. `stop()` releases only
//! the subscription — window contents and subscribers survive, and a later
//! `start()` re-seeds from scratch. `refresh()` re-fetches out of band for
//! recovery while stopped.
//!
//! All subscription handles are [`Disposer`](bridge::Disposer)s: release is
//! explicit and idempotent, and dropping one without releasing leaks the
//! registration on purpose.

pub mod backend;
pub mod bridge;
pub mod model;
pub mod store;

pub use backend::{BackendError, EventHandler, FakeBackend, Gateway, Transport};
pub use bridge::{Disposer, DisposerSet, EventBridge};
pub use model::{
    EncodedVideoFrame, FieldValue, FrameFormat, RecordingStatus, TelemetryEvent, TelemetryRecord,
    VideoFrame, VideoFrameEvent, TELEMETRY_UPDATE, VIDEO_FRAME_UPDATE,
};
pub use store::{
    ConfigError, FrameDispatcher, StoreStartError, StoreState, StreamBuffer, Subscriber,
    SubscriberRegistry, TelemetryStore, VideoStore,
};
