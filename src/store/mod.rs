//! Per-key store orchestration
//!
//! A store ties the pieces together for one stream key: a bounded buffer, a
//! subscriber registry, and the lifecycle of one live channel subscription.
//!
//! ```text
//!                 start()
//!    ┌──────────────────────────────────────────────┐
//!    │ Gateway.get_telemetry / get_latest_video_frame │  historical snapshot
//!    └───────────────┬──────────────────────────────┘
//!                    ▼
//!            StreamBuffer.reseed ──► SubscriberRegistry.notify_all
//!                    │
//!                    ▼
//!            EventBridge / FrameDispatcher subscription (Disposer held)
//!                    │
//!        every push: ▼
//!            StreamBuffer.append ──► SubscriberRegistry.notify_all
//! ```
//!
//! `stop()` releases only the subscription; window and subscribers survive,
//! so a later `start()` re-seeds from a fresh snapshot with the old
//! subscribers still attached. Stores never share buffers or registries —
//! two stores on the same key are fully independent.

pub mod buffer;
pub mod dispatch;
pub mod error;
pub mod subscribers;
pub mod telemetry;
pub mod video;

pub use buffer::StreamBuffer;
pub use dispatch::FrameDispatcher;
pub use error::{ConfigError, StoreStartError};
pub use subscribers::{Subscriber, SubscriberRegistry};
pub use telemetry::TelemetryStore;
pub use video::VideoStore;

/// Lifecycle state of a store instance
///
/// All transitions happen inside `start()`/`stop()`; `Starting` is
/// observable because `start()` suspends at its backend calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    /// Created, never started
    Idle,
    /// `start()` in progress (snapshot fetch / subscription attach)
    Starting,
    /// Live subscription attached, ingesting pushes
    Active,
    /// Subscription released; data and subscribers retained
    Stopped,
}
