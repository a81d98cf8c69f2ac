//! Data model shared across the gateway, bridge, and store layers
//!
//! Records and frames are immutable once created: the stores clone them into
//! their windows and hand out further clones to subscribers.

pub mod event;
pub mod frame;
pub mod record;
pub mod status;

pub use event::{TelemetryEvent, VideoFrameEvent, TELEMETRY_UPDATE, VIDEO_FRAME_UPDATE};
pub use frame::{EncodedVideoFrame, FrameFormat, VideoFrame};
pub use record::{FieldValue, TelemetryRecord};
pub use status::RecordingStatus;
