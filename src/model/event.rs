//! Push-event channels and payload envelopes
//!
//! The backend pushes over two channels, each shared by every stream key.
//! Payloads are key-tagged envelopes: the record/frame shape is identical
//! across keys, so without the tag a consumer cannot tell which stream an
//! event belongs to (the classic wrong-camera bug). Routing on the envelope
//! key is what keeps multiple simultaneous stores honest.

use serde::{Deserialize, Serialize};

use super::frame::EncodedVideoFrame;
use super::record::TelemetryRecord;

/// Channel carrying [`TelemetryEvent`] payloads for all telemetry keys
pub const TELEMETRY_UPDATE: &str = "telemetry-update";

/// Channel carrying [`VideoFrameEvent`] payloads for all camera keys
pub const VIDEO_FRAME_UPDATE: &str = "video-frame-update";

/// A telemetry record pushed for one stream key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub key: String,
    pub record: TelemetryRecord,
}

/// A video frame pushed for one camera key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoFrameEvent {
    pub key: String,
    pub frame: EncodedVideoFrame,
}
