//! Recording status snapshot

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Snapshot of backend recording state
///
/// Rebuilt on demand by the backend on every `get_recording_status` call;
/// the store layer never caches it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordingStatus {
    /// Whether unified telemetry recording is active
    pub telemetry_recording: bool,
    /// Target path of the unified telemetry recording, if active
    pub telemetry_path: Option<String>,
    /// Video keys currently recording
    pub video_recording_keys: Vec<String>,
    /// Target path per recording video key
    pub video_paths: HashMap<String, String>,
    /// All known telemetry keys
    pub telemetry_keys: Vec<String>,
    /// Retained record count per telemetry key
    pub telemetry_counts: HashMap<String, usize>,
    /// All known video keys
    pub video_keys: Vec<String>,
    /// Frames seen per video key
    pub video_frame_counts: HashMap<String, u64>,
}
