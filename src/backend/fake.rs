//! In-memory backend for tests and demos
//!
//! Implements the full operation surface of the native service against plain
//! in-memory state: per-key telemetry history with dynamic field-key
//! tracking, per-key video latest-frame state, and recording bookkeeping
//! (paths and counters only — actual disk IO belongs to the real producer).
//!
//! Two knobs exist purely to make timing questions testable:
//! - [`buffer_pre_subscription`](FakeBackend::buffer_pre_subscription)
//!   controls whether events emitted while a channel has no listeners are
//!   buffered and replayed to the first listener, or silently lost. Real
//!   producers differ here, and store `start()` has a narrow snapshot-to-
//!   subscribe gap whose outcome depends on it.
//! - [`latency`](FakeBackend::latency) makes every `invoke` suspend, so
//!   tests can interleave work into the gap.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bridge::Disposer;
use crate::model::{
    EncodedVideoFrame, RecordingStatus, TelemetryEvent, TelemetryRecord, VideoFrame,
    VideoFrameEvent, TELEMETRY_UPDATE, VIDEO_FRAME_UPDATE,
};

use super::error::BackendError;
use super::gateway::op;
use super::transport::{EventHandler, Transport};

/// Records retained per telemetry key before the oldest are discarded
const MAX_HISTORY: usize = 10_000;

#[derive(Default)]
struct TelemetryHistory {
    records: Vec<TelemetryRecord>,
    /// Field names in first-seen order
    field_keys: Vec<String>,
}

impl TelemetryHistory {
    fn push(&mut self, record: TelemetryRecord) {
        for key in record.fields.keys() {
            if !self.field_keys.contains(key) {
                self.field_keys.push(key.clone());
            }
        }
        self.records.push(record);
        if self.records.len() > MAX_HISTORY {
            self.records.remove(0);
        }
    }

    fn last_n(&self, n: usize) -> Vec<TelemetryRecord> {
        let start = self.records.len().saturating_sub(n);
        self.records[start..].to_vec()
    }
}

#[derive(Default)]
struct VideoState {
    latest: Option<EncodedVideoFrame>,
    frame_count: u64,
    recording: bool,
    path: Option<String>,
}

#[derive(Default)]
struct RecordingState {
    active: bool,
    path: Option<String>,
}

type ListenerMap = HashMap<String, HashMap<u64, EventHandler>>;

/// In-memory [`Transport`] implementation
pub struct FakeBackend {
    telemetry: Mutex<HashMap<String, TelemetryHistory>>,
    video: Mutex<HashMap<String, VideoState>>,
    recording: Mutex<RecordingState>,
    listeners: Arc<Mutex<ListenerMap>>,
    pending: Mutex<HashMap<String, Vec<Value>>>,
    next_listener_id: AtomicU64,
    buffer_pre_subscription: bool,
    latency: Option<Duration>,
    fail_ops: Mutex<HashSet<String>>,
    timeout_ops: Mutex<HashSet<String>>,
    fail_channels: Mutex<HashSet<String>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            telemetry: Mutex::new(HashMap::new()),
            video: Mutex::new(HashMap::new()),
            recording: Mutex::new(RecordingState::default()),
            listeners: Arc::new(Mutex::new(HashMap::new())),
            pending: Mutex::new(HashMap::new()),
            next_listener_id: AtomicU64::new(1),
            buffer_pre_subscription: false,
            latency: None,
            fail_ops: Mutex::new(HashSet::new()),
            timeout_ops: Mutex::new(HashSet::new()),
            fail_channels: Mutex::new(HashSet::new()),
        }
    }

    /// Buffer events emitted on a channel with no listeners and replay them
    /// to the first listener that attaches
    pub fn buffer_pre_subscription(mut self, enabled: bool) -> Self {
        self.buffer_pre_subscription = enabled;
        self
    }

    /// Suspend every `invoke` for `delay` before replying
    pub fn latency(mut self, delay: Duration) -> Self {
        self.latency = Some(delay);
        self
    }

    /// Make `operation` fail with [`BackendError::Rejected`]
    pub fn fail_operation(&self, operation: &str) {
        self.fail_ops.lock().insert(operation.to_string());
    }

    /// Make `operation` fail with [`BackendError::Timeout`]
    pub fn timeout_operation(&self, operation: &str) {
        self.timeout_ops.lock().insert(operation.to_string());
    }

    /// Stop failing `operation`
    pub fn restore_operation(&self, operation: &str) {
        self.fail_ops.lock().remove(operation);
        self.timeout_ops.lock().remove(operation);
    }

    /// Make `listen` on `channel` fail with [`BackendError::ChannelClosed`]
    pub fn fail_channel(&self, channel: &str) {
        self.fail_channels.lock().insert(channel.to_string());
    }

    /// Stop failing `listen` on `channel`
    pub fn restore_channel(&self, channel: &str) {
        self.fail_channels.lock().remove(channel);
    }

    /// Number of live listeners on `channel`
    pub fn listener_count(&self, channel: &str) -> usize {
        self.listeners.lock().get(channel).map_or(0, HashMap::len)
    }

    /// Emit a raw payload on `channel`
    ///
    /// With no listeners attached the payload is either buffered for replay
    /// or dropped, depending on `buffer_pre_subscription`.
    pub fn emit_raw(&self, channel: &str, payload: Value) {
        let handlers: Vec<EventHandler> = self
            .listeners
            .lock()
            .get(channel)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default();

        if handlers.is_empty() {
            if self.buffer_pre_subscription {
                self.pending
                    .lock()
                    .entry(channel.to_string())
                    .or_default()
                    .push(payload);
            } else {
                tracing::trace!(channel, "No listeners; event dropped");
            }
            return;
        }

        for handler in handlers {
            handler(payload.clone());
        }
    }

    /// Emit a telemetry push without touching stored history
    ///
    /// Lets tests create events that exist only on the wire, e.g. inside the
    /// snapshot-to-subscribe gap of a store `start()`.
    pub fn emit_telemetry_event(&self, key: &str, record: TelemetryRecord) {
        let event = TelemetryEvent {
            key: key.to_string(),
            record,
        };
        if let Ok(payload) = serde_json::to_value(&event) {
            self.emit_raw(TELEMETRY_UPDATE, payload);
        }
    }

    /// Emit a video frame push without touching stored state
    pub fn emit_video_event(&self, key: &str, frame: EncodedVideoFrame) {
        let event = VideoFrameEvent {
            key: key.to_string(),
            frame,
        };
        if let Ok(payload) = serde_json::to_value(&event) {
            self.emit_raw(VIDEO_FRAME_UPDATE, payload);
        }
    }

    fn status(&self) -> RecordingStatus {
        let telemetry = self.telemetry.lock();
        let video = self.video.lock();
        let recording = self.recording.lock();

        let mut telemetry_keys: Vec<String> = telemetry.keys().cloned().collect();
        telemetry_keys.sort();
        let telemetry_counts = telemetry
            .iter()
            .map(|(k, h)| (k.clone(), h.records.len()))
            .collect();

        let mut video_keys: Vec<String> = video.keys().cloned().collect();
        video_keys.sort();
        let mut video_recording_keys: Vec<String> = video
            .iter()
            .filter(|(_, s)| s.recording)
            .map(|(k, _)| k.clone())
            .collect();
        video_recording_keys.sort();
        let video_paths = video
            .iter()
            .filter_map(|(k, s)| s.path.clone().map(|p| (k.clone(), p)))
            .collect();
        let video_frame_counts = video
            .iter()
            .map(|(k, s)| (k.clone(), s.frame_count))
            .collect();

        RecordingStatus {
            telemetry_recording: recording.active,
            telemetry_path: recording.path.clone(),
            video_recording_keys,
            video_paths,
            telemetry_keys,
            telemetry_counts,
            video_keys,
            video_frame_counts,
        }
    }

    fn dispatch(&self, operation: &str, args: Value) -> Result<Value, BackendError> {
        match operation {
            op::SET_TELEMETRY => {
                let SetTelemetryArgs { key, data } = decode_args(operation, args)?;
                self.telemetry
                    .lock()
                    .entry(key.clone())
                    .or_default()
                    .push(data.clone());
                self.emit_telemetry_event(&key, data);
                reply(operation, format!("Telemetry set for key: {key}"))
            }
            op::GET_TELEMETRY => {
                let GetTelemetryArgs { key, count } = decode_args(operation, args)?;
                let telemetry = self.telemetry.lock();
                let records = match telemetry.get(&key) {
                    Some(history) => match count {
                        Some(n) => history.last_n(n),
                        None => history.records.clone(),
                    },
                    None => Vec::new(),
                };
                reply(operation, records)
            }
            op::GET_TELEMETRY_KEYS => {
                let mut keys: Vec<String> = self.telemetry.lock().keys().cloned().collect();
                keys.sort();
                reply(operation, keys)
            }
            op::GET_LATEST_TELEMETRY => {
                let KeyArgs { key } = decode_args(operation, args)?;
                let latest = self
                    .telemetry
                    .lock()
                    .get(&key)
                    .and_then(|h| h.records.last().cloned());
                reply(operation, latest)
            }
            op::GET_FIELD_KEYS => {
                let KeyArgs { key } = decode_args(operation, args)?;
                let keys = self
                    .telemetry
                    .lock()
                    .get(&key)
                    .map(|h| h.field_keys.clone())
                    .unwrap_or_default();
                reply(operation, keys)
            }
            op::GET_ALL_FIELD_KEYS => {
                let telemetry = self.telemetry.lock();
                let mut stream_keys: Vec<&String> = telemetry.keys().collect();
                stream_keys.sort();
                let mut all = Vec::new();
                for stream_key in stream_keys {
                    for field in &telemetry[stream_key].field_keys {
                        if !all.contains(field) {
                            all.push(field.clone());
                        }
                    }
                }
                reply(operation, all)
            }
            op::START_TELEMETRY_RECORDING => {
                let PathArgs { file_path } = decode_args(operation, args)?;
                let mut recording = self.recording.lock();
                if recording.active {
                    return Err(rejected(operation, "Recording already in progress"));
                }
                recording.active = true;
                recording.path = Some(file_path);
                reply(operation, "Telemetry recording started")
            }
            op::STOP_TELEMETRY_RECORDING => {
                let mut recording = self.recording.lock();
                if !recording.active {
                    return Err(rejected(operation, "No recording in progress"));
                }
                recording.active = false;
                let path = recording.path.clone().unwrap_or_default();
                reply(operation, path)
            }
            op::START_VIDEO_RECORDING => {
                let KeyPathArgs { key, file_path } = decode_args(operation, args)?;
                let mut video = self.video.lock();
                let stream = video.entry(key.clone()).or_default();
                if stream.recording {
                    return Err(rejected(operation, format!("Stream {key} already recording")));
                }
                stream.recording = true;
                stream.path = Some(file_path);
                stream.frame_count = 0;
                reply(operation, format!("Video recording started for stream: {key}"))
            }
            op::STOP_VIDEO_RECORDING => {
                let KeyArgs { key } = decode_args(operation, args)?;
                let mut video = self.video.lock();
                let stream = video
                    .get_mut(&key)
                    .ok_or_else(|| rejected(operation, format!("Stream {key} not found")))?;
                if !stream.recording {
                    return Err(rejected(operation, format!("Stream {key} not recording")));
                }
                stream.recording = false;
                let path = stream.path.clone().unwrap_or_default();
                reply(operation, (path, stream.frame_count))
            }
            op::STOP_ALL_VIDEO_RECORDINGS => {
                let mut video = self.video.lock();
                let mut stopped: HashMap<String, (String, u64)> = HashMap::new();
                for (key, stream) in video.iter_mut().filter(|(_, s)| s.recording) {
                    stream.recording = false;
                    stopped.insert(
                        key.clone(),
                        (stream.path.clone().unwrap_or_default(), stream.frame_count),
                    );
                }
                reply(operation, stopped)
            }
            op::GET_VIDEO_KEYS => {
                let mut keys: Vec<String> = self.video.lock().keys().cloned().collect();
                keys.sort();
                reply(operation, keys)
            }
            op::GET_LATEST_VIDEO_FRAME => {
                let KeyArgs { key } = decode_args(operation, args)?;
                let latest = self.video.lock().get(&key).and_then(|s| s.latest.clone());
                reply(operation, latest)
            }
            op::GET_RECORDING_STATUS => reply(operation, self.status()),
            op::CLEAR_TELEMETRY_KEY => {
                let KeyArgs { key } = decode_args(operation, args)?;
                if let Some(history) = self.telemetry.lock().get_mut(&key) {
                    history.records.clear();
                }
                reply(operation, format!("Data cleared for key: {key}"))
            }
            op::CLEAR_ALL_TELEMETRY => {
                self.telemetry.lock().clear();
                reply(operation, "All telemetry data cleared")
            }
            op::ADD_VIDEO_FRAME => {
                let AddFrameArgs { key, frame } = decode_args(operation, args)?;
                let encoded = frame.encode();
                {
                    let mut video = self.video.lock();
                    let stream = video.entry(key.clone()).or_default();
                    stream.frame_count += 1;
                    stream.latest = Some(encoded.clone());
                }
                self.emit_video_event(&key, encoded);
                reply(operation, format!("Video frame added to stream: {key}"))
            }
            other => Err(rejected(other, "unknown operation")),
        }
    }
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for FakeBackend {
    async fn invoke(&self, operation: &str, args: Value) -> Result<Value, BackendError> {
        if let Some(delay) = self.latency {
            tokio::time::sleep(delay).await;
        }
        if self.timeout_ops.lock().contains(operation) {
            return Err(BackendError::Timeout {
                operation: operation.to_string(),
            });
        }
        if self.fail_ops.lock().contains(operation) {
            return Err(rejected(operation, "injected failure"));
        }
        self.dispatch(operation, args)
    }

    async fn listen(&self, channel: &str, handler: EventHandler) -> Result<Disposer, BackendError> {
        if self.fail_channels.lock().contains(channel) {
            return Err(BackendError::ChannelClosed {
                channel: channel.to_string(),
            });
        }

        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .entry(channel.to_string())
            .or_default()
            .insert(id, Arc::clone(&handler));

        // Replay anything emitted before the first listener attached
        let replay = self.pending.lock().remove(channel).unwrap_or_default();
        for payload in replay {
            handler(payload);
        }

        let listeners = Arc::clone(&self.listeners);
        let channel = channel.to_string();
        Ok(Disposer::new(move || {
            if let Some(map) = listeners.lock().get_mut(&channel) {
                map.remove(&id);
            }
        }))
    }
}

fn rejected(operation: &str, message: impl Into<String>) -> BackendError {
    BackendError::Rejected {
        operation: operation.to_string(),
        message: message.into(),
    }
}

fn reply<T: Serialize>(operation: &str, value: T) -> Result<Value, BackendError> {
    serde_json::to_value(value).map_err(|source| BackendError::Decode {
        operation: operation.to_string(),
        source,
    })
}

fn decode_args<T: serde::de::DeserializeOwned>(
    operation: &str,
    args: Value,
) -> Result<T, BackendError> {
    serde_json::from_value(args)
        .map_err(|err| rejected(operation, format!("invalid arguments: {err}")))
}

#[derive(Deserialize)]
struct KeyArgs {
    key: String,
}

#[derive(Deserialize)]
struct PathArgs {
    file_path: String,
}

#[derive(Deserialize)]
struct KeyPathArgs {
    key: String,
    file_path: String,
}

#[derive(Deserialize)]
struct SetTelemetryArgs {
    key: String,
    data: TelemetryRecord,
}

#[derive(Deserialize)]
struct GetTelemetryArgs {
    key: String,
    count: Option<usize>,
}

#[derive(Deserialize)]
struct AddFrameArgs {
    key: String,
    frame: VideoFrame,
}
