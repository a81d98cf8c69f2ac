//! Typed request/response wrappers over the transport
//!
//! Every method is a thin shim: build the args object, invoke the named
//! operation, decode the reply. Decode failures surface as
//! [`BackendError::Decode`]; nothing here retries.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::model::{EncodedVideoFrame, RecordingStatus, TelemetryRecord, VideoFrame};

use super::error::BackendError;
use super::transport::Transport;

/// Remote operation names
pub mod op {
    pub const SET_TELEMETRY: &str = "set_telemetry";
    pub const GET_TELEMETRY: &str = "get_telemetry";
    pub const GET_TELEMETRY_KEYS: &str = "get_telemetry_keys";
    pub const GET_LATEST_TELEMETRY: &str = "get_latest_telemetry";
    pub const GET_FIELD_KEYS: &str = "get_field_keys";
    pub const GET_ALL_FIELD_KEYS: &str = "get_all_field_keys";
    pub const START_TELEMETRY_RECORDING: &str = "start_unified_telemetry_recording";
    pub const STOP_TELEMETRY_RECORDING: &str = "stop_unified_telemetry_recording";
    pub const START_VIDEO_RECORDING: &str = "start_video_recording";
    pub const STOP_VIDEO_RECORDING: &str = "stop_video_recording";
    pub const STOP_ALL_VIDEO_RECORDINGS: &str = "stop_all_video_recordings";
    pub const GET_VIDEO_KEYS: &str = "get_video_keys";
    pub const GET_LATEST_VIDEO_FRAME: &str = "get_latest_video_frame";
    pub const GET_RECORDING_STATUS: &str = "get_recording_status";
    pub const CLEAR_TELEMETRY_KEY: &str = "clear_telemetry_key";
    pub const CLEAR_ALL_TELEMETRY: &str = "clear_all_telemetry";
    pub const ADD_VIDEO_FRAME: &str = "add_video_frame";
}

/// Typed facade over a [`Transport`]
///
/// Cheap to clone; clones share the same underlying connection.
#[derive(Clone)]
pub struct Gateway {
    transport: Arc<dyn Transport>,
}

impl Gateway {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Access the underlying transport (shared with the event bridge)
    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    /// Invoke `operation` and decode the reply into `T`
    async fn call<T: DeserializeOwned>(
        &self,
        operation: &str,
        args: Value,
    ) -> Result<T, BackendError> {
        let reply = self.transport.invoke(operation, args).await?;
        serde_json::from_value(reply).map_err(|source| BackendError::Decode {
            operation: operation.to_string(),
            source,
        })
    }

    /// Push one telemetry record for `key` into the backend
    pub async fn set_telemetry(
        &self,
        key: &str,
        record: &TelemetryRecord,
    ) -> Result<String, BackendError> {
        self.call(op::SET_TELEMETRY, json!({ "key": key, "data": record }))
            .await
    }

    /// Fetch the historical snapshot for `key`
    ///
    /// `count` limits the result to the most recent N records; `None` fetches
    /// everything the backend retains.
    pub async fn get_telemetry(
        &self,
        key: &str,
        count: Option<usize>,
    ) -> Result<Vec<TelemetryRecord>, BackendError> {
        self.call(op::GET_TELEMETRY, json!({ "key": key, "count": count }))
            .await
    }

    pub async fn get_telemetry_keys(&self) -> Result<Vec<String>, BackendError> {
        self.call(op::GET_TELEMETRY_KEYS, json!({})).await
    }

    pub async fn get_latest_telemetry(
        &self,
        key: &str,
    ) -> Result<Option<TelemetryRecord>, BackendError> {
        self.call(op::GET_LATEST_TELEMETRY, json!({ "key": key })).await
    }

    /// Field names seen so far on one telemetry stream
    pub async fn get_field_keys(&self, key: &str) -> Result<Vec<String>, BackendError> {
        self.call(op::GET_FIELD_KEYS, json!({ "key": key })).await
    }

    /// Union of field names across all telemetry streams
    pub async fn get_all_field_keys(&self) -> Result<Vec<String>, BackendError> {
        self.call(op::GET_ALL_FIELD_KEYS, json!({})).await
    }

    /// Start recording every telemetry stream into one unified file
    pub async fn start_telemetry_recording(
        &self,
        file_path: &str,
    ) -> Result<String, BackendError> {
        self.call(op::START_TELEMETRY_RECORDING, json!({ "file_path": file_path }))
            .await
    }

    pub async fn stop_telemetry_recording(&self) -> Result<String, BackendError> {
        self.call(op::STOP_TELEMETRY_RECORDING, json!({})).await
    }

    pub async fn start_video_recording(
        &self,
        key: &str,
        file_path: &str,
    ) -> Result<String, BackendError> {
        self.call(
            op::START_VIDEO_RECORDING,
            json!({ "key": key, "file_path": file_path }),
        )
        .await
    }

    /// Stop recording one video stream; returns `(path, frames_written)`
    pub async fn stop_video_recording(&self, key: &str) -> Result<(String, u64), BackendError> {
        self.call(op::STOP_VIDEO_RECORDING, json!({ "key": key })).await
    }

    /// Stop every active video recording; returns `(path, frames)` per key
    pub async fn stop_all_video_recordings(
        &self,
    ) -> Result<HashMap<String, (String, u64)>, BackendError> {
        self.call(op::STOP_ALL_VIDEO_RECORDINGS, json!({})).await
    }

    pub async fn get_video_keys(&self) -> Result<Vec<String>, BackendError> {
        self.call(op::GET_VIDEO_KEYS, json!({})).await
    }

    pub async fn get_latest_video_frame(
        &self,
        key: &str,
    ) -> Result<Option<EncodedVideoFrame>, BackendError> {
        self.call(op::GET_LATEST_VIDEO_FRAME, json!({ "key": key })).await
    }

    pub async fn get_recording_status(&self) -> Result<RecordingStatus, BackendError> {
        self.call(op::GET_RECORDING_STATUS, json!({})).await
    }

    pub async fn clear_telemetry_key(&self, key: &str) -> Result<String, BackendError> {
        self.call(op::CLEAR_TELEMETRY_KEY, json!({ "key": key })).await
    }

    pub async fn clear_all_telemetry(&self) -> Result<String, BackendError> {
        self.call(op::CLEAR_ALL_TELEMETRY, json!({})).await
    }

    /// Inject a raw capture frame for `key` (producer-side path)
    pub async fn add_video_frame(
        &self,
        key: &str,
        frame: &VideoFrame,
    ) -> Result<String, BackendError> {
        self.call(op::ADD_VIDEO_FRAME, json!({ "key": key, "frame": frame }))
            .await
    }
}
