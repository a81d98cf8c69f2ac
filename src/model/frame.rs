//! Video frame types
//!
//! Producers hand the backend raw frames ([`VideoFrame`], payload in `Bytes`
//! so clones are reference-counted, not copied). Everything UI-facing uses
//! the base64 wire form ([`EncodedVideoFrame`]); the store layer treats that
//! form as canonical and never decodes it — turning it back into pixels is
//! the renderer's job.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Pixel/container format of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameFormat {
    Jpeg,
    Png,
    /// Uncompressed 8-bit RGB, pixel by pixel
    Raw,
}

impl std::fmt::Display for FrameFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameFormat::Jpeg => write!(f, "jpeg"),
            FrameFormat::Png => write!(f, "png"),
            FrameFormat::Raw => write!(f, "raw"),
        }
    }
}

/// A raw video frame as produced by a capture source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoFrame {
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    pub width: u32,
    pub height: u32,
    pub format: FrameFormat,
    /// Frame payload (zero-copy via reference counting)
    pub data: Bytes,
}

impl VideoFrame {
    pub fn new(timestamp: u64, width: u32, height: u32, format: FrameFormat, data: Bytes) -> Self {
        Self {
            timestamp,
            width,
            height,
            format,
            data,
        }
    }

    /// Encode into the canonical UI-facing wire form
    pub fn encode(&self) -> EncodedVideoFrame {
        EncodedVideoFrame {
            timestamp: self.timestamp,
            width: self.width,
            height: self.height,
            format: self.format,
            data_base64: STANDARD.encode(&self.data),
        }
    }
}

/// A video frame with its payload base64-encoded for UI consumption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedVideoFrame {
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    pub width: u32,
    pub height: u32,
    pub format: FrameFormat,
    pub data_base64: String,
}
