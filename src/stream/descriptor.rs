//! Stream descriptor construction
//!
//! The descriptor declares the shape of every sample the outlet will carry.
//! It is derived from the [`JointTable`] so that channel labels line up with
//! the pose vector slots written by the extractor.

use serde::Serialize;

use crate::config::StreamConfig;
use crate::error::{PoseStreamError, Result};
use crate::joints::JointTable;
use crate::types::BackendChoice;

/// Values published per joint: position xyz + orientation wxyz
pub const CHANNELS_PER_JOINT: usize = 7;

/// Label suffixes of the per-joint channels, in sample order
pub const CHANNEL_SUFFIXES: [&str; CHANNELS_PER_JOINT] =
    ["_posx", "_posy", "_posz", "_oriw", "_orix", "_oriy", "_oriz"];

/// Unit of the position channels
pub const POSITION_UNIT: &str = "mm";

/// Unit of the orientation channels
pub const ORIENTATION_UNIT: &str = "quaternion";

/// Numeric format of every channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelFormat {
    Float32,
}

/// What a channel measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Position,
    Orientation,
}

/// Metadata of one channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelInfo {
    pub label: String,
    pub unit: &'static str,
    pub kind: ChannelKind,
}

/// Declared shape and metadata of the outgoing stream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamDescriptor {
    pub name: String,
    pub content_type: String,
    pub channel_count: usize,
    /// Advisory only; samples are pushed as fast as frames are tracked
    pub nominal_rate_hz: f64,
    pub channel_format: ChannelFormat,
    pub source_id: String,
    pub channels: Vec<ChannelInfo>,
    /// Free-form descriptive fields, in insertion order
    pub metadata: Vec<(String, String)>,
    /// Seconds of data the outlet may buffer
    pub max_buffered_secs: u32,
}

impl StreamDescriptor {
    /// Check the channel layout against the joint table it was built from
    pub fn validate(&self, table: &JointTable) -> Result<()> {
        let expected = CHANNELS_PER_JOINT * table.len();
        if self.channel_count != expected {
            return Err(PoseStreamError::LayoutMismatch {
                expected,
                actual: self.channel_count,
            });
        }
        if self.channels.len() != self.channel_count {
            return Err(PoseStreamError::LayoutMismatch {
                expected: self.channel_count,
                actual: self.channels.len(),
            });
        }
        Ok(())
    }

    /// Look up a metadata field
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Channel labels in sample order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(|c| c.label.as_str())
    }

    /// Render the descriptor as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Sample-rate hint advertised for a backend
pub fn rate_hint(backend: BackendChoice, config: &StreamConfig) -> f64 {
    match backend {
        BackendChoice::Accelerated => config.accelerated_rate_hz,
        BackendChoice::Baseline => config.baseline_rate_hz,
    }
}

/// Build the descriptor for `table` as published with `backend`
pub fn build_descriptor(
    table: &JointTable,
    backend: BackendChoice,
    config: &StreamConfig,
) -> StreamDescriptor {
    let mut channels = Vec::with_capacity(CHANNELS_PER_JOINT * table.len());
    for spec in table.iter() {
        for (i, suffix) in CHANNEL_SUFFIXES.iter().enumerate() {
            let (unit, kind) = if i < 3 {
                (POSITION_UNIT, ChannelKind::Position)
            } else {
                (ORIENTATION_UNIT, ChannelKind::Orientation)
            };
            channels.push(ChannelInfo {
                label: format!("{}{}", spec.name, suffix),
                unit,
                kind,
            });
        }
    }

    let metadata = vec![
        ("manufacturer".to_string(), config.manufacturer.clone()),
        ("model".to_string(), config.model.clone()),
        ("backend".to_string(), backend.label().to_string()),
    ];

    StreamDescriptor {
        name: config.name.clone(),
        content_type: config.content_type.clone(),
        channel_count: channels.len(),
        nominal_rate_hz: rate_hint(backend, config),
        channel_format: ChannelFormat::Float32,
        source_id: config.source_id.clone(),
        channels,
        metadata,
        max_buffered_secs: config.max_buffered_secs,
    }
}
