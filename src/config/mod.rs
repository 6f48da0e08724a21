//! Configuration module for posestream-rs
//!
//! Every setting has a default, so the bridge runs without a configuration
//! file. When a file is given it is TOML, with one table per concern:
//!
//! ```toml
//! [device]
//! device_index = 0
//! depth_mode = "nfov_2x2_binned"
//! camera_fps = "fps30"
//!
//! [tracker]
//! policy = "prefer_accelerated"
//!
//! [stream]
//! name = "Azure-Kinect"
//! content_type = "MoCap"
//!
//! [capture]
//! frame_limit = 100
//!
//! [logging]
//! filter = "info,posestream_rs=debug"
//! ```
//!
//! # Config Location
//!
//! Without an explicit path the file is looked up in the platform config
//! directory under `posestream-rs/config.toml`:
//!
//! - **Linux**: `~/.config/posestream-rs/`
//! - **macOS**: `~/Library/Application Support/posestream-rs/`
//! - **Windows**: `%APPDATA%\posestream-rs\`

use crate::error::{PoseStreamError, Result};
use crate::joints::JointTable;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "posestream-rs";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// Sample-rate hint advertised when the accelerated backend is active
pub const DEFAULT_ACCELERATED_RATE_HZ: f64 = 10.0;

/// Sample-rate hint advertised when the baseline backend is active
pub const DEFAULT_BASELINE_RATE_HZ: f64 = 4.0;

/// Poll interval while waiting for the first consumer, in milliseconds
pub const DEFAULT_CONSUMER_POLL_MS: u64 = 1200;

/// Seconds of data the outlet buffers for slow consumers
pub const DEFAULT_MAX_BUFFERED_SECS: u32 = 60;

// ==================== Config Directory ====================

/// Get the application config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Get the path to the default config file
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== App Config ====================

/// Complete configuration of a capture session
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    /// Depth device settings
    #[serde(default)]
    pub device: DeviceConfig,

    /// Body tracker settings
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Outgoing stream settings
    #[serde(default)]
    pub stream: StreamConfig,

    /// Capture loop settings
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PoseStreamError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        Self::from_toml_str(&content).map_err(|e| {
            PoseStreamError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    /// Load the given file, or the default location, or fall back to defaults
    ///
    /// An explicitly given path must exist; the default location is optional.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match default_config_path() {
            Some(path) if path.exists() => {
                tracing::info!("Loading configuration from {:?}", path);
                Self::load(path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Save configuration to disk as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PoseStreamError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| PoseStreamError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            PoseStreamError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }

    /// Check settings that serde cannot check on its own
    pub fn validate(&self) -> Result<()> {
        self.joint_table()?;

        if self.stream.name.trim().is_empty() {
            return Err(PoseStreamError::Config("stream name must not be empty".to_string()));
        }
        if self.stream.accelerated_rate_hz < 0.0 || self.stream.baseline_rate_hz < 0.0 {
            return Err(PoseStreamError::Config(
                "sample-rate hints must not be negative".to_string(),
            ));
        }
        if self.stream.consumer_poll_ms == 0 {
            return Err(PoseStreamError::Config(
                "consumer_poll_ms must be greater than zero".to_string(),
            ));
        }
        if self.capture.frame_limit == Some(0) {
            return Err(PoseStreamError::Config(
                "frame_limit must be greater than zero when set".to_string(),
            ));
        }
        Ok(())
    }

    /// The joint table this configuration publishes
    pub fn joint_table(&self) -> Result<JointTable> {
        match &self.stream.joints {
            Some(names) => JointTable::from_names(names),
            None => Ok(JointTable::full_body()),
        }
    }
}

// ==================== Device Config ====================

/// Depth device configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DeviceConfig {
    /// Index of the device to open
    pub device_index: u32,

    /// Depth sensor mode
    pub depth_mode: DepthMode,

    /// Camera frame rate
    pub camera_fps: CameraFps,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            depth_mode: DepthMode::Nfov2x2Binned,
            camera_fps: CameraFps::Fps30,
        }
    }
}

/// Depth sensor modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DepthMode {
    /// Narrow field of view, 2x2 binned (320x288)
    #[default]
    #[serde(rename = "nfov_2x2_binned")]
    Nfov2x2Binned,
    /// Narrow field of view, unbinned (640x576)
    NfovUnbinned,
    /// Wide field of view, 2x2 binned (512x512)
    #[serde(rename = "wfov_2x2_binned")]
    Wfov2x2Binned,
    /// Wide field of view, unbinned (1024x1024)
    WfovUnbinned,
}

impl DepthMode {
    /// Depth image resolution (width, height)
    pub fn resolution(&self) -> (u32, u32) {
        match self {
            DepthMode::Nfov2x2Binned => (320, 288),
            DepthMode::NfovUnbinned => (640, 576),
            DepthMode::Wfov2x2Binned => (512, 512),
            DepthMode::WfovUnbinned => (1024, 1024),
        }
    }
}

impl std::fmt::Display for DepthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DepthMode::Nfov2x2Binned => write!(f, "NFOV 2x2 binned"),
            DepthMode::NfovUnbinned => write!(f, "NFOV unbinned"),
            DepthMode::Wfov2x2Binned => write!(f, "WFOV 2x2 binned"),
            DepthMode::WfovUnbinned => write!(f, "WFOV unbinned"),
        }
    }
}

/// Camera frame rate options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CameraFps {
    Fps5,
    Fps15,
    #[default]
    Fps30,
}

impl CameraFps {
    pub fn hz(&self) -> u32 {
        match self {
            CameraFps::Fps5 => 5,
            CameraFps::Fps15 => 15,
            CameraFps::Fps30 => 30,
        }
    }
}

// ==================== Tracker Config ====================

/// Which tracking backends the negotiator may try
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendPolicy {
    /// Try the accelerated backend, fall back to the baseline backend
    #[default]
    PreferAccelerated,
    /// Only try the baseline backend
    BaselineOnly,
}

/// Body tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct TrackerConfig {
    /// Backend negotiation policy
    pub policy: BackendPolicy,
}

// ==================== Stream Config ====================

/// Outgoing stream configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamConfig {
    /// Stream name consumers resolve
    pub name: String,

    /// Content type tag
    pub content_type: String,

    /// Unique source identifier, lets consumers recover after a restart
    pub source_id: String,

    /// Manufacturer metadata field
    pub manufacturer: String,

    /// Model metadata field
    pub model: String,

    /// Advertised sample rate with the accelerated backend
    pub accelerated_rate_hz: f64,

    /// Advertised sample rate with the baseline backend
    pub baseline_rate_hz: f64,

    /// Poll interval while waiting for consumers, in milliseconds
    pub consumer_poll_ms: u64,

    /// Seconds of samples the outlet may buffer
    pub max_buffered_secs: u32,

    /// Joints to publish, by name, in channel order (all joints when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joints: Option<Vec<String>>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            name: "Azure-Kinect".to_string(),
            content_type: "MoCap".to_string(),
            source_id: "325wqer4354".to_string(),
            manufacturer: "University of Groningen".to_string(),
            model: "Azure Kinect".to_string(),
            accelerated_rate_hz: DEFAULT_ACCELERATED_RATE_HZ,
            baseline_rate_hz: DEFAULT_BASELINE_RATE_HZ,
            consumer_poll_ms: DEFAULT_CONSUMER_POLL_MS,
            max_buffered_secs: DEFAULT_MAX_BUFFERED_SECS,
            joints: None,
        }
    }
}

// ==================== Capture Config ====================

/// Capture loop configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct CaptureConfig {
    /// Stop after this many tracked frames; run until cancelled when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_limit: Option<u64>,

    /// Capture wait timeout in milliseconds; wait forever when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_timeout_ms: Option<u64>,
}

// ==================== Logging Config ====================

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directives, overridden by `RUST_LOG`
    pub filter: String,

    /// Also write logs to this file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,posestream_rs=debug".to_string(),
            log_file: None,
        }
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joints::JointId;

    #[test]
    fn test_defaults_match_reference_stream() {
        let config = AppConfig::default();
        assert_eq!(config.stream.name, "Azure-Kinect");
        assert_eq!(config.stream.content_type, "MoCap");
        assert_eq!(config.stream.accelerated_rate_hz, 10.0);
        assert_eq!(config.stream.baseline_rate_hz, 4.0);
        assert_eq!(config.device.depth_mode, DepthMode::Nfov2x2Binned);
        assert_eq!(config.device.camera_fps.hz(), 30);
        assert!(config.capture.frame_limit.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [capture]
            frame_limit = 100

            [tracker]
            policy = "baseline_only"
            "#,
        )
        .unwrap();

        assert_eq!(config.capture.frame_limit, Some(100));
        assert_eq!(config.tracker.policy, BackendPolicy::BaselineOnly);
        assert_eq!(config.stream, StreamConfig::default());
    }

    #[test]
    fn test_depth_mode_names() {
        let config = AppConfig::from_toml_str(
            r#"
            [device]
            depth_mode = "wfov_unbinned"
            camera_fps = "fps15"
            "#,
        )
        .unwrap();
        assert_eq!(config.device.depth_mode, DepthMode::WfovUnbinned);
        assert_eq!(config.device.depth_mode.resolution(), (1024, 1024));
        assert_eq!(config.device.camera_fps, CameraFps::Fps15);
    }

    #[test]
    fn test_joint_subset() {
        let config = AppConfig::from_toml_str(
            r#"
            [stream]
            joints = ["HEAD", "NECK"]
            "#,
        )
        .unwrap();
        let table = config.joint_table().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.joint_specs()[0].id, JointId::Head);
    }

    #[test]
    fn test_invalid_configs_rejected() {
        assert!(AppConfig::from_toml_str("[stream]\njoints = [\"WING\"]").is_err());
        assert!(AppConfig::from_toml_str("[stream]\nconsumer_poll_ms = 0").is_err());
        assert!(AppConfig::from_toml_str("[capture]\nframe_limit = 0").is_err());
        assert!(AppConfig::from_toml_str("[stream]\nname = \"  \"").is_err());
        assert!(AppConfig::from_toml_str("[device]\ndepth_mode = \"passive_ir\"").is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let mut config = AppConfig::default();
        config.capture.frame_limit = Some(250);
        config.stream.joints = Some(vec!["PELVIS".to_string(), "HEAD".to_string()]);
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let err = AppConfig::load_or_default(Some(&missing)).unwrap_err();
        assert!(matches!(err, PoseStreamError::Config(_)));
    }
}
