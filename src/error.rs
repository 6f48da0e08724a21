//! Error handling for the pose streaming bridge
//!
//! This module defines the error taxonomy of a capture session and a Result
//! alias for use throughout the crate. Setup errors (device, calibration,
//! tracker backend, stream) are fatal at startup; pipeline errors end the
//! session after all held resources have been released.

use thiserror::Error;

/// Main error type for pose streaming operations
#[derive(Error, Debug)]
pub enum PoseStreamError {
    /// The depth device could not be opened or its cameras could not be started
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The device did not provide sensor calibration
    #[error("Calibration unavailable: {0}")]
    CalibrationUnavailable(String),

    /// The tracking engine could not be created on one backend
    #[error("Tracker creation failed: {0}")]
    TrackerCreation(String),

    /// Neither tracking backend could be created
    #[error("No body tracking backend available (accelerated: {accelerated}; baseline: {baseline})")]
    BackendUnavailable { accelerated: String, baseline: String },

    /// Waiting for a raw capture returned something other than a capture
    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    /// The tracker refused a capture
    #[error("Submitting capture to tracker failed: {0}")]
    SubmitFailed(String),

    /// The tracker did not hand back a tracking result
    #[error("Popping tracking result failed: {0}")]
    PopFailed(String),

    /// More than one body was tracked in a single frame
    #[error("Ambiguous body count: {0} bodies tracked, exactly one is supported")]
    AmbiguousBodyCount(usize),

    /// Stream metadata and the pose vector layout disagree
    #[error("Channel layout mismatch: expected {expected} channels, found {actual}")]
    LayoutMismatch { expected: usize, actual: usize },

    /// The streaming transport could not create the outlet
    #[error("Stream unavailable: {0}")]
    StreamUnavailable(String),

    /// The session worker thread panicked
    #[error("Session thread panicked: {0}")]
    ThreadPanicked(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PoseStreamError>,
    },
}

impl PoseStreamError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PoseStreamError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The error without any context wrappers
    pub fn root(&self) -> &PoseStreamError {
        match self {
            PoseStreamError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the error happened while bringing the session up
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self.root(),
            PoseStreamError::DeviceUnavailable(_)
                | PoseStreamError::CalibrationUnavailable(_)
                | PoseStreamError::TrackerCreation(_)
                | PoseStreamError::BackendUnavailable { .. }
                | PoseStreamError::LayoutMismatch { .. }
                | PoseStreamError::StreamUnavailable(_)
        )
    }

    /// Process exit status for this error. Never zero.
    pub fn exit_code(&self) -> i32 {
        match self.root() {
            PoseStreamError::Config(_) | PoseStreamError::Serialization(_) => 78,
            PoseStreamError::AmbiguousBodyCount(_) => 3,
            PoseStreamError::CaptureFailed(_)
            | PoseStreamError::SubmitFailed(_)
            | PoseStreamError::PopFailed(_) => 4,
            e if e.is_setup_error() => 2,
            _ => 1,
        }
    }
}

impl From<toml::de::Error> for PoseStreamError {
    fn from(err: toml::de::Error) -> Self {
        PoseStreamError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for PoseStreamError {
    fn from(err: serde_json::Error) -> Self {
        PoseStreamError::Serialization(err.to_string())
    }
}

/// Result type alias for pose streaming operations
pub type Result<T> = std::result::Result<T, PoseStreamError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
