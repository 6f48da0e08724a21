//! Capture pipeline states

use crate::error::PoseStreamError;

/// Why the pipeline stopped before its natural end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    CaptureFailed,
    SubmitFailed,
    PopFailed,
    AmbiguousBodyCount,
}

impl AbortReason {
    /// Category of a pipeline error, if it is one
    pub fn of(error: &PoseStreamError) -> Option<AbortReason> {
        match error.root() {
            PoseStreamError::CaptureFailed(_) => Some(AbortReason::CaptureFailed),
            PoseStreamError::SubmitFailed(_) => Some(AbortReason::SubmitFailed),
            PoseStreamError::PopFailed(_) => Some(AbortReason::PopFailed),
            PoseStreamError::AmbiguousBodyCount(_) => Some(AbortReason::AmbiguousBodyCount),
            _ => None,
        }
    }
}

/// Position of the pipeline within one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    /// Between frames
    #[default]
    Idle,
    /// Waiting for the device to deliver a capture
    CaptureRequested,
    /// Holding a raw capture
    CaptureReady,
    /// Capture handed to the tracker (and already released)
    Submitted,
    /// Holding a tracking result
    ResultReady,
    /// Body count checked, exactly one body present
    Validated,
    /// Pose vector filled (tracking result already released)
    Extracted,
    /// Sample handed to the outlet
    Emitted,
    /// Terminal failure
    Aborted(AbortReason),
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Aborted(_))
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "Idle"),
            PipelineState::CaptureRequested => write!(f, "CaptureRequested"),
            PipelineState::CaptureReady => write!(f, "CaptureReady"),
            PipelineState::Submitted => write!(f, "Submitted"),
            PipelineState::ResultReady => write!(f, "ResultReady"),
            PipelineState::Validated => write!(f, "Validated"),
            PipelineState::Extracted => write!(f, "Extracted"),
            PipelineState::Emitted => write!(f, "Emitted"),
            PipelineState::Aborted(reason) => write!(f, "Aborted({:?})", reason),
        }
    }
}
