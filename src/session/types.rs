//! Session report types

use chrono::{DateTime, Utc};

use crate::pipeline::LoopExit;
use crate::types::{BackendChoice, CaptureStats};

/// How a session that did not fail came to an end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The configured number of frames was tracked
    FrameLimitReached,
    /// Cancelled, either while waiting for consumers or in the capture loop
    Cancelled,
}

impl SessionEnd {
    /// Display name for the outcome
    pub fn display_name(&self) -> &'static str {
        match self {
            SessionEnd::FrameLimitReached => "frame limit reached",
            SessionEnd::Cancelled => "cancelled",
        }
    }
}

impl From<LoopExit> for SessionEnd {
    fn from(exit: LoopExit) -> Self {
        match exit {
            LoopExit::FrameLimitReached => SessionEnd::FrameLimitReached,
            LoopExit::Cancelled => SessionEnd::Cancelled,
        }
    }
}

/// Summary of a completed session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    /// Tracking backend the session ran on
    pub backend: BackendChoice,
    /// Name of the published stream
    pub stream_name: String,
    /// Values per sample
    pub channel_count: usize,
    /// Declared sample rate hint (Hz)
    pub nominal_rate_hz: f64,
    /// When the session was started
    pub started_at: DateTime<Utc>,
    /// Capture loop counters
    pub stats: CaptureStats,
    /// How the session ended
    pub end: SessionEnd,
}

impl SessionReport {
    /// One-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "stream '{}' on {} backend: {} samples from {} tracked frames in {:.1}s ({:.1} Hz), {}",
            self.stream_name,
            self.backend,
            self.stats.samples_pushed,
            self.stats.frames_tracked,
            self.stats.elapsed.as_secs_f64(),
            self.stats.effective_sample_rate(),
            self.end.display_name()
        )
    }
}
