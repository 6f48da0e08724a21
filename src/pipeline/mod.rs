//! Capture pipeline
//!
//! Turns raw depth captures into pose samples, one frame at a time:
//!
//! ```text
//! [DepthDevice] ──capture──► [BodyTracker] ──skeleton──► [extract] ──► [PublisherGate]
//! ```
//!
//! The loop runs on the session thread and stops at the frame limit, on
//! cancellation, or on the first failing collaborator call.

pub mod capture;
pub mod extractor;
pub mod state;

pub use capture::{CapturePipeline, CaptureSettings, FrameOutcome, LoopExit};
pub use extractor::{extract, PoseVector};
pub use state::{AbortReason, PipelineState};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative stop request shared between threads
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every holder of this flag to stop
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
