//! Device and tracker backends
//!
//! Everything the capture pipeline needs from the outside world besides the
//! stream outlet: the depth camera and the body tracking engine.
//!
//! # Components
//!
//! - [`DepthDevice`] - Depth camera driver (open, start, calibrate, capture)
//! - [`TrackerFactory`] / [`BodyTracker`] - Body tracking engine
//! - [`CaptureGuard`] / [`FrameGuard`] - Release captures and results exactly once
//! - [`select_backend`] - Accelerated-first tracker creation with baseline fallback
//! - [`MockDevice`] / [`MockTrackerFactory`] - Simulated hardware (feature-gated)

pub mod device_trait;
#[cfg(feature = "mock-device")]
pub mod mock_device;
pub mod negotiator;
pub mod tracker_trait;

pub use device_trait::{CaptureGuard, DepthDevice};
#[cfg(feature = "mock-device")]
pub use mock_device::{
    MockCapture, MockCounters, MockDevice, MockFrame, MockMotion, MockStep, MockTracker,
    MockTrackerFactory,
};
pub use negotiator::select_backend;
pub use tracker_trait::{BodyTracker, FrameGuard, TrackerFactory};
