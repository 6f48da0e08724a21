//! Mock Depth Device and Body Tracker for Testing
//!
//! This module provides a simulated depth camera and a matching body tracker
//! so the whole capture session can run without hardware or a tracking
//! runtime.
//!
//! # Modes
//!
//! - **Scripted**: [`MockDevice::scripted`] plays back a fixed list of
//!   [`MockStep`]s, one per capture request. Each step decides what the
//!   tracker will later report for that capture (bodies, or a failure at a
//!   specific pipeline stage). Once the script runs out, captures fail.
//! - **Synthetic**: [`MockDevice::synthetic`] produces an endless stream of
//!   captures paced at the camera frame rate, each showing one body whose
//!   joints sway along a [`MockMotion`] pattern.
//!
//! # Resource accounting
//!
//! Device and tracker share a [`MockCounters`] handle that counts every
//! acquisition and release, plus the teardown calls. Tests use it to check
//! that nothing leaks on any exit path.
//!
//! # Enabling
//!
//! Only available with the `mock-device` feature (on by default):
//!
//! ```bash
//! cargo run --features mock-device
//! ```

use crate::backend::device_trait::DepthDevice;
use crate::backend::tracker_trait::{BodyTracker, TrackerFactory};
use crate::config::DeviceConfig;
use crate::error::{PoseStreamError, Result};
use crate::joints::JointId;
use crate::types::{
    BackendChoice, Calibration, JointPose, Quaternion, Skeleton, Vec3, WaitResult, WaitTimeout,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What happens to one scripted capture
#[derive(Debug, Clone, PartialEq)]
pub enum MockStep {
    /// The capture is tracked and shows these bodies
    Bodies(Vec<Skeleton>),
    /// Waiting for the capture times out
    CaptureTimeout,
    /// Waiting for the capture fails
    CaptureFailure,
    /// The tracker refuses the capture
    SubmitFailure,
    /// The capture is accepted but no result can be popped for it
    PopFailure,
}

/// Motion of the synthetic body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MockMotion {
    /// Sway frequency in Hz
    pub frequency: f32,
    /// Sway amplitude in millimetres
    pub amplitude: f32,
    /// Distance of the body from the camera in millimetres
    pub distance: f32,
}

impl Default for MockMotion {
    fn default() -> Self {
        Self {
            frequency: 0.5,
            amplitude: 80.0,
            distance: 2000.0,
        }
    }
}

impl MockMotion {
    /// Skeleton at time `t` seconds
    pub fn skeleton_at(&self, t: f32) -> Skeleton {
        let phase = 2.0 * std::f32::consts::PI * self.frequency * t;
        let sway = self.amplitude * phase.sin();
        // Small rotation about the vertical axis.
        let half_angle = 0.1 * phase.sin() * 0.5;
        let orientation = Quaternion::new(half_angle.cos(), 0.0, half_angle.sin(), 0.0);

        let mut skeleton = Skeleton::default();
        for id in JointId::ALL {
            let i = id.index() as f32;
            let position = Vec3::new(
                sway + 10.0 * (i % 4.0),
                -800.0 + 50.0 * i,
                self.distance + 5.0 * (i % 3.0),
            );
            skeleton.set_joint(id, JointPose::new(position, orientation));
        }
        skeleton
    }
}

#[derive(Debug, Default)]
struct CounterState {
    device_opened: AtomicBool,
    device_started: AtomicBool,
    device_stopped: AtomicBool,
    device_closed: AtomicBool,
    captures_acquired: AtomicU64,
    captures_released: AtomicU64,
    frames_acquired: AtomicU64,
    frames_released: AtomicU64,
    overlap_violations: AtomicU64,
    tracker_shutdowns: AtomicU64,
    trackers_destroyed: AtomicU64,
    backend_attempts: Mutex<Vec<BackendChoice>>,
}

/// Shared acquisition and teardown counters
#[derive(Debug, Clone, Default)]
pub struct MockCounters {
    inner: Arc<CounterState>,
}

impl MockCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn device_opened(&self) -> bool {
        self.inner.device_opened.load(Ordering::SeqCst)
    }

    pub fn device_started(&self) -> bool {
        self.inner.device_started.load(Ordering::SeqCst)
    }

    pub fn device_stopped(&self) -> bool {
        self.inner.device_stopped.load(Ordering::SeqCst)
    }

    pub fn device_closed(&self) -> bool {
        self.inner.device_closed.load(Ordering::SeqCst)
    }

    pub fn captures_acquired(&self) -> u64 {
        self.inner.captures_acquired.load(Ordering::SeqCst)
    }

    pub fn captures_released(&self) -> u64 {
        self.inner.captures_released.load(Ordering::SeqCst)
    }

    pub fn frames_acquired(&self) -> u64 {
        self.inner.frames_acquired.load(Ordering::SeqCst)
    }

    pub fn frames_released(&self) -> u64 {
        self.inner.frames_released.load(Ordering::SeqCst)
    }

    /// Captures handed out while an earlier capture or result was still held
    pub fn overlap_violations(&self) -> u64 {
        self.inner.overlap_violations.load(Ordering::SeqCst)
    }

    pub fn tracker_shutdowns(&self) -> u64 {
        self.inner.tracker_shutdowns.load(Ordering::SeqCst)
    }

    pub fn trackers_destroyed(&self) -> u64 {
        self.inner.trackers_destroyed.load(Ordering::SeqCst)
    }

    /// Backends the tracker factory was asked for, in order
    pub fn backend_attempts(&self) -> Vec<BackendChoice> {
        self.inner
            .backend_attempts
            .lock()
            .map(|a| a.clone())
            .unwrap_or_default()
    }

    /// Every capture and every tracking result was given back
    pub fn all_released(&self) -> bool {
        self.captures_acquired() == self.captures_released()
            && self.frames_acquired() == self.frames_released()
    }
}

/// Raw capture produced by [`MockDevice`]
#[derive(Debug, Clone, PartialEq)]
pub struct MockCapture {
    /// Capture sequence number, starting at 1
    pub sequence: u64,
    bodies: Vec<Skeleton>,
    fail_submit: bool,
    fail_pop: bool,
}

/// Tracking result produced by [`MockTracker`]
#[derive(Debug, Clone, PartialEq)]
pub struct MockFrame {
    /// Sequence number of the capture this result came from
    pub sequence: u64,
    bodies: Vec<Skeleton>,
}

#[derive(Debug)]
enum Source {
    Scripted(VecDeque<MockStep>),
    Synthetic { motion: MockMotion, paced: bool },
}

/// Simulated depth camera
#[derive(Debug)]
pub struct MockDevice {
    source: Source,
    counters: MockCounters,
    sequence: u64,
    frame_interval: Duration,
    fail_open: bool,
    fail_start: bool,
    fail_calibration: bool,
}

impl MockDevice {
    /// Device that plays back `steps`, one per capture request
    pub fn scripted(steps: Vec<MockStep>) -> Self {
        Self::with_source(Source::Scripted(steps.into()))
    }

    /// Device that streams a moving body forever
    pub fn synthetic(motion: MockMotion) -> Self {
        Self::with_source(Source::Synthetic {
            motion,
            paced: true,
        })
    }

    fn with_source(source: Source) -> Self {
        Self {
            source,
            counters: MockCounters::new(),
            sequence: 0,
            frame_interval: Duration::from_millis(33),
            fail_open: false,
            fail_start: false,
            fail_calibration: false,
        }
    }

    /// Produce synthetic captures as fast as they are requested
    pub fn unpaced(mut self) -> Self {
        if let Source::Synthetic { paced, .. } = &mut self.source {
            *paced = false;
        }
        self
    }

    /// Make `open` fail
    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Make `start` fail
    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Make `calibration` fail
    pub fn failing_calibration(mut self) -> Self {
        self.fail_calibration = true;
        self
    }

    /// Counters shared with trackers created for this device
    pub fn counters(&self) -> MockCounters {
        self.counters.clone()
    }

    fn next_capture(&mut self, bodies: Vec<Skeleton>, fail_submit: bool, fail_pop: bool) -> MockCapture {
        let c = &self.counters.inner;
        let captures_held = c.captures_acquired.load(Ordering::SeqCst)
            != c.captures_released.load(Ordering::SeqCst);
        let frames_held = c.frames_acquired.load(Ordering::SeqCst)
            != c.frames_released.load(Ordering::SeqCst);
        if captures_held || frames_held {
            c.overlap_violations.fetch_add(1, Ordering::SeqCst);
        }
        c.captures_acquired.fetch_add(1, Ordering::SeqCst);
        self.sequence += 1;
        MockCapture {
            sequence: self.sequence,
            bodies,
            fail_submit,
            fail_pop,
        }
    }
}

impl DepthDevice for MockDevice {
    type Capture = MockCapture;

    fn open(&mut self, index: u32) -> Result<()> {
        if self.fail_open {
            return Err(PoseStreamError::DeviceUnavailable(format!(
                "no mock device at index {}",
                index
            )));
        }
        tracing::info!("Mock depth device {} opened", index);
        self.counters.inner.device_opened.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn start(&mut self, config: &DeviceConfig) -> Result<()> {
        if self.fail_start {
            return Err(PoseStreamError::DeviceUnavailable(
                "mock cameras failed to start".to_string(),
            ));
        }
        self.frame_interval = Duration::from_secs_f64(1.0 / config.camera_fps.hz() as f64);
        tracing::info!(
            "Mock cameras started ({}, {} fps)",
            config.depth_mode,
            config.camera_fps.hz()
        );
        self.counters.inner.device_started.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn calibration(&mut self, config: &DeviceConfig) -> Result<Calibration> {
        if self.fail_calibration {
            return Err(PoseStreamError::CalibrationUnavailable(
                "mock calibration read failed".to_string(),
            ));
        }
        let (depth_width, depth_height) = config.depth_mode.resolution();
        Ok(Calibration {
            depth_width,
            depth_height,
            raw: Vec::new(),
        })
    }

    fn wait_for_capture(&mut self, timeout: WaitTimeout) -> WaitResult<MockCapture> {
        match &mut self.source {
            Source::Scripted(steps) => match steps.pop_front() {
                Some(MockStep::Bodies(bodies)) => {
                    WaitResult::Ready(self.next_capture(bodies, false, false))
                }
                Some(MockStep::SubmitFailure) => {
                    WaitResult::Ready(self.next_capture(Vec::new(), true, false))
                }
                Some(MockStep::PopFailure) => {
                    WaitResult::Ready(self.next_capture(Vec::new(), false, true))
                }
                Some(MockStep::CaptureTimeout) => {
                    if let WaitTimeout::After(d) = timeout {
                        std::thread::sleep(d.min(Duration::from_millis(1)));
                    }
                    WaitResult::Timeout
                }
                Some(MockStep::CaptureFailure) => {
                    WaitResult::Failed("mock device reported a capture error".to_string())
                }
                None => WaitResult::Failed("mock script exhausted".to_string()),
            },
            Source::Synthetic { motion, paced } => {
                let motion = *motion;
                if *paced {
                    std::thread::sleep(self.frame_interval);
                }
                let t = self.sequence as f32 * self.frame_interval.as_secs_f32();
                WaitResult::Ready(self.next_capture(vec![motion.skeleton_at(t)], false, false))
            }
        }
    }

    fn release_capture(&mut self, _capture: MockCapture) {
        self.counters
            .inner
            .captures_released
            .fetch_add(1, Ordering::SeqCst);
    }

    fn stop(&mut self) {
        tracing::debug!("Mock cameras stopped");
        self.counters.inner.device_stopped.store(true, Ordering::SeqCst);
    }

    fn close(&mut self) {
        tracing::debug!("Mock depth device closed");
        self.counters.inner.device_closed.store(true, Ordering::SeqCst);
    }
}

/// Creates [`MockTracker`]s, optionally refusing one or both backends
#[derive(Debug)]
pub struct MockTrackerFactory {
    counters: MockCounters,
    fail_accelerated: bool,
    fail_baseline: bool,
}

impl MockTrackerFactory {
    /// Factory whose trackers report into `counters`
    pub fn new(counters: MockCounters) -> Self {
        Self {
            counters,
            fail_accelerated: false,
            fail_baseline: false,
        }
    }

    /// Refuse the accelerated backend
    pub fn without_accelerated(mut self) -> Self {
        self.fail_accelerated = true;
        self
    }

    /// Refuse the baseline backend
    pub fn without_baseline(mut self) -> Self {
        self.fail_baseline = true;
        self
    }
}

impl TrackerFactory<MockCapture> for MockTrackerFactory {
    type Tracker = MockTracker;

    fn create(&mut self, calibration: &Calibration, backend: BackendChoice) -> Result<MockTracker> {
        if let Ok(mut attempts) = self.counters.inner.backend_attempts.lock() {
            attempts.push(backend);
        }
        let refused = match backend {
            BackendChoice::Accelerated => self.fail_accelerated,
            BackendChoice::Baseline => self.fail_baseline,
        };
        if refused {
            return Err(PoseStreamError::TrackerCreation(format!(
                "mock {} backend disabled",
                backend.label()
            )));
        }
        tracing::debug!(
            "Mock tracker created on {} for {}x{} depth",
            backend,
            calibration.depth_width,
            calibration.depth_height
        );
        Ok(MockTracker {
            backend,
            counters: self.counters.clone(),
            queue: VecDeque::new(),
            shut_down: false,
        })
    }
}

#[derive(Debug)]
enum Queued {
    Frame(MockFrame),
    Failure,
}

/// Simulated body tracking engine
#[derive(Debug)]
pub struct MockTracker {
    backend: BackendChoice,
    counters: MockCounters,
    queue: VecDeque<Queued>,
    shut_down: bool,
}

impl MockTracker {
    /// Backend this tracker runs on
    pub fn backend(&self) -> BackendChoice {
        self.backend
    }
}

impl BodyTracker<MockCapture> for MockTracker {
    type Frame = MockFrame;

    fn submit(&mut self, capture: &MockCapture, _timeout: WaitTimeout) -> WaitResult<()> {
        if self.shut_down {
            return WaitResult::Failed("tracker is shut down".to_string());
        }
        if capture.fail_submit {
            return WaitResult::Failed(format!("capture {} rejected", capture.sequence));
        }
        if capture.fail_pop {
            self.queue.push_back(Queued::Failure);
        } else {
            self.queue.push_back(Queued::Frame(MockFrame {
                sequence: capture.sequence,
                bodies: capture.bodies.clone(),
            }));
        }
        WaitResult::Ready(())
    }

    fn pop_result(&mut self, _timeout: WaitTimeout) -> WaitResult<MockFrame> {
        match self.queue.pop_front() {
            Some(Queued::Frame(frame)) => {
                self.counters
                    .inner
                    .frames_acquired
                    .fetch_add(1, Ordering::SeqCst);
                WaitResult::Ready(frame)
            }
            Some(Queued::Failure) => WaitResult::Failed("mock tracker lost the result".to_string()),
            None => WaitResult::Timeout,
        }
    }

    fn body_count(&self, frame: &MockFrame) -> usize {
        frame.bodies.len()
    }

    fn skeleton(&self, frame: &MockFrame, body_index: usize) -> Result<Skeleton> {
        frame.bodies.get(body_index).cloned().ok_or_else(|| {
            PoseStreamError::PopFailed(format!(
                "frame {} has no body {}",
                frame.sequence, body_index
            ))
        })
    }

    fn release_frame(&mut self, _frame: MockFrame) {
        self.counters
            .inner
            .frames_released
            .fetch_add(1, Ordering::SeqCst);
    }

    fn shutdown(&mut self) {
        self.shut_down = true;
        self.queue.clear();
        self.counters
            .inner
            .tracker_shutdowns
            .fetch_add(1, Ordering::SeqCst);
    }

    fn destroy(self) {
        self.counters
            .inner
            .trackers_destroyed
            .fetch_add(1, Ordering::SeqCst);
    }
}
