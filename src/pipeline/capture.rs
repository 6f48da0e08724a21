//! Per-frame capture loop
//!
//! One iteration turns one raw capture into at most one published sample:
//!
//! ```text
//! Idle -> CaptureRequested -> CaptureReady -> Submitted -> ResultReady
//!      -> Validated -> Extracted -> Emitted -> Idle
//! ```
//!
//! Any failing collaborator call moves the pipeline to `Aborted` and ends the
//! loop. Captures and tracking results are held by guards, so each one is
//! released exactly once whichever way a step exits. The next capture is not
//! requested before the previous result has been released.

use std::time::Instant;

use crate::backend::device_trait::{CaptureGuard, DepthDevice};
use crate::backend::tracker_trait::{BodyTracker, FrameGuard};
use crate::config::CaptureConfig;
use crate::error::{PoseStreamError, Result};
use crate::joints::JointTable;
use crate::pipeline::extractor::PoseVector;
use crate::pipeline::state::{AbortReason, PipelineState};
use crate::pipeline::CancelFlag;
use crate::stream::{PublisherGate, StreamOutlet};
use crate::types::{CaptureStats, WaitResult, WaitTimeout};

/// Loop bounds of the capture pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureSettings {
    /// Stop after this many tracked frames (with or without a body)
    pub frame_limit: Option<u64>,
    /// How long to wait for each raw capture
    pub capture_timeout: WaitTimeout,
}

impl From<&CaptureConfig> for CaptureSettings {
    fn from(config: &CaptureConfig) -> Self {
        Self {
            frame_limit: config.frame_limit,
            capture_timeout: WaitTimeout::from_millis(config.capture_timeout_ms),
        }
    }
}

/// How a capture loop that did not fail came to an end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    FrameLimitReached,
    Cancelled,
}

/// Result of a single iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A sample was pushed
    Emitted,
    /// The tracker saw nobody
    NoBody,
    /// A finite capture wait elapsed
    CaptureTimedOut,
    /// Cancellation was observed mid-frame
    Cancelled,
}

fn enter(state: &mut PipelineState, next: PipelineState) {
    tracing::trace!("pipeline {} -> {}", state, next);
    *state = next;
}

fn abandon_frame(state: &mut PipelineState) -> FrameOutcome {
    tracing::debug!("Cancelled in {}, abandoning frame", state);
    enter(state, PipelineState::Idle);
    FrameOutcome::Cancelled
}

/// Drives device, tracker and outlet through the per-frame state machine
pub struct CapturePipeline<'a, D, T, O>
where
    D: DepthDevice,
    T: BodyTracker<D::Capture>,
    O: StreamOutlet,
{
    device: &'a mut D,
    tracker: &'a mut T,
    gate: &'a PublisherGate<O>,
    table: &'a JointTable,
    buffer: PoseVector,
    settings: CaptureSettings,
    state: PipelineState,
    stats: CaptureStats,
}

impl<'a, D, T, O> CapturePipeline<'a, D, T, O>
where
    D: DepthDevice,
    T: BodyTracker<D::Capture>,
    O: StreamOutlet,
{
    pub fn new(
        device: &'a mut D,
        tracker: &'a mut T,
        gate: &'a PublisherGate<O>,
        table: &'a JointTable,
        settings: CaptureSettings,
    ) -> Self {
        Self {
            device,
            tracker,
            gate,
            table,
            buffer: PoseVector::for_table(table),
            settings,
            state: PipelineState::Idle,
            stats: CaptureStats::default(),
        }
    }

    /// Current state
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Counters so far
    pub fn stats(&self) -> &CaptureStats {
        &self.stats
    }

    /// Run frames until the frame limit, cancellation, or a failure
    pub fn run(&mut self, cancel: &CancelFlag) -> Result<LoopExit> {
        let started = Instant::now();
        tracing::info!(
            "Capture loop started (frame limit: {:?}, capture timeout: {:?})",
            self.settings.frame_limit,
            self.settings.capture_timeout
        );

        let result = loop {
            if cancel.is_cancelled() {
                break Ok(LoopExit::Cancelled);
            }
            if let Some(limit) = self.settings.frame_limit {
                if self.stats.frames_tracked >= limit {
                    break Ok(LoopExit::FrameLimitReached);
                }
            }

            match self.step(cancel) {
                Ok(FrameOutcome::Cancelled) => break Ok(LoopExit::Cancelled),
                Ok(_) => {}
                Err(e) => {
                    if let Some(reason) = AbortReason::of(&e) {
                        enter(&mut self.state, PipelineState::Aborted(reason));
                    }
                    tracing::error!("Capture loop aborted: {}", e);
                    break Err(e);
                }
            }
        };

        self.stats.elapsed = started.elapsed();
        tracing::info!(
            "Capture loop finished: {} tracked frames, {} samples, {} empty frames",
            self.stats.frames_tracked,
            self.stats.samples_pushed,
            self.stats.empty_frames
        );
        result
    }

    /// Process one frame
    ///
    /// `cancel` is checked after every state change up to the push. A frame
    /// abandoned that way releases what it holds and publishes nothing.
    pub fn step(&mut self, cancel: &CancelFlag) -> Result<FrameOutcome> {
        enter(&mut self.state, PipelineState::CaptureRequested);
        let capture = match self.device.wait_for_capture(self.settings.capture_timeout) {
            WaitResult::Ready(capture) => capture,
            WaitResult::Timeout if !self.settings.capture_timeout.is_infinite() => {
                self.stats.capture_timeouts += 1;
                tracing::debug!("Timed out waiting for a capture");
                enter(&mut self.state, PipelineState::Idle);
                return Ok(FrameOutcome::CaptureTimedOut);
            }
            other => return Err(PoseStreamError::CaptureFailed(other.describe_failure())),
        };
        self.stats.frames_captured += 1;
        enter(&mut self.state, PipelineState::CaptureReady);

        let guard = CaptureGuard::new(&mut *self.device, capture);
        if cancel.is_cancelled() {
            return Ok(abandon_frame(&mut self.state));
        }
        let submitted = self.tracker.submit(guard.capture(), WaitTimeout::Infinite);
        drop(guard);
        if !submitted.is_ready() {
            return Err(PoseStreamError::SubmitFailed(submitted.describe_failure()));
        }
        enter(&mut self.state, PipelineState::Submitted);

        if cancel.is_cancelled() {
            return Ok(abandon_frame(&mut self.state));
        }

        let frame = match self.tracker.pop_result(WaitTimeout::Infinite) {
            WaitResult::Ready(frame) => frame,
            other => return Err(PoseStreamError::PopFailed(other.describe_failure())),
        };
        self.stats.frames_tracked += 1;
        enter(&mut self.state, PipelineState::ResultReady);

        {
            let guard = FrameGuard::<D::Capture, T>::new(&mut *self.tracker, frame);
            if cancel.is_cancelled() {
                return Ok(abandon_frame(&mut self.state));
            }
            match guard.body_count() {
                0 => {
                    self.stats.empty_frames += 1;
                    tracing::trace!("No body in frame {}", self.stats.frames_tracked);
                    enter(&mut self.state, PipelineState::Idle);
                    return Ok(FrameOutcome::NoBody);
                }
                1 => {}
                n => {
                    tracing::error!("Multiple bodies detected ({})", n);
                    return Err(PoseStreamError::AmbiguousBodyCount(n));
                }
            }
            enter(&mut self.state, PipelineState::Validated);
            if cancel.is_cancelled() {
                return Ok(abandon_frame(&mut self.state));
            }

            let skeleton = guard.skeleton(0).map_err(|e| {
                PoseStreamError::PopFailed(format!("reading skeleton failed: {}", e))
            })?;
            self.buffer.fill(&skeleton, self.table);
        }
        enter(&mut self.state, PipelineState::Extracted);
        if cancel.is_cancelled() {
            return Ok(abandon_frame(&mut self.state));
        }

        self.gate.push(&self.buffer);
        self.stats.samples_pushed += 1;
        enter(&mut self.state, PipelineState::Emitted);
        enter(&mut self.state, PipelineState::Idle);
        Ok(FrameOutcome::Emitted)
    }
}

#[cfg(all(test, feature = "mock-device"))]
mod tests {
    use super::*;
    use crate::backend::mock_device::{
        MockCounters, MockDevice, MockStep, MockTracker, MockTrackerFactory,
    };
    use crate::backend::mock_device::{MockCapture, MockFrame};
    use crate::backend::tracker_trait::TrackerFactory;
    use crate::joints::JointId;
    use crate::config::StreamConfig;
    use crate::stream::{build_descriptor, MockOutlet, MockTransport, StreamTransport};
    use crate::types::{BackendChoice, Calibration, JointPose, Quaternion, Skeleton, Vec3};
    use std::time::Duration;

    struct Rig {
        device: MockDevice,
        tracker: MockTracker,
        gate: PublisherGate<MockOutlet>,
        transport: MockTransport,
        table: JointTable,
        counters: MockCounters,
    }

    fn rig(steps: Vec<MockStep>) -> Rig {
        let table = JointTable::from_ids(&[JointId::Pelvis, JointId::Head]).unwrap();
        let device = MockDevice::scripted(steps);
        let counters = device.counters();
        let mut factory = MockTrackerFactory::new(counters.clone());
        let tracker = factory
            .create(&Calibration::default(), BackendChoice::Baseline)
            .unwrap();
        let mut transport = MockTransport::new();
        let descriptor =
            build_descriptor(&table, BackendChoice::Baseline, &StreamConfig::default());
        let outlet = transport.create_stream(&descriptor).unwrap();
        Rig {
            device,
            tracker,
            gate: PublisherGate::new(outlet, Duration::from_millis(1)),
            transport,
            table,
            counters,
        }
    }

    fn one_body(seed: f32) -> MockStep {
        let skeleton = Skeleton::default().with_joint(
            JointId::Head,
            JointPose::new(Vec3::new(seed, 0.0, 0.0), Quaternion::IDENTITY),
        );
        MockStep::Bodies(vec![skeleton])
    }

    fn run(rig: &mut Rig, settings: CaptureSettings) -> (Result<LoopExit>, PipelineState, CaptureStats) {
        let mut pipeline =
            CapturePipeline::new(&mut rig.device, &mut rig.tracker, &rig.gate, &rig.table, settings);
        let result = pipeline.run(&CancelFlag::new());
        (result, pipeline.state(), pipeline.stats().clone())
    }

    #[test]
    fn test_emits_one_sample_per_single_body_frame() {
        let mut rig = rig(vec![one_body(1.0), one_body(2.0)]);
        let settings = CaptureSettings {
            frame_limit: Some(2),
            ..Default::default()
        };
        let (result, state, stats) = run(&mut rig, settings);

        assert_eq!(result.unwrap(), LoopExit::FrameLimitReached);
        assert_eq!(state, PipelineState::Idle);
        assert_eq!(stats.samples_pushed, 2);

        let samples: Vec<_> = rig.transport.samples().try_iter().collect();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1][7], 2.0);
        assert_eq!(rig.counters.captures_released(), 2);
        assert_eq!(rig.counters.frames_released(), 2);
    }

    #[test]
    fn test_empty_frame_is_skipped_not_fatal() {
        let mut rig = rig(vec![MockStep::Bodies(vec![]), one_body(3.0)]);
        let settings = CaptureSettings {
            frame_limit: Some(2),
            ..Default::default()
        };
        let (result, _, stats) = run(&mut rig, settings);

        assert!(result.is_ok());
        assert_eq!(stats.empty_frames, 1);
        assert_eq!(stats.samples_pushed, 1);
        assert_eq!(rig.transport.samples().try_iter().count(), 1);
    }

    #[test]
    fn test_two_bodies_abort_without_emitting() {
        let two = MockStep::Bodies(vec![Skeleton::default(), Skeleton::default()]);
        let mut rig = rig(vec![one_body(1.0), two, one_body(2.0)]);
        let (result, state, stats) = run(&mut rig, CaptureSettings::default());

        assert!(matches!(result, Err(PoseStreamError::AmbiguousBodyCount(2))));
        assert_eq!(state, PipelineState::Aborted(AbortReason::AmbiguousBodyCount));
        assert_eq!(stats.samples_pushed, 1);
        assert_eq!(rig.counters.captures_acquired(), 2);
        assert_eq!(rig.counters.frames_released(), 2);
    }

    #[test]
    fn test_submit_failure_still_releases_capture() {
        let mut rig = rig(vec![MockStep::SubmitFailure]);
        let (result, state, _) = run(&mut rig, CaptureSettings::default());

        assert!(matches!(result, Err(PoseStreamError::SubmitFailed(_))));
        assert_eq!(state, PipelineState::Aborted(AbortReason::SubmitFailed));
        assert_eq!(rig.counters.captures_acquired(), 1);
        assert_eq!(rig.counters.captures_released(), 1);
        assert_eq!(rig.counters.frames_acquired(), 0);
    }

    #[test]
    fn test_finite_capture_timeout_skips_frame() {
        let mut rig = rig(vec![MockStep::CaptureTimeout, one_body(5.0)]);
        let settings = CaptureSettings {
            frame_limit: Some(1),
            capture_timeout: WaitTimeout::After(Duration::from_millis(5)),
        };
        let (result, _, stats) = run(&mut rig, settings);

        assert_eq!(result.unwrap(), LoopExit::FrameLimitReached);
        assert_eq!(stats.capture_timeouts, 1);
        assert_eq!(stats.samples_pushed, 1);
    }

    #[test]
    fn test_timeout_on_infinite_wait_is_a_failure() {
        let mut rig = rig(vec![MockStep::CaptureTimeout]);
        let (result, state, _) = run(&mut rig, CaptureSettings::default());
        assert!(matches!(result, Err(PoseStreamError::CaptureFailed(_))));
        assert_eq!(state, PipelineState::Aborted(AbortReason::CaptureFailed));
    }

    #[test]
    fn test_cancelled_before_first_frame() {
        let mut rig = rig(vec![one_body(1.0)]);
        let cancel = CancelFlag::new();
        cancel.cancel();
        let mut pipeline = CapturePipeline::new(
            &mut rig.device,
            &mut rig.tracker,
            &rig.gate,
            &rig.table,
            CaptureSettings::default(),
        );
        assert_eq!(pipeline.run(&cancel).unwrap(), LoopExit::Cancelled);
        assert_eq!(pipeline.stats().frames_captured, 0);
    }

    /// Where [`CancellingTracker`] raises the flag
    #[derive(Debug, Clone, Copy)]
    enum CancelAt {
        Submit,
        BodyCount,
        Skeleton,
    }

    /// Tracker that raises a cancel flag from inside one of its calls
    struct CancellingTracker {
        inner: MockTracker,
        cancel: CancelFlag,
        at: CancelAt,
    }

    impl BodyTracker<MockCapture> for CancellingTracker {
        type Frame = MockFrame;

        fn submit(&mut self, capture: &MockCapture, timeout: WaitTimeout) -> WaitResult<()> {
            if let CancelAt::Submit = self.at {
                self.cancel.cancel();
            }
            self.inner.submit(capture, timeout)
        }

        fn pop_result(&mut self, timeout: WaitTimeout) -> WaitResult<MockFrame> {
            self.inner.pop_result(timeout)
        }

        fn body_count(&self, frame: &MockFrame) -> usize {
            if let CancelAt::BodyCount = self.at {
                self.cancel.cancel();
            }
            self.inner.body_count(frame)
        }

        fn skeleton(&self, frame: &MockFrame, body_index: usize) -> Result<Skeleton> {
            if let CancelAt::Skeleton = self.at {
                self.cancel.cancel();
            }
            self.inner.skeleton(frame, body_index)
        }

        fn release_frame(&mut self, frame: MockFrame) {
            self.inner.release_frame(frame)
        }

        fn shutdown(&mut self) {
            self.inner.shutdown()
        }

        fn destroy(self) {
            self.inner.destroy()
        }
    }

    fn cancel_mid_frame(at: CancelAt) {
        let rig = rig(vec![one_body(1.0), one_body(2.0)]);
        let Rig {
            mut device,
            tracker,
            gate,
            transport,
            table,
            counters,
        } = rig;
        let cancel = CancelFlag::new();
        let mut tracker = CancellingTracker {
            inner: tracker,
            cancel: cancel.clone(),
            at,
        };

        let mut pipeline = CapturePipeline::new(
            &mut device,
            &mut tracker,
            &gate,
            &table,
            CaptureSettings::default(),
        );
        assert_eq!(pipeline.run(&cancel).unwrap(), LoopExit::Cancelled, "{:?}", at);
        assert_eq!(pipeline.state(), PipelineState::Idle, "{:?}", at);
        assert_eq!(pipeline.stats().frames_captured, 1, "{:?}", at);
        assert_eq!(pipeline.stats().samples_pushed, 0, "{:?}", at);

        assert_eq!(transport.samples().try_iter().count(), 0, "{:?}", at);
        assert_eq!(counters.captures_acquired(), 1);
        assert_eq!(counters.captures_released(), 1);
        assert_eq!(counters.frames_acquired(), counters.frames_released());
    }

    #[test]
    fn test_cancel_after_submit_abandons_frame() {
        cancel_mid_frame(CancelAt::Submit);
    }

    #[test]
    fn test_cancel_while_holding_result_releases_it() {
        cancel_mid_frame(CancelAt::BodyCount);
    }

    #[test]
    fn test_cancel_after_extraction_publishes_nothing() {
        cancel_mid_frame(CancelAt::Skeleton);
    }
}
