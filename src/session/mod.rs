//! Capture session orchestration
//!
//! A [`Session`] owns the collaborators of one streaming run and brings them
//! up in order:
//!
//! 1. open the depth device and start its cameras
//! 2. read the sensor calibration
//! 3. create a body tracker (accelerated backend first, then baseline)
//! 4. build and validate the stream descriptor, create the outlet
//! 5. wait for a consumer, then run the capture pipeline
//!
//! Whatever happens, teardown runs in reverse: tracker shutdown and destroy,
//! camera stop, device close. Each stage only tears down what it brought up.
//!
//! [`SessionHandle`] runs a session on its own thread and stops it through a
//! shared [`CancelFlag`].

pub mod handle;
pub mod types;

pub use handle::SessionHandle;
pub use types::{SessionEnd, SessionReport};

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::backend::{select_backend, BodyTracker, DepthDevice, TrackerFactory};
use crate::config::AppConfig;
use crate::error::{PoseStreamError, Result, ResultExt};
use crate::joints::JointTable;
use crate::pipeline::{CancelFlag, CapturePipeline, CaptureSettings, PoseVector};
use crate::stream::{build_descriptor, PublisherGate, StreamTransport};
use crate::types::{BackendChoice, CaptureStats};

/// One streaming run over a device, a tracker factory and a transport
pub struct Session<D, F, S> {
    config: AppConfig,
    table: JointTable,
    device: D,
    factory: F,
    transport: S,
}

impl<D, F, S> Session<D, F, S>
where
    D: DepthDevice,
    F: TrackerFactory<D::Capture>,
    S: StreamTransport,
{
    /// Create a session; fails if the configuration is invalid
    pub fn new(config: AppConfig, device: D, factory: F, transport: S) -> Result<Self> {
        config.validate()?;
        let table = config.joint_table()?;
        Ok(Self {
            config,
            table,
            device,
            factory,
            transport,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The joint table published by this session
    pub fn joint_table(&self) -> &JointTable {
        &self.table
    }

    /// Run the session to completion
    pub fn run(&mut self, cancel: &CancelFlag) -> Result<SessionReport> {
        let started_at = Utc::now();
        let index = self.config.device.device_index;

        self.device
            .open(index)
            .with_context(|| format!("opening depth device {}", index))?;
        tracing::info!("Depth device {} opened", index);

        let result = self.run_opened(cancel, started_at);
        self.device.close();
        tracing::debug!("Depth device closed");
        result
    }

    fn run_opened(&mut self, cancel: &CancelFlag, started_at: DateTime<Utc>) -> Result<SessionReport> {
        self.device
            .start(&self.config.device)
            .context("starting cameras")?;
        tracing::info!(
            "Cameras started ({}, {} fps, color off)",
            self.config.device.depth_mode,
            self.config.device.camera_fps.hz()
        );

        let result = self.run_started(cancel, started_at);
        self.device.stop();
        tracing::debug!("Cameras stopped");
        result
    }

    fn run_started(&mut self, cancel: &CancelFlag, started_at: DateTime<Utc>) -> Result<SessionReport> {
        let calibration = self
            .device
            .calibration(&self.config.device)
            .context("reading sensor calibration")?;
        tracing::debug!(
            "Calibration read ({}x{} depth)",
            calibration.depth_width,
            calibration.depth_height
        );

        let (mut tracker, backend) = select_backend::<D::Capture, F>(
            &mut self.factory,
            &calibration,
            self.config.tracker.policy,
        )?;

        let result = self.run_tracking(&mut tracker, backend, cancel, started_at);
        tracker.shutdown();
        tracker.destroy();
        tracing::debug!("Body tracker shut down and destroyed");
        result
    }

    fn run_tracking(
        &mut self,
        tracker: &mut F::Tracker,
        backend: BackendChoice,
        cancel: &CancelFlag,
        started_at: DateTime<Utc>,
    ) -> Result<SessionReport> {
        let descriptor = build_descriptor(&self.table, backend, &self.config.stream);
        descriptor.validate(&self.table)?;

        let buffer_len = PoseVector::for_table(&self.table).len();
        if buffer_len != descriptor.channel_count {
            return Err(PoseStreamError::LayoutMismatch {
                expected: descriptor.channel_count,
                actual: buffer_len,
            });
        }

        let outlet = self
            .transport
            .create_stream(&descriptor)
            .context("creating stream outlet")?;
        tracing::info!(
            "Stream '{}' ({}) created: {} channels at {} Hz hint",
            descriptor.name,
            descriptor.content_type,
            descriptor.channel_count,
            descriptor.nominal_rate_hz
        );
        if let Ok(json) = descriptor.to_json() {
            tracing::debug!("Stream descriptor:\n{}", json);
        }

        let mut report = SessionReport {
            backend,
            stream_name: descriptor.name.clone(),
            channel_count: descriptor.channel_count,
            nominal_rate_hz: descriptor.nominal_rate_hz,
            started_at,
            stats: CaptureStats::default(),
            end: SessionEnd::Cancelled,
        };

        let gate = PublisherGate::new(
            outlet,
            Duration::from_millis(self.config.stream.consumer_poll_ms),
        );
        if !gate.await_consumers(cancel) {
            return Ok(report);
        }

        let mut pipeline = CapturePipeline::new(
            &mut self.device,
            tracker,
            &gate,
            &self.table,
            CaptureSettings::from(&self.config.capture),
        );
        let exit = pipeline.run(cancel);
        report.stats = pipeline.stats().clone();
        report.end = exit?.into();
        Ok(report)
    }
}

#[cfg(all(test, feature = "mock-device"))]
mod tests {
    use super::*;
    use crate::backend::{MockDevice, MockStep, MockTrackerFactory};
    use crate::stream::MockTransport;
    use crate::types::Skeleton;

    fn limited_config(frames: u64) -> AppConfig {
        let mut config = AppConfig::default();
        config.capture.frame_limit = Some(frames);
        config.stream.consumer_poll_ms = 1;
        config
    }

    #[test]
    fn test_session_runs_to_frame_limit() {
        let device = MockDevice::scripted(vec![
            MockStep::Bodies(vec![Skeleton::default()]),
            MockStep::Bodies(vec![]),
        ]);
        let counters = device.counters();
        let factory = MockTrackerFactory::new(counters.clone());
        let mut session =
            Session::new(limited_config(2), device, factory, MockTransport::new()).unwrap();

        let report = session.run(&CancelFlag::new()).unwrap();
        assert_eq!(report.end, SessionEnd::FrameLimitReached);
        assert_eq!(report.backend, BackendChoice::Accelerated);
        assert_eq!(report.channel_count, 224);
        assert_eq!(report.nominal_rate_hz, 10.0);
        assert_eq!(report.stats.samples_pushed, 1);
        assert_eq!(report.stats.empty_frames, 1);
        assert!(counters.device_closed());
        assert_eq!(counters.trackers_destroyed(), 1);
    }

    #[test]
    fn test_start_failure_closes_device_without_stopping() {
        let device = MockDevice::scripted(vec![]).failing_start();
        let counters = device.counters();
        let factory = MockTrackerFactory::new(counters.clone());
        let mut session =
            Session::new(limited_config(1), device, factory, MockTransport::new()).unwrap();

        let err = session.run(&CancelFlag::new()).unwrap_err();
        assert!(matches!(err.root(), PoseStreamError::DeviceUnavailable(_)));
        assert!(counters.device_closed());
        assert!(!counters.device_stopped());
        assert!(counters.backend_attempts().is_empty());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = AppConfig::default();
        config.stream.joints = Some(vec!["TAIL".to_string()]);
        let device = MockDevice::scripted(vec![]);
        let factory = MockTrackerFactory::new(device.counters());
        assert!(Session::new(config, device, factory, MockTransport::new()).is_err());
    }
}
