//! Core data types shared by the capture pipeline
//!
//! # Main Types
//!
//! - [`Vec3`] / [`Quaternion`] / [`JointPose`] - Per-joint pose as reported by the tracker
//! - [`Skeleton`] - Poses of every tracked joint of one body
//! - [`BackendChoice`] - Which tracking backend was negotiated
//! - [`WaitTimeout`] / [`WaitResult`] - Outcome of a blocking collaborator call
//! - [`Calibration`] - Sensor calibration handed from the device to the tracker
//! - [`CaptureStats`] - Counters describing a capture session

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::joints::JointId;

/// A position in device coordinates, millimetres
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// A unit quaternion stored in `w, x, y, z` order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion::new(1.0, 0.0, 0.0, 0.0);

    pub const fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Position and orientation of a single joint in one frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JointPose {
    pub position: Vec3,
    pub orientation: Quaternion,
}

impl JointPose {
    pub const fn new(position: Vec3, orientation: Quaternion) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// The seven stream values of this joint in channel order
    pub fn to_channels(&self) -> [f32; 7] {
        let p = self.position;
        let o = self.orientation;
        [p.x, p.y, p.z, o.w, o.x, o.y, o.z]
    }
}

/// Poses of every joint of one tracked body, indexed by [`JointId`]
///
/// This is a copy taken out of a tracking result; it does not borrow from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    joints: [JointPose; JointId::COUNT],
}

impl Default for Skeleton {
    fn default() -> Self {
        Self {
            joints: [JointPose::default(); JointId::COUNT],
        }
    }
}

impl Skeleton {
    /// Create a skeleton from a full set of joint poses in engine order
    pub fn from_joints(joints: [JointPose; JointId::COUNT]) -> Self {
        Self { joints }
    }

    /// Pose of a single joint
    pub fn joint(&self, id: JointId) -> &JointPose {
        &self.joints[id.index()]
    }

    /// Set the pose of a single joint
    pub fn set_joint(&mut self, id: JointId, pose: JointPose) {
        self.joints[id.index()] = pose;
    }

    /// Builder-style variant of [`Skeleton::set_joint`]
    pub fn with_joint(mut self, id: JointId, pose: JointPose) -> Self {
        self.set_joint(id, pose);
        self
    }
}

/// Tracking backend that was successfully created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendChoice {
    /// GPU accelerated inference
    Accelerated,
    /// CPU inference
    Baseline,
}

impl BackendChoice {
    /// Short identifier used in stream metadata
    pub fn label(&self) -> &'static str {
        match self {
            BackendChoice::Accelerated => "gpu",
            BackendChoice::Baseline => "cpu",
        }
    }
}

impl std::fmt::Display for BackendChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendChoice::Accelerated => write!(f, "Accelerated (GPU)"),
            BackendChoice::Baseline => write!(f, "Baseline (CPU)"),
        }
    }
}

/// How long a blocking collaborator call may wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitTimeout {
    /// Block until the call completes
    #[default]
    Infinite,
    /// Give up after the given duration
    After(Duration),
}

impl WaitTimeout {
    /// `None` maps to an infinite wait
    pub fn from_millis(ms: Option<u64>) -> Self {
        match ms {
            Some(ms) => WaitTimeout::After(Duration::from_millis(ms)),
            None => WaitTimeout::Infinite,
        }
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, WaitTimeout::Infinite)
    }
}

/// Outcome of a blocking collaborator call
#[derive(Debug, Clone, PartialEq)]
pub enum WaitResult<T> {
    /// The call succeeded
    Ready(T),
    /// The timeout elapsed first
    Timeout,
    /// The call failed
    Failed(String),
}

impl<T> WaitResult<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, WaitResult::Ready(_))
    }

    /// Describe a non-ready outcome for logs and errors
    pub fn describe_failure(&self) -> String {
        match self {
            WaitResult::Ready(_) => "succeeded".to_string(),
            WaitResult::Timeout => "timed out".to_string(),
            WaitResult::Failed(reason) => reason.clone(),
        }
    }
}

/// Sensor calibration obtained from the device
///
/// The tracker needs it to map depth pixels into 3D space. Its contents are
/// owned by the device driver; the pipeline only passes it along.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Calibration {
    /// Depth image width in pixels
    pub depth_width: u32,
    /// Depth image height in pixels
    pub depth_height: u32,
    /// Driver specific calibration blob
    pub raw: Vec<u8>,
}

/// Statistics about a capture session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureStats {
    /// Raw captures obtained from the device
    pub frames_captured: u64,
    /// Captures that produced a tracking result
    pub frames_tracked: u64,
    /// Tracking results without any body
    pub empty_frames: u64,
    /// Samples handed to the outlet
    pub samples_pushed: u64,
    /// Capture waits that timed out (finite capture timeout only)
    pub capture_timeouts: u64,
    /// Time spent in the capture loop
    pub elapsed: Duration,
}

impl CaptureStats {
    /// Samples pushed per second over the whole session
    pub fn effective_sample_rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            0.0
        } else {
            self.samples_pushed as f64 / secs
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_pose_channel_order() {
        let pose = JointPose::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quaternion::new(0.5, 0.6, 0.7, 0.8),
        );
        assert_eq!(pose.to_channels(), [1.0, 2.0, 3.0, 0.5, 0.6, 0.7, 0.8]);
    }

    #[test]
    fn test_skeleton_set_and_get() {
        let pose = JointPose::new(Vec3::new(10.0, 0.0, -5.0), Quaternion::IDENTITY);
        let skeleton = Skeleton::default().with_joint(JointId::Head, pose);
        assert_eq!(*skeleton.joint(JointId::Head), pose);
        assert_eq!(*skeleton.joint(JointId::Pelvis), JointPose::default());
    }

    #[test]
    fn test_wait_timeout_from_millis() {
        assert_eq!(WaitTimeout::from_millis(None), WaitTimeout::Infinite);
        assert_eq!(
            WaitTimeout::from_millis(Some(250)),
            WaitTimeout::After(Duration::from_millis(250))
        );
    }

    #[test]
    fn test_effective_sample_rate() {
        let stats = CaptureStats {
            samples_pushed: 30,
            elapsed: Duration::from_secs(2),
            ..Default::default()
        };
        assert!((stats.effective_sample_rate() - 15.0).abs() < f64::EPSILON);
        assert_eq!(CaptureStats::default().effective_sample_rate(), 0.0);
    }
}
