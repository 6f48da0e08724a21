//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
#[cfg(feature = "mock-device")]
pub mod mock_helpers;

use posestream_rs::config::AppConfig;
use std::time::Duration;

/// Create a test timeout duration
pub fn test_timeout() -> Duration {
    Duration::from_secs(5)
}

/// A configuration that stops after `frames` tracked frames and polls fast
pub fn limited_config(frames: u64) -> AppConfig {
    let mut config = AppConfig::default();
    config.capture.frame_limit = Some(frames);
    config.stream.consumer_poll_ms = 1;
    config
}

/// Same as [`limited_config`], publishing only the named joints
pub fn limited_config_with_joints(frames: u64, joints: &[&str]) -> AppConfig {
    let mut config = limited_config(frames);
    config.stream.joints = Some(joints.iter().map(|j| j.to_string()).collect());
    config
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f32, b: f32, epsilon: f32) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}
