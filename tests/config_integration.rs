//! Integration tests for configuration files
//!
//! A configuration written to disk must load back unchanged and drive the
//! joint table and stream descriptor it describes.

mod common;

use posestream_rs::config::{AppConfig, BackendPolicy, CameraFps, DepthMode};
use posestream_rs::{build_descriptor, BackendChoice, PoseVector};
use tempfile::TempDir;

#[test]
fn test_saved_config_loads_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = common::limited_config_with_joints(100, &["HEAD", "WRIST_LEFT"]);
    config.device.depth_mode = DepthMode::WfovUnbinned;
    config.device.camera_fps = CameraFps::Fps15;
    config.tracker.policy = BackendPolicy::BaselineOnly;
    config.save(&path).unwrap();

    let loaded = AppConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[stream]
name = "Lab-Kinect"
joints = ["PELVIS", "HEAD"]

[capture]
frame_limit = 100
"#,
    )
    .unwrap();

    let config = AppConfig::load_or_default(Some(&path)).unwrap();
    assert_eq!(config.stream.name, "Lab-Kinect");
    assert_eq!(config.capture.frame_limit, Some(100));
    assert_eq!(config.stream.consumer_poll_ms, 1200);
    assert_eq!(config.device.depth_mode, DepthMode::Nfov2x2Binned);

    let table = config.joint_table().unwrap();
    let descriptor = build_descriptor(&table, BackendChoice::Accelerated, &config.stream);
    assert_eq!(descriptor.channel_count, 14);
    assert_eq!(descriptor.channel_count, PoseVector::for_table(&table).len());
    assert_eq!(descriptor.labels().next(), Some("PELVIS_posx"));
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = AppConfig::load_or_default(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert_eq!(err.exit_code(), 78);
}

#[test]
fn test_unknown_joint_name_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[stream]\njoints = [\"PELVIS\", \"ELBOW\"]\n").unwrap();

    assert!(AppConfig::load(&path).is_err());
}
