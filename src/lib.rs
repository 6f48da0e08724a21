//! # posestream-rs: Depth Camera Body Tracking to a Pose Stream
//!
//! Reads frames from a depth camera, runs a body tracking engine on them, and
//! publishes the pose of a single tracked body (position and orientation of
//! every joint) as a multi-channel sample stream for downstream consumers.
//!
//! ## Architecture
//!
//! - **Backend**: Depth device and body tracker traits, tracker backend
//!   negotiation (accelerated first, baseline fallback)
//! - **Joints**: The ordered joint table shared by descriptor and extractor
//! - **Stream**: Stream descriptor, transport traits and the consumer gate
//! - **Pipeline**: The per-frame capture state machine and pose extraction
//! - **Session**: Bring-up, teardown and the session worker thread
//!
//! ## Configuration
//!
//! Settings are read from a TOML file, by default
//! `<config dir>/posestream-rs/config.toml`:
//!
//! - **Linux**: `~/.config/posestream-rs/config.toml`
//! - **macOS**: `~/Library/Application Support/posestream-rs/config.toml`
//! - **Windows**: `%APPDATA%\posestream-rs\config.toml`
//!
//! ## Example
//!
//! ```ignore
//! use posestream_rs::{
//!     backend::{MockDevice, MockMotion, MockTrackerFactory},
//!     config::AppConfig,
//!     session::{Session, SessionHandle},
//!     stream::MockTransport,
//! };
//!
//! let device = MockDevice::synthetic(MockMotion::default());
//! let factory = MockTrackerFactory::new(device.counters());
//! let transport = MockTransport::new();
//! let samples = transport.samples();
//!
//! let session = Session::new(AppConfig::default(), device, factory, transport)?;
//! let handle = SessionHandle::spawn(session)?;
//!
//! for sample in samples.iter().take(10) {
//!     println!("{} values", sample.len());
//! }
//! let report = handle.stop()?;
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod joints;
pub mod pipeline;
pub mod session;
pub mod stream;
pub mod types;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{PoseStreamError, Result};
pub use joints::{JointId, JointTable};
pub use pipeline::{extract, CancelFlag, PoseVector};
pub use session::{Session, SessionHandle, SessionReport};
pub use stream::{build_descriptor, StreamDescriptor};
pub use types::{BackendChoice, JointPose, Skeleton};
