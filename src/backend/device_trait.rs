//! DepthDevice trait for the depth camera driver
//!
//! The capture pipeline talks to the camera only through this trait, so the
//! same pipeline drives a real driver binding or the simulated device used
//! for tests.

use crate::config::DeviceConfig;
use crate::error::Result;
use crate::types::{Calibration, WaitResult, WaitTimeout};

/// Depth camera driver
///
/// A capture handed out by [`DepthDevice::wait_for_capture`] must be given
/// back through [`DepthDevice::release_capture`] exactly once. The pipeline
/// wraps every capture in a [`CaptureGuard`] to guarantee that.
pub trait DepthDevice: Send {
    /// Raw capture handle produced by the driver
    type Capture: Send;

    /// Open the device with the given index
    fn open(&mut self, index: u32) -> Result<()>;

    /// Start the cameras
    fn start(&mut self, config: &DeviceConfig) -> Result<()>;

    /// Read the sensor calibration for the running configuration
    fn calibration(&mut self, config: &DeviceConfig) -> Result<Calibration>;

    /// Block until the next capture is available
    fn wait_for_capture(&mut self, timeout: WaitTimeout) -> WaitResult<Self::Capture>;

    /// Give a capture back to the driver
    fn release_capture(&mut self, capture: Self::Capture);

    /// Stop the cameras
    fn stop(&mut self);

    /// Close the device
    fn close(&mut self);
}

/// Owns a raw capture and releases it when dropped
pub struct CaptureGuard<'a, D: DepthDevice> {
    device: &'a mut D,
    capture: Option<D::Capture>,
}

impl<'a, D: DepthDevice> CaptureGuard<'a, D> {
    pub fn new(device: &'a mut D, capture: D::Capture) -> Self {
        Self {
            device,
            capture: Some(capture),
        }
    }

    /// Borrow the held capture
    pub fn capture(&self) -> &D::Capture {
        // Only `drop` takes the capture out.
        self.capture.as_ref().expect("capture is held until the guard drops")
    }
}

impl<D: DepthDevice> Drop for CaptureGuard<'_, D> {
    fn drop(&mut self) {
        if let Some(capture) = self.capture.take() {
            self.device.release_capture(capture);
        }
    }
}
