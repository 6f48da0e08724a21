//! Body tracker traits
//!
//! [`TrackerFactory`] creates a tracker for a given backend; [`BodyTracker`]
//! is the running engine. Both are generic over the capture type of the
//! device feeding them.

use crate::error::Result;
use crate::types::{BackendChoice, Calibration, Skeleton, WaitResult, WaitTimeout};

/// Creates body trackers for a specific backend
pub trait TrackerFactory<C> {
    /// The tracker this factory produces
    type Tracker: BodyTracker<C>;

    /// Create a tracker running on `backend`
    fn create(&mut self, calibration: &Calibration, backend: BackendChoice) -> Result<Self::Tracker>;
}

/// A running body tracking engine
///
/// A frame handed out by [`BodyTracker::pop_result`] must be given back
/// through [`BodyTracker::release_frame`] exactly once; see [`FrameGuard`].
pub trait BodyTracker<C>: Send {
    /// Tracking result handle
    type Frame;

    /// Queue a capture for asynchronous processing
    fn submit(&mut self, capture: &C, timeout: WaitTimeout) -> WaitResult<()>;

    /// Retrieve the next tracking result
    fn pop_result(&mut self, timeout: WaitTimeout) -> WaitResult<Self::Frame>;

    /// Number of bodies tracked in a frame
    fn body_count(&self, frame: &Self::Frame) -> usize;

    /// Copy the skeleton of one body out of a frame
    fn skeleton(&self, frame: &Self::Frame, body_index: usize) -> Result<Skeleton>;

    /// Give a frame back to the engine
    fn release_frame(&mut self, frame: Self::Frame);

    /// Stop accepting captures and flush queued work
    fn shutdown(&mut self);

    /// Free the engine
    fn destroy(self)
    where
        Self: Sized;
}

/// Owns a tracking result and releases it when dropped
pub struct FrameGuard<'a, C, T: BodyTracker<C>> {
    tracker: &'a mut T,
    frame: Option<T::Frame>,
    _capture: std::marker::PhantomData<fn(&C)>,
}

impl<'a, C, T: BodyTracker<C>> FrameGuard<'a, C, T> {
    pub fn new(tracker: &'a mut T, frame: T::Frame) -> Self {
        Self {
            tracker,
            frame: Some(frame),
            _capture: std::marker::PhantomData,
        }
    }

    fn frame(&self) -> &T::Frame {
        // Only `drop` takes the frame out.
        self.frame.as_ref().expect("frame is held until the guard drops")
    }

    /// Number of bodies in the held frame
    pub fn body_count(&self) -> usize {
        self.tracker.body_count(self.frame())
    }

    /// Skeleton of one body in the held frame
    pub fn skeleton(&self, body_index: usize) -> Result<Skeleton> {
        self.tracker.skeleton(self.frame(), body_index)
    }
}

impl<C, T: BodyTracker<C>> Drop for FrameGuard<'_, C, T> {
    fn drop(&mut self) {
        if let Some(frame) = self.frame.take() {
            self.tracker.release_frame(frame);
        }
    }
}
