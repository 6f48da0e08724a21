//! Session worker thread

use std::thread;

use crate::backend::{DepthDevice, TrackerFactory};
use crate::error::{PoseStreamError, Result};
use crate::pipeline::CancelFlag;
use crate::session::{Session, SessionReport};
use crate::stream::StreamTransport;

/// A session running on its own thread
///
/// Dropping the handle cancels the session and waits for it to tear down.
#[derive(Debug)]
pub struct SessionHandle {
    cancel: CancelFlag,
    handle: Option<thread::JoinHandle<Result<SessionReport>>>,
}

impl SessionHandle {
    /// Start `session` on a new thread
    pub fn spawn<D, F, S>(mut session: Session<D, F, S>) -> Result<Self>
    where
        D: DepthDevice + 'static,
        F: TrackerFactory<D::Capture> + Send + 'static,
        S: StreamTransport + Send + 'static,
    {
        let cancel = CancelFlag::new();
        let cancel_flag = cancel.clone();

        let handle = thread::Builder::new()
            .name("posestream-session".to_string())
            .spawn(move || {
                let result = session.run(&cancel_flag);
                match &result {
                    Ok(report) => tracing::info!("Session finished: {}", report.summary()),
                    Err(e) => tracing::error!("Session failed: {}", e),
                }
                result
            })?;

        Ok(Self {
            cancel,
            handle: Some(handle),
        })
    }

    /// Flag that stops this session when raised
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Whether the session thread has returned
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Cancel the session and wait for its report
    pub fn stop(mut self) -> Result<SessionReport> {
        self.cancel.cancel();
        self.wait()
    }

    /// Wait for the session to end on its own
    pub fn join(mut self) -> Result<SessionReport> {
        self.wait()
    }

    fn wait(&mut self) -> Result<SessionReport> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| PoseStreamError::ThreadPanicked("session already joined".to_string()))?;
        handle.join().map_err(|panic| {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            PoseStreamError::ThreadPanicked(message)
        })?
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
