//! Outgoing pose stream
//!
//! The streaming transport itself (wire protocol, discovery, consumer
//! handshake) lives outside this crate. This module defines the verbs the
//! pipeline needs from it and the [`PublisherGate`] that sits in front of
//! the outlet.
//!
//! # Components
//!
//! - [`StreamTransport`] - Creates an outlet for a [`StreamDescriptor`]
//! - [`StreamOutlet`] - A live outlet: consumer wait and best-effort push
//! - [`PublisherGate`] - Blocks until a consumer attaches, then forwards samples
//! - [`descriptor`] - Builds the descriptor from the joint table

pub mod descriptor;
#[cfg(feature = "mock-device")]
pub mod mock_outlet;

pub use descriptor::{build_descriptor, ChannelInfo, ChannelKind, StreamDescriptor};
#[cfg(feature = "mock-device")]
pub use mock_outlet::{MockOutlet, MockTransport};

use crate::error::Result;
use crate::pipeline::{CancelFlag, PoseVector};
use std::time::Duration;

/// Creates outlets on the streaming transport
pub trait StreamTransport {
    /// Outlet handle produced by this transport
    type Outlet: StreamOutlet;

    /// Announce a stream with the given descriptor
    fn create_stream(&mut self, descriptor: &StreamDescriptor) -> Result<Self::Outlet>;
}

/// A live stream outlet
#[cfg_attr(test, mockall::automock)]
pub trait StreamOutlet: Send {
    /// Block up to `timeout` for a consumer; true once at least one is attached
    fn wait_for_consumers(&self, timeout: Duration) -> bool;

    /// Send one sample; delivery is best effort
    fn push_sample(&self, sample: &[f32]);
}

/// Holds samples back until the stream has a consumer
pub struct PublisherGate<O: StreamOutlet> {
    outlet: O,
    poll_timeout: Duration,
}

impl<O: StreamOutlet> PublisherGate<O> {
    pub fn new(outlet: O, poll_timeout: Duration) -> Self {
        Self {
            outlet,
            poll_timeout,
        }
    }

    /// Wait until a consumer attaches
    ///
    /// Polls the outlet indefinitely. Returns `false` only when `cancel` was
    /// raised before any consumer showed up.
    pub fn await_consumers(&self, cancel: &CancelFlag) -> bool {
        tracing::info!("Waiting for stream consumers...");
        let mut polls: u64 = 0;
        loop {
            if cancel.is_cancelled() {
                tracing::info!("Stopped waiting for consumers after {} polls", polls);
                return false;
            }
            if self.outlet.wait_for_consumers(self.poll_timeout) {
                tracing::info!("Consumer connected, sending data");
                return true;
            }
            polls += 1;
            tracing::trace!("No consumer after {} polls", polls);
        }
    }

    /// Forward one pose vector to the outlet
    pub fn push(&self, sample: &PoseVector) {
        self.outlet.push_sample(sample.as_slice());
    }

    /// The wrapped outlet
    pub fn outlet(&self) -> &O {
        &self.outlet
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joints::JointTable;
    use mockall::predicate::*;
    use mockall::Sequence;

    #[test]
    fn test_await_consumers_retries_until_attached() {
        let mut outlet = MockStreamOutlet::new();
        let mut seq = Sequence::new();
        outlet
            .expect_wait_for_consumers()
            .with(eq(Duration::from_millis(1200)))
            .times(3)
            .in_sequence(&mut seq)
            .return_const(false);
        outlet
            .expect_wait_for_consumers()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(true);

        let gate = PublisherGate::new(outlet, Duration::from_millis(1200));
        assert!(gate.await_consumers(&CancelFlag::new()));
    }

    #[test]
    fn test_await_consumers_honours_cancel() {
        let mut outlet = MockStreamOutlet::new();
        outlet.expect_wait_for_consumers().times(0);

        let cancel = CancelFlag::new();
        cancel.cancel();
        let gate = PublisherGate::new(outlet, Duration::from_millis(10));
        assert!(!gate.await_consumers(&cancel));
    }

    #[test]
    fn test_push_forwards_whole_vector() {
        let table = JointTable::from_names(&["HEAD"]).unwrap();
        let mut vector = PoseVector::for_table(&table);
        vector.as_mut_slice()[0] = 42.0;

        let mut outlet = MockStreamOutlet::new();
        outlet
            .expect_push_sample()
            .withf(|sample: &[f32]| sample.len() == 7 && sample[0] == 42.0)
            .times(1)
            .return_const(());

        let gate = PublisherGate::new(outlet, Duration::from_millis(10));
        gate.push(&vector);
    }
}
