//! In-process stream transport for testing
//!
//! [`MockTransport`] hands out [`MockOutlet`]s that deliver every pushed
//! sample to a crossbeam channel, so tests and the simulated binary can play
//! the part of a stream consumer.
//!
//! Only available with the `mock-device` feature.

use crate::error::{PoseStreamError, Result};
use crate::stream::{StreamDescriptor, StreamOutlet, StreamTransport};
use crossbeam_channel::{unbounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Transport that records created streams and exposes their samples
///
/// Clones share the sample channel and the record of created streams.
#[derive(Debug, Clone)]
pub struct MockTransport {
    consumer_after_polls: usize,
    fail_create: bool,
    sample_tx: Sender<Vec<f32>>,
    sample_rx: Receiver<Vec<f32>>,
    created: Arc<Mutex<Vec<StreamDescriptor>>>,
    polls: Arc<AtomicUsize>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// A transport whose outlets have a consumer immediately
    pub fn new() -> Self {
        let (sample_tx, sample_rx) = unbounded();
        Self {
            consumer_after_polls: 0,
            fail_create: false,
            sample_tx,
            sample_rx,
            created: Arc::new(Mutex::new(Vec::new())),
            polls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A consumer attaches only after this many unsuccessful polls
    pub fn with_consumer_after_polls(mut self, polls: usize) -> Self {
        self.consumer_after_polls = polls;
        self
    }

    /// Make `create_stream` fail
    pub fn failing(mut self) -> Self {
        self.fail_create = true;
        self
    }

    /// Receiver playing the consumer side of every outlet
    pub fn samples(&self) -> Receiver<Vec<f32>> {
        self.sample_rx.clone()
    }

    /// Descriptors of all streams created so far
    pub fn created_streams(&self) -> Vec<StreamDescriptor> {
        self.created.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Total consumer polls across all outlets
    pub fn consumer_polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

impl StreamTransport for MockTransport {
    type Outlet = MockOutlet;

    fn create_stream(&mut self, descriptor: &StreamDescriptor) -> Result<MockOutlet> {
        if self.fail_create {
            return Err(PoseStreamError::StreamUnavailable(
                "mock transport configured to fail".to_string(),
            ));
        }
        if let Ok(mut created) = self.created.lock() {
            created.push(descriptor.clone());
        }
        tracing::debug!(
            "Mock outlet '{}' created with {} channels",
            descriptor.name,
            descriptor.channel_count
        );
        Ok(MockOutlet {
            channel_count: descriptor.channel_count,
            consumer_after_polls: self.consumer_after_polls,
            polls: self.polls.clone(),
            sample_tx: self.sample_tx.clone(),
        })
    }
}

/// Outlet that forwards samples to the transport's channel
#[derive(Debug)]
pub struct MockOutlet {
    channel_count: usize,
    consumer_after_polls: usize,
    polls: Arc<AtomicUsize>,
    sample_tx: Sender<Vec<f32>>,
}

impl StreamOutlet for MockOutlet {
    fn wait_for_consumers(&self, timeout: Duration) -> bool {
        let polls = self.polls.fetch_add(1, Ordering::SeqCst);
        if polls >= self.consumer_after_polls {
            true
        } else {
            // Keep the poll cheap in tests; a real outlet blocks up to `timeout`.
            std::thread::sleep(timeout.min(Duration::from_millis(1)));
            false
        }
    }

    fn push_sample(&self, sample: &[f32]) {
        if sample.len() != self.channel_count {
            tracing::warn!(
                "Dropping sample with {} values on a {} channel outlet",
                sample.len(),
                self.channel_count
            );
            return;
        }
        // Best effort, like a real outlet.
        if let Err(TrySendError::Disconnected(_)) = self.sample_tx.try_send(sample.to_vec()) {
            tracing::trace!("No consumer left for mock outlet");
        }
    }
}
