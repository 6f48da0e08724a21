//! Mock construction helpers

use crossbeam_channel::Receiver;
use posestream_rs::backend::{MockCounters, MockDevice, MockStep, MockTrackerFactory};
use posestream_rs::config::AppConfig;
use posestream_rs::session::Session;
use posestream_rs::stream::MockTransport;

pub type MockSession = Session<MockDevice, MockTrackerFactory, MockTransport>;

/// A session over simulated collaborators plus the handles tests inspect
pub struct MockRig {
    pub session: MockSession,
    pub counters: MockCounters,
    pub samples: Receiver<Vec<f32>>,
}

/// Scripted session with both tracker backends available
pub fn scripted_rig(config: AppConfig, steps: Vec<MockStep>) -> MockRig {
    let device = MockDevice::scripted(steps);
    let factory = MockTrackerFactory::new(device.counters());
    rig_from_parts(config, device, factory, MockTransport::new())
}

/// Session from explicitly configured parts
pub fn rig_from_parts(
    config: AppConfig,
    device: MockDevice,
    factory: MockTrackerFactory,
    transport: MockTransport,
) -> MockRig {
    let counters = device.counters();
    let samples = transport.samples();
    let session = Session::new(config, device, factory, transport).expect("valid test config");
    MockRig {
        session,
        counters,
        samples,
    }
}
