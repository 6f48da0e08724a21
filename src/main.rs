//! posestream-rs - Main Entry Point
//!
//! Streams the pose of one tracked body from a depth camera. The only
//! argument is an optional path to a TOML configuration file.

use anyhow::Context;
use posestream_rs::config::{AppConfig, LoggingConfig};
use posestream_rs::{PoseStreamError, SessionReport};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = match AppConfig::load_or_default(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("posestream-rs: {}", e);
            return exit_status(e.exit_code());
        }
    };

    let log_guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("posestream-rs: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Starting posestream-rs");

    let status = match run(config) {
        Ok(report) => {
            tracing::info!("Done: {}", report.summary());
            ExitCode::SUCCESS
        }
        Err(e) => exit_status(report_failure(&e)),
    };

    // Flush buffered file logs, including the failure above
    drop(log_guard);
    status
}

/// Log a fatal error and pick the process exit code for it
fn report_failure(error: &anyhow::Error) -> i32 {
    tracing::error!("{:#}", error);
    error
        .downcast_ref::<PoseStreamError>()
        .map_or(1, PoseStreamError::exit_code)
}

fn exit_status(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

/// Non-blocking writer appending to `path`
fn file_writer(path: &Path) -> anyhow::Result<(NonBlocking, WorkerGuard)> {
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let file_name = path
        .file_name()
        .with_context(|| format!("log file {:?} has no file name", path))?;
    let appender = tracing_appender::rolling::never(directory, file_name);
    Ok(tracing_appender::non_blocking(appender))
}

fn init_logging(logging: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.filter))
        .with_context(|| format!("invalid log filter '{}'", logging.filter))?;

    let (file_layer, guard) = match &logging.log_file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}

#[cfg(feature = "mock-device")]
fn run(config: AppConfig) -> anyhow::Result<SessionReport> {
    use posestream_rs::backend::{MockDevice, MockMotion, MockTrackerFactory};
    use posestream_rs::session::{Session, SessionHandle};
    use posestream_rs::stream::MockTransport;

    tracing::warn!("No device driver compiled in, streaming a simulated body");
    if config.capture.frame_limit.is_none() {
        tracing::info!("No frame limit configured, streaming until the process is stopped");
    }

    let device = MockDevice::synthetic(MockMotion::default());
    let factory = MockTrackerFactory::new(device.counters());
    let transport = MockTransport::new();
    let samples = transport.samples();

    // Play the consumer side so the session gets past the consumer wait
    let consumer = std::thread::Builder::new()
        .name("posestream-consumer".to_string())
        .spawn(move || {
            let mut received: u64 = 0;
            for sample in samples.iter() {
                received += 1;
                if received % 30 == 0 {
                    tracing::debug!("Consumer received {} samples ({} values each)", received, sample.len());
                }
            }
            received
        })
        .context("spawning consumer thread")?;

    let session = Session::new(config, device, factory, transport).context("creating session")?;
    let report = SessionHandle::spawn(session)
        .context("spawning session thread")?
        .join()?;

    // The transport (and its sender) went away with the session
    if let Ok(received) = consumer.join() {
        tracing::debug!("Consumer saw {} samples", received);
    }
    Ok(report)
}

#[cfg(not(feature = "mock-device"))]
fn run(_config: AppConfig) -> anyhow::Result<SessionReport> {
    Err(PoseStreamError::DeviceUnavailable(
        "no depth device driver compiled in; build with the mock-device feature".to_string(),
    )
    .into())
}
