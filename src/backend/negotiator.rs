//! Tracking backend negotiation
//!
//! The accelerated backend is tried first. If the engine cannot be created on
//! it (no GPU, missing runtime, ...) the baseline backend is tried. Only when
//! both fail does the session give up.

use crate::backend::tracker_trait::TrackerFactory;
use crate::config::BackendPolicy;
use crate::error::{PoseStreamError, Result};
use crate::types::{BackendChoice, Calibration};

/// Create a tracker, falling back from the accelerated to the baseline backend
pub fn select_backend<C, F>(
    factory: &mut F,
    calibration: &Calibration,
    policy: BackendPolicy,
) -> Result<(F::Tracker, BackendChoice)>
where
    F: TrackerFactory<C>,
{
    let accelerated_error = match policy {
        BackendPolicy::PreferAccelerated => {
            match factory.create(calibration, BackendChoice::Accelerated) {
                Ok(tracker) => {
                    tracing::info!("Body tracker initialized on accelerated backend");
                    return Ok((tracker, BackendChoice::Accelerated));
                }
                Err(e) => {
                    tracing::warn!(
                        "Accelerated tracker initialization failed, falling back to baseline: {}",
                        e
                    );
                    e.to_string()
                }
            }
        }
        BackendPolicy::BaselineOnly => "skipped by configuration".to_string(),
    };

    match factory.create(calibration, BackendChoice::Baseline) {
        Ok(tracker) => {
            tracing::info!("Body tracker initialized on baseline backend");
            Ok((tracker, BackendChoice::Baseline))
        }
        Err(e) => {
            tracing::error!("Baseline tracker initialization failed: {}", e);
            Err(PoseStreamError::BackendUnavailable {
                accelerated: accelerated_error,
                baseline: e.to_string(),
            })
        }
    }
}
