//! Spot-check a calibration map against the live lamp.
//!
//! Each trial commands a random setting, waits for the duty to settle,
//! inverts the reading and compares the estimate with what was commanded.

use inio_traits::{Lamp, PowerReading, Temperature};
use rand::Rng;
use tracing::{debug, info};

use crate::error::InioError;
use crate::estimator::Estimator;
use crate::grid::{BRIGHTNESS_MAX, BRIGHTNESS_MIN, KELVIN_MAX, KELVIN_MIN};
use crate::hw_error::map_device_error;
use crate::settle::SettleDetector;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialResult {
    pub target: Temperature,
    pub reading: PowerReading,
    pub estimate: Temperature,
    /// Squared power-space distance between the reading and the matched sample.
    pub distance: f64,
}

impl TrialResult {
    pub fn brightness_error(&self) -> u8 {
        self.target.brightness.abs_diff(self.estimate.brightness)
    }

    pub fn kelvin_error(&self) -> u16 {
        self.target.kelvin.abs_diff(self.estimate.kelvin)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerifyReport {
    pub trials: Vec<TrialResult>,
}

impl VerifyReport {
    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn max_brightness_error(&self) -> u8 {
        self.trials.iter().map(TrialResult::brightness_error).max().unwrap_or(0)
    }

    pub fn max_kelvin_error(&self) -> u16 {
        self.trials.iter().map(TrialResult::kelvin_error).max().unwrap_or(0)
    }

    pub fn mean_brightness_error(&self) -> f64 {
        self.mean(|t| f64::from(t.brightness_error()))
    }

    pub fn mean_kelvin_error(&self) -> f64 {
        self.mean(|t| f64::from(t.kelvin_error()))
    }

    pub fn mean_distance(&self) -> f64 {
        self.mean(|t| t.distance)
    }

    fn mean(&self, f: impl Fn(&TrialResult) -> f64) -> f64 {
        if self.trials.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = self.trials.len() as f64;
        self.trials.iter().map(f).sum::<f64>() / n
    }
}

/// Run one trial against a given target.
pub fn run_trial<L: Lamp + ?Sized>(
    lamp: &mut L,
    settle: &SettleDetector,
    estimator: &Estimator,
    target: Temperature,
) -> Result<TrialResult, InioError> {
    lamp.set_color(target).map_err(|e| map_device_error(&*e))?;
    let reading = settle.read_stable(lamp)?;
    let m = estimator.nearest(reading);
    let trial = TrialResult {
        target,
        reading,
        estimate: m.sample.temperature,
        distance: m.distance,
    };
    debug!(
        %target,
        estimate = %trial.estimate,
        distance = trial.distance,
        "verify trial"
    );
    Ok(trial)
}

/// Run `trials` random trials. Kelvin targets are not restricted to the
/// 10 K grid, so the estimate can differ from the target by up to half a step.
pub fn run_trials<L, R>(
    lamp: &mut L,
    settle: &SettleDetector,
    estimator: &Estimator,
    trials: usize,
    rng: &mut R,
) -> Result<VerifyReport, InioError>
where
    L: Lamp + ?Sized,
    R: Rng,
{
    let mut report = VerifyReport {
        trials: Vec::with_capacity(trials),
    };
    for _ in 0..trials {
        let target = Temperature::new(
            rng.gen_range(BRIGHTNESS_MIN..=BRIGHTNESS_MAX),
            rng.gen_range(KELVIN_MIN..KELVIN_MAX),
        );
        report.trials.push(run_trial(lamp, settle, estimator, target)?);
    }
    info!(
        trials = report.len(),
        max_brightness_error = report.max_brightness_error(),
        max_kelvin_error = report.max_kelvin_error(),
        mean_distance = report.mean_distance(),
        "verification done"
    );
    Ok(report)
}
