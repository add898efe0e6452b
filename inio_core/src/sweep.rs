//! The calibration sweep: sample every grid point the map does not yet have.
//!
//! Rows are swept brightness-major, kelvin-minor. Keys already present in
//! the seed map are skipped, so a killed sweep resumes where its last
//! checkpoint left off. A checkpoint is written after every brightness row.
//!
//! A point that keeps failing after its retries is reported in
//! `SweepReport::failed` and left unvisited; the next run tries it again.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use eyre::WrapErr;
use inio_traits::clock::Clock;
use inio_traits::{Lamp, PowerReading, Temperature};
use tracing::{debug, info, warn};

use crate::config::SweepCfg;
use crate::error::{InioError, Result};
use crate::grid;
use crate::hw_error::map_device_error;
use crate::map::{CalibrationMap, Sample};
use crate::settle::SettleDetector;

/// Where the sweep writes its progress.
pub trait CheckpointSink {
    fn persist(&mut self, map: &CalibrationMap) -> std::result::Result<(), InioError>;
}

/// A grid point that could not be sampled in this run.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedPoint {
    pub temperature: Temperature,
    pub attempts: u32,
    pub error: InioError,
}

#[derive(Debug, Clone)]
pub struct SweepReport {
    /// Seed samples followed by everything sampled in this run.
    pub map: CalibrationMap,
    /// Points sampled in this run.
    pub sampled: usize,
    /// Points skipped because the seed already had them.
    pub skipped: usize,
    pub failed: Vec<FailedPoint>,
    /// Checkpoints written successfully, final write included.
    pub checkpoints: usize,
    /// Stopped early on the shutdown flag.
    pub interrupted: bool,
}

pub struct Sweeper<L> {
    pub(crate) lamp: L,
    pub(crate) settle: SettleDetector,
    pub(crate) cfg: SweepCfg,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) shutdown: Option<Arc<AtomicBool>>,
}

impl<L> core::fmt::Debug for Sweeper<L> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Sweeper")
            .field("settle", &self.settle)
            .field("cfg", &self.cfg)
            .finish_non_exhaustive()
    }
}

impl<L: Lamp> Sweeper<L> {
    pub fn lamp(&self) -> &L {
        &self.lamp
    }

    pub fn into_lamp(self) -> L {
        self.lamp
    }

    /// Command `t` and return the settled duty.
    pub fn sample_point(&mut self, t: Temperature) -> std::result::Result<PowerReading, InioError> {
        self.lamp
            .set_color(t)
            .map_err(|e| map_device_error(&*e))?;
        self.settle.read_stable(&mut self.lamp)
    }

    fn sample_with_retry(&mut self, t: Temperature) -> std::result::Result<PowerReading, FailedPoint> {
        let attempts = self.cfg.retry.max_attempts.max(1);
        let mut backoff = self.cfg.retry.backoff;
        let mut attempt = 1;
        loop {
            match self.sample_point(t) {
                Ok(power) => {
                    if attempt > 1 {
                        info!(%t, attempt, "grid point recovered after retry");
                    }
                    return Ok(power);
                }
                Err(error) => {
                    warn!(%t, attempt, attempts, %error, "sampling grid point failed");
                    if attempt >= attempts {
                        return Err(FailedPoint {
                            temperature: t,
                            attempts: attempt,
                            error,
                        });
                    }
                    self.clock.sleep(backoff);
                    backoff = backoff.saturating_mul(2).min(self.cfg.retry.backoff_max);
                    attempt += 1;
                }
            }
        }
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(|f| f.load(Ordering::Relaxed))
    }

    /// Extend `seed` over the whole grid, checkpointing into `sink`.
    pub fn run(
        &mut self,
        seed: CalibrationMap,
        sink: &mut dyn CheckpointSink,
    ) -> Result<SweepReport> {
        let mut map = seed;
        let mut visited: HashSet<Temperature> = map.keys();
        let mut report_failed = Vec::new();
        let mut sampled = 0usize;
        let mut skipped = 0usize;
        let mut checkpoints = 0usize;
        let mut interrupted = false;

        info!(
            seed = map.len(),
            unique = visited.len(),
            remaining = grid::GRID_POINTS.saturating_sub(visited.len()),
            "sweep start"
        );

        'rows: for brightness in grid::brightness_rows() {
            let mut row_sampled = 0usize;
            for t in grid::row(brightness) {
                if self.shutdown_requested() {
                    interrupted = true;
                    break 'rows;
                }
                if visited.contains(&t) {
                    skipped += 1;
                    continue;
                }
                match self.sample_with_retry(t) {
                    Ok(power) => {
                        debug!(%t, cold = power.cold, warm = power.warm, "sampled");
                        map.push(Sample::new(t, power));
                        visited.insert(t);
                        sampled += 1;
                        row_sampled += 1;
                    }
                    Err(failed) => {
                        warn!(
                            t = %failed.temperature,
                            attempts = failed.attempts,
                            error = %failed.error,
                            "grid point skipped"
                        );
                        report_failed.push(failed);
                    }
                }
            }
            match sink.persist(&map) {
                Ok(()) => checkpoints += 1,
                Err(e) => warn!(brightness, error = %e, "row checkpoint failed; continuing"),
            }
            info!(brightness, row_sampled, total = map.len(), "row complete");
        }

        if interrupted {
            warn!(total = map.len(), "sweep interrupted; writing checkpoint");
            match sink.persist(&map) {
                Ok(()) => checkpoints += 1,
                Err(e) => warn!(error = %e, "interrupt checkpoint failed"),
            }
        } else {
            self.clock.sleep(self.cfg.final_delay);
            sink.persist(&map)
                .map_err(eyre::Report::new)
                .wrap_err("final snapshot write failed")?;
            checkpoints += 1;
        }

        info!(
            sampled,
            skipped,
            failed = report_failed.len(),
            total = map.len(),
            interrupted,
            "sweep finished"
        );

        Ok(SweepReport {
            map,
            sampled,
            skipped,
            failed: report_failed,
            checkpoints,
            interrupted,
        })
    }
}
