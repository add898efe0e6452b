//! Type-state builder for `Sweeper`.
//!
//! The builder enforces at compile time that a lamp is provided before
//! `build()` is available. `try_build()` is always available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use inio_traits::Lamp;
use inio_traits::clock::{Clock, MonotonicClock};

use crate::config::{SettleCfg, SweepCfg};
use crate::error::{BuildError, Result};
use crate::mocks::DeadLamp;
use crate::settle::SettleDetector;
use crate::sweep::Sweeper;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Sweeper`. All fields are validated on `build()`.
pub struct SweepBuilder<L, S> {
    lamp: Option<L>,
    settle: SettleCfg,
    sweep: SweepCfg,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    shutdown: Option<Arc<AtomicBool>>,
    _s: PhantomData<S>,
}

impl Default for SweepBuilder<DeadLamp, Missing> {
    fn default() -> Self {
        Self {
            lamp: None,
            settle: SettleCfg::default(),
            sweep: SweepCfg::default(),
            clock: None,
            shutdown: None,
            _s: PhantomData,
        }
    }
}

impl SweepBuilder<DeadLamp, Missing> {
    /// Start building a Sweeper.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<L, S> SweepBuilder<L, S> {
    /// Provide the lamp to sweep.
    pub fn with_lamp<L2: Lamp>(self, lamp: L2) -> SweepBuilder<L2, Set> {
        SweepBuilder {
            lamp: Some(lamp),
            settle: self.settle,
            sweep: self.sweep,
            clock: self.clock,
            shutdown: self.shutdown,
            _s: PhantomData,
        }
    }

    pub fn with_settle(mut self, settle: SettleCfg) -> Self {
        self.settle = settle;
        self
    }

    pub fn with_sweep(mut self, sweep: SweepCfg) -> Self {
        self.sweep = sweep;
        self
    }

    /// Clock used for settle polling, retry backoff and the final delay.
    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Flag checked between grid points; when set the sweep checkpoints and stops.
    pub fn with_shutdown(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown = Some(flag);
        self
    }
}

impl<L: Lamp, S> SweepBuilder<L, S> {
    /// Validate and construct, reporting a missing lamp as `BuildError::MissingLamp`.
    pub fn try_build(self) -> Result<Sweeper<L>> {
        let Some(lamp) = self.lamp else {
            return Err(eyre::Report::new(BuildError::MissingLamp));
        };
        if self.settle.max_polls == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "settle max_polls must be >= 1",
            )));
        }
        if self.sweep.retry.max_attempts == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "retry max_attempts must be >= 1",
            )));
        }
        if self.sweep.retry.backoff_max < self.sweep.retry.backoff {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "retry backoff_max must be >= backoff",
            )));
        }
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        Ok(Sweeper {
            lamp,
            settle: SettleDetector::with_clock(self.settle, Arc::clone(&clock)),
            cfg: self.sweep,
            clock,
            shutdown: self.shutdown,
        })
    }
}

impl<L: Lamp> SweepBuilder<L, Set> {
    pub fn build(self) -> Result<Sweeper<L>> {
        self.try_build()
    }
}
