//! Configuration types for the calibration engine.
//!
//! These are the runtime configuration structs used by the settle detector,
//! the sweep and the estimator. They are separate from the TOML-deserialized
//! config in `inio_config`.

use std::time::Duration;

/// Settle detection: poll cadence and give-up bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleCfg {
    /// Wait between consecutive power polls.
    pub poll_interval: Duration,
    /// Follow-up polls allowed before failing with `DidNotSettle`.
    pub max_polls: u32,
}

impl Default for SettleCfg {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            max_polls: 500,
        }
    }
}

/// Per-point retry policy used by the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryCfg {
    /// Total attempts per grid point (>= 1).
    pub max_attempts: u32,
    /// Wait before the second attempt; doubles for each further attempt.
    pub backoff: Duration,
    /// Upper bound for the doubling backoff.
    pub backoff_max: Duration,
}

impl Default for RetryCfg {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(250),
            backoff_max: Duration::from_secs(4),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepCfg {
    pub retry: RetryCfg,
    /// Pause before the final snapshot write.
    pub final_delay: Duration,
}

impl Default for SweepCfg {
    fn default() -> Self {
        Self {
            retry: RetryCfg::default(),
            final_delay: Duration::from_secs(1),
        }
    }
}

/// How the estimator searches the calibration map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchKind {
    /// Scan every sample.
    Linear,
    /// Bucket samples on a square grid with the given edge length.
    Grid { cell_size: f64 },
}

impl Default for SearchKind {
    fn default() -> Self {
        SearchKind::Grid { cell_size: 8.0 }
    }
}
