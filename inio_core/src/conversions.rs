//! `From` implementations bridging `inio_config` types to `inio_core` types.

use std::time::Duration;

use crate::config::{RetryCfg, SearchKind, SettleCfg, SweepCfg};

// ── SettleCfg ────────────────────────────────────────────────────────────────

impl From<&inio_config::Settle> for SettleCfg {
    fn from(c: &inio_config::Settle) -> Self {
        Self {
            poll_interval: Duration::from_millis(c.poll_interval_ms),
            max_polls: c.max_polls,
        }
    }
}

// ── SweepCfg ─────────────────────────────────────────────────────────────────

impl From<&inio_config::Sweep> for SweepCfg {
    fn from(c: &inio_config::Sweep) -> Self {
        Self {
            retry: RetryCfg {
                max_attempts: c.retry_attempts,
                backoff: Duration::from_millis(c.retry_backoff_ms),
                backoff_max: Duration::from_millis(c.retry_backoff_max_ms),
            },
            final_delay: Duration::from_millis(c.final_delay_ms),
        }
    }
}

// ── SearchKind ───────────────────────────────────────────────────────────────

impl From<&inio_config::EstimatorCfg> for SearchKind {
    fn from(c: &inio_config::EstimatorCfg) -> Self {
        match c.index {
            inio_config::IndexKind::Linear => SearchKind::Linear,
            inio_config::IndexKind::Grid => SearchKind::Grid {
                cell_size: c.cell_size,
            },
        }
    }
}
