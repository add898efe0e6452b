#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the Inio lamp tools.
//!
//! - `Config` and sub-structs are deserialized from TOML; every section and
//!   field has a default so an empty file is a valid (http) config.
//! - `validate()` rejects values that would make the sweep or the settle
//!   loop misbehave.
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Which device implementation the tools talk to.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// The lamp's REST API.
    #[default]
    Http,
    /// In-process simulated lamp (development and tests).
    Simulated,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Device {
    pub backend: Backend,
    /// Base URL of the lamp, e.g. "http://192.168.161.151"
    pub url: String,
    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for Device {
    fn default() -> Self {
        Self {
            backend: Backend::Http,
            url: "http://192.168.161.151".to_string(),
            request_timeout_ms: 2000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Settle {
    /// Delay between consecutive power polls. Also accepts alias "delay_ms".
    #[serde(alias = "delay_ms")]
    pub poll_interval_ms: u64,
    /// Give up after this many polls without two equal readings in a row
    pub max_polls: u32,
}

impl Default for Settle {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10,
            max_polls: 500,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Sweep {
    /// Snapshot file read at startup and rewritten after every brightness row
    pub snapshot: PathBuf,
    /// Attempts per grid point before it is recorded as failed
    pub retry_attempts: u32,
    /// First backoff between attempts; doubles up to `retry_backoff_max_ms`
    pub retry_backoff_ms: u64,
    pub retry_backoff_max_ms: u64,
    /// Pause before the final snapshot write
    pub final_delay_ms: u64,
}

impl Default for Sweep {
    fn default() -> Self {
        Self {
            snapshot: PathBuf::from("data-packed.json"),
            retry_attempts: 3,
            retry_backoff_ms: 250,
            retry_backoff_max_ms: 4000,
            final_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Scan every sample on each lookup.
    Linear,
    /// Bucket samples on a square grid over the power plane.
    #[default]
    Grid,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EstimatorCfg {
    pub index: IndexKind,
    /// Bucket edge length in duty units (grid index only)
    pub cell_size: f64,
}

impl Default for EstimatorCfg {
    fn default() -> Self {
        Self {
            index: IndexKind::Grid,
            cell_size: 8.0,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub device: Device,
    pub settle: Settle,
    pub sweep: Sweep,
    pub estimator: EstimatorCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read and parse a config file. Validation is left to the caller.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {}: {}", path.display(), e))?;
    load_toml(&text).map_err(|e| eyre::eyre!("invalid configuration in {}: {}", path.display(), e))
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Device
        if self.device.backend == Backend::Http && self.device.url.trim().is_empty() {
            eyre::bail!("device.url must be set for the http backend");
        }
        if self.device.request_timeout_ms == 0 {
            eyre::bail!("device.request_timeout_ms must be >= 1");
        }

        // Settle
        if self.settle.max_polls == 0 {
            eyre::bail!("settle.max_polls must be >= 1");
        }
        if self.settle.poll_interval_ms > 60 * 1000 {
            eyre::bail!("settle.poll_interval_ms is unreasonably large (>1min)");
        }

        // Sweep
        if self.sweep.snapshot.as_os_str().is_empty() {
            eyre::bail!("sweep.snapshot must be a file path");
        }
        if self.sweep.retry_attempts == 0 {
            eyre::bail!("sweep.retry_attempts must be >= 1");
        }
        if self.sweep.retry_backoff_max_ms < self.sweep.retry_backoff_ms {
            eyre::bail!("sweep.retry_backoff_max_ms must be >= sweep.retry_backoff_ms");
        }

        // Estimator
        if !(self.estimator.cell_size.is_finite() && self.estimator.cell_size > 0.0) {
            eyre::bail!("estimator.cell_size must be a positive number");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot}");
        }

        Ok(())
    }
}
