//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "inio", version, about = "Inio lamp calibration CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/inio.toml")]
    pub config: PathBuf,

    /// Print results and errors as JSON lines instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Home-automation characteristic exposed by the accessory adapter.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Characteristic {
    /// Light on/off (true|false)
    On,
    /// Connected to the controller (true|false)
    Mode,
    /// Brightness, 0..=100
    Brightness,
    /// Color temperature in mireds
    ColorTemperature,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sweep the full control grid, resuming from the snapshot, then compact it
    Calibrate {
        /// Snapshot file (overrides sweep.snapshot)
        #[arg(long, value_name = "FILE")]
        snapshot: Option<PathBuf>,
    },
    /// Collapse duplicate grid points in the snapshot, last write wins
    Compact {
        /// Snapshot file (overrides sweep.snapshot)
        #[arg(long, value_name = "FILE")]
        snapshot: Option<PathBuf>,
    },
    /// Invert a power reading offline against the snapshot
    Estimate {
        /// Cold channel duty
        #[arg(long)]
        cold: f64,
        /// Warm channel duty
        #[arg(long)]
        warm: f64,
        #[arg(long, value_name = "FILE")]
        snapshot: Option<PathBuf>,
    },
    /// Read the lamp's settled duty and estimate its current setting
    Read,
    /// Command random settings and check the estimate recovers them
    Verify {
        /// Number of random trials
        #[arg(long, default_value_t = 100)]
        trials: usize,
        /// Seed for reproducible trials
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Read one accessory characteristic
    Get {
        #[arg(value_enum)]
        what: Characteristic,
    },
    /// Write one accessory characteristic
    Set {
        #[arg(value_enum)]
        what: Characteristic,
        /// true|false for on/mode, a number otherwise
        value: String,
    },
    /// Check config, snapshot and device reachability
    SelfCheck,
}
