#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Lamp calibration core (hardware-agnostic).
//!
//! This crate learns the mapping between an Inio lamp's control settings
//! (brightness, color temperature) and the PWM duty it reports, and inverts
//! it. All device interactions go through `inio_traits::Lamp` and
//! `inio_traits::ModeSwitch`.
//!
//! ## Architecture
//!
//! - **Grid**: the 101 x 381 control domain (`grid`)
//! - **Settle detection**: bounded poll until the duty stops changing (`settle`)
//! - **Sweep**: resumable, checkpointed sampling of the whole grid (`sweep`, `builder`)
//! - **Compaction and snapshots**: one sample per key, 4-tuple JSON on disk (`map`, `snapshot`)
//! - **Estimation**: nearest-neighbour inversion, linear or grid-indexed (`estimator`)
//! - **Accessory**: home-automation get/set on top of the above (`accessory`, `transitions`)
//! - **Verification**: random spot checks of a finished map (`verify`)

pub mod accessory;
pub mod builder;
pub mod config;
pub mod conversions;
pub mod error;
pub mod estimator;
pub mod grid;
pub mod hw_error;
pub mod map;
pub mod mocks;
pub mod settle;
pub mod snapshot;
pub mod sweep;
pub mod transitions;
pub mod verify;

pub use accessory::{Accessory, MAX_MIREDS, MIN_MIREDS, kelvin_to_mireds, mireds_to_kelvin};
pub use builder::SweepBuilder;
pub use config::{RetryCfg, SearchKind, SettleCfg, SweepCfg};
pub use error::{BuildError, InioError, Result};
pub use estimator::{Estimator, GridIndex, Match, distance};
pub use map::{CalibrationMap, Sample};
pub use settle::SettleDetector;
pub use snapshot::SnapshotFile;
pub use sweep::{CheckpointSink, FailedPoint, SweepReport, Sweeper};
pub use transitions::{Goal, TransitionTable};
pub use verify::{TrialResult, VerifyReport};

pub use inio_traits::{Button, Mode, PowerReading, Temperature};

/// Load a snapshot and compact it in place. Returns `(before, after)` sample counts.
pub fn compact_file(file: &SnapshotFile) -> std::result::Result<(usize, usize), InioError> {
    let map = file.load()?;
    let before = map.len();
    let compacted = map.compact();
    let after = compacted.len();
    file.save(&compacted)?;
    tracing::info!(path = %file.path().display(), before, after, "snapshot compacted");
    Ok((before, after))
}

/// Load a snapshot for estimation. A missing, malformed or empty snapshot is fatal.
pub fn load_estimator(
    file: &SnapshotFile,
    search: SearchKind,
) -> std::result::Result<Estimator, InioError> {
    let map = file.load()?;
    let map = if map.has_duplicates() {
        map.compact()
    } else {
        map
    };
    Estimator::with_search(map, search)
}
