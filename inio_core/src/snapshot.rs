//! Flat JSON snapshot of a calibration map.
//!
//! One 4-tuple per sample, `[brightness, kelvin, warm, cold]`, with every
//! field rounded to 5 decimal digits. Writes go through a sibling `.tmp`
//! file and a rename so a killed process never leaves a torn snapshot.

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use inio_traits::{PowerReading, Temperature};
use tracing::debug;

use crate::error::InioError;
use crate::grid;
use crate::map::{CalibrationMap, Sample};
use crate::sweep::CheckpointSink;

pub const DECIMALS: i32 = 5;

#[inline]
pub fn round5(x: f64) -> f64 {
    let f = 10f64.powi(DECIMALS);
    let y = (x * f).round() / f;
    // values near f64::MAX overflow when scaled
    if y.is_finite() { y } else { x }
}

type Row = (u8, u16, f64, f64);

/// Encode the map as compact rows in map order.
pub fn encode(map: &CalibrationMap) -> Vec<Row> {
    map.iter()
        .map(|s| {
            (
                s.temperature.brightness,
                s.temperature.kelvin,
                round5(s.power.warm),
                round5(s.power.cold),
            )
        })
        .collect()
}

pub fn to_json(map: &CalibrationMap) -> Result<String, InioError> {
    serde_json::to_string(&encode(map)).map_err(|e| InioError::Snapshot(e.to_string()))
}

/// Parse and validate snapshot text. Rejects anything that is not a list of
/// 4-number entries on the calibration grid with non-negative duty.
pub fn from_json(text: &str) -> Result<CalibrationMap, InioError> {
    let rows: Vec<Vec<f64>> = serde_json::from_str(text)
        .map_err(|e| InioError::Snapshot(format!("not a list of numeric tuples: {e}")))?;
    let mut map = CalibrationMap::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        map.push(decode_row(i, row)?);
    }
    Ok(map)
}

fn decode_row(i: usize, row: &[f64]) -> Result<Sample, InioError> {
    let bad = |what: String| InioError::Snapshot(format!("entry {i}: {what}"));
    let &[b, k, warm, cold] = row else {
        return Err(bad(format!("expected 4 fields, got {}", row.len())));
    };
    if !(b.fract() == 0.0 && (0.0..=f64::from(grid::BRIGHTNESS_MAX)).contains(&b)) {
        return Err(bad(format!("brightness {b} outside 0..=100")));
    }
    if !(k.fract() == 0.0 && (f64::from(grid::KELVIN_MIN)..=f64::from(grid::KELVIN_MAX)).contains(&k))
    {
        return Err(bad(format!("kelvin {k} outside 2700..=6500")));
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let temperature = Temperature::new(b as u8, k as u16);
    if !grid::is_grid_point(temperature) {
        return Err(bad(format!("kelvin {k} is not on the 10 K grid")));
    }
    for (name, v) in [("warm", warm), ("cold", cold)] {
        if !(v.is_finite() && v >= 0.0) {
            return Err(bad(format!("{name} power {v} must be a non-negative number")));
        }
    }
    Ok(Sample::new(temperature, PowerReading::new(cold, warm)))
}

/// Snapshot stored at a filesystem path.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load a snapshot that must exist (estimator startup).
    pub fn load(&self) -> Result<CalibrationMap, InioError> {
        let text = fs::read_to_string(&self.path).map_err(|e| {
            InioError::Snapshot(format!("cannot read {}: {e}", self.path.display()))
        })?;
        let map = from_json(&text)
            .map_err(|e| InioError::Snapshot(format!("{}: {e}", self.path.display())))?;
        debug!(path = %self.path.display(), samples = map.len(), "snapshot loaded");
        Ok(map)
    }

    /// Load a snapshot for resuming a sweep; a missing file is an empty map.
    pub fn load_or_empty(&self) -> Result<CalibrationMap, InioError> {
        match fs::metadata(&self.path) {
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no snapshot yet, starting empty");
                Ok(CalibrationMap::new())
            }
            _ => self.load(),
        }
    }

    pub fn save(&self, map: &CalibrationMap) -> Result<(), InioError> {
        let json = to_json(map)?;
        let tmp = self.tmp_path();
        fs::write(&tmp, json).map_err(|e| {
            InioError::Snapshot(format!("cannot write {}: {e}", tmp.display()))
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            InioError::Snapshot(format!("cannot replace {}: {e}", self.path.display()))
        })?;
        debug!(path = %self.path.display(), samples = map.len(), "snapshot written");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl CheckpointSink for SnapshotFile {
    fn persist(&mut self, map: &CalibrationMap) -> Result<(), InioError> {
        self.save(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn encodes_warm_before_cold_with_five_decimals() {
        let map = CalibrationMap::from_samples(vec![Sample::new(
            Temperature::new(42, 3100),
            PowerReading::new(1.234_567_89, 200.000_004),
        )]);
        assert_eq!(to_json(&map).unwrap(), "[[42,3100,200.0,1.23457]]");
    }

    #[test]
    fn accepts_integers_written_as_floats() {
        let map = from_json("[[10.0,2700.0,1,2]]").unwrap();
        assert_eq!(
            map.samples()[0],
            Sample::new(Temperature::new(10, 2700), PowerReading::new(2.0, 1.0))
        );
    }

    #[rstest]
    #[case("{}", "not a list")]
    #[case("[[1,2700,0]]", "expected 4 fields")]
    #[case("[[101,2700,0,0]]", "brightness 101")]
    #[case("[[1.5,2700,0,0]]", "brightness 1.5")]
    #[case("[[1,2600,0,0]]", "kelvin 2600")]
    #[case("[[1,2705,0,0]]", "not on the 10 K grid")]
    #[case("[[1,2700,-1,0]]", "warm power -1")]
    #[case("[[1,2700,0,\"x\"]]", "not a list")]
    fn rejects_malformed_entries(#[case] text: &str, #[case] needle: &str) {
        let err = from_json(text).unwrap_err();
        assert!(format!("{err}").contains(needle), "{err}");
    }

    #[test]
    fn rounding_keeps_five_decimals() {
        assert_eq!(round5(1.000_006), 1.00001);
        assert_eq!(round5(1.000_004_9), 1.0);
        assert_eq!(round5(12.0), 12.0);
    }
}
