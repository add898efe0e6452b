//! Calibration samples and the ordered map that holds them.
//!
//! The map is a plain sequence: during a resumed sweep the same grid key can
//! appear more than once. `compact` collapses those duplicates.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use inio_traits::{PowerReading, Temperature};

/// One measured point: the commanded setting and the settled duty it produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub temperature: Temperature,
    pub power: PowerReading,
}

impl Sample {
    #[inline]
    pub const fn new(temperature: Temperature, power: PowerReading) -> Self {
        Self { temperature, power }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationMap {
    samples: Vec<Sample>,
}

impl CalibrationMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            samples: Vec::with_capacity(n),
        }
    }

    pub fn from_samples(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// Set of grid keys present in the map.
    pub fn keys(&self) -> HashSet<Temperature> {
        self.samples.iter().map(|s| s.temperature).collect()
    }

    /// Latest sample recorded for `t`, if any.
    pub fn get(&self, t: Temperature) -> Option<&Sample> {
        self.samples.iter().rev().find(|s| s.temperature == t)
    }

    pub fn has_duplicates(&self) -> bool {
        self.keys().len() != self.samples.len()
    }

    /// Collapse repeated keys to one sample each.
    ///
    /// Last write wins: a later sample overwrites an earlier one at the same
    /// key, but keeps the slot where the key first appeared.
    pub fn compact(&self) -> CalibrationMap {
        let mut slot: HashMap<Temperature, usize> = HashMap::with_capacity(self.samples.len());
        let mut out: Vec<Sample> = Vec::with_capacity(self.samples.len());
        for s in &self.samples {
            match slot.entry(s.temperature) {
                Entry::Occupied(e) => out[*e.get()] = *s,
                Entry::Vacant(e) => {
                    e.insert(out.len());
                    out.push(*s);
                }
            }
        }
        CalibrationMap { samples: out }
    }

    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }
}

impl FromIterator<Sample> for CalibrationMap {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a CalibrationMap {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

impl Extend<Sample> for CalibrationMap {
    fn extend<I: IntoIterator<Item = Sample>>(&mut self, iter: I) {
        self.samples.extend(iter);
    }
}
