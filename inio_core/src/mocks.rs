//! Test and helper mocks for inio_core

use inio_traits::{Lamp, PowerReading, Temperature};

use crate::error::InioError;
use crate::map::CalibrationMap;
use crate::sweep::CheckpointSink;

/// A lamp that errors on every call. Placeholder type of an unfinished
/// `SweepBuilder`, and handy for exercising failure paths.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeadLamp;

impl Lamp for DeadLamp {
    fn power(&mut self) -> Result<PowerReading, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("dead lamp")))
    }

    fn set_color(&mut self, _to: Temperature) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("dead lamp")))
    }
}

/// Checkpoint sink that keeps every persisted map in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Map length at each successful persist.
    pub lengths: Vec<usize>,
    pub last: Option<CalibrationMap>,
    /// Number of upcoming persists that should fail.
    pub fail_next: usize,
}

impl CheckpointSink for MemorySink {
    fn persist(&mut self, map: &CalibrationMap) -> Result<(), InioError> {
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(InioError::Snapshot("memory sink refused write".into()));
        }
        self.lengths.push(map.len());
        self.last = Some(map.clone());
        Ok(())
    }
}
