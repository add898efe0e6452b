use inio_traits::PowerReading;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InioError {
    #[error("device error: {0}")]
    Device(String),
    #[error("timeout waiting for device")]
    Timeout,
    #[error("power reading did not settle after {polls} polls (last: {last})")]
    DidNotSettle { polls: u32, last: PowerReading },
    #[error("snapshot error: {0}")]
    Snapshot(String),
    #[error("calibration map is empty")]
    EmptyMap,
    #[error("unknown lamp mode: {0}")]
    UnknownMode(String),
    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing lamp")]
    MissingLamp,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
