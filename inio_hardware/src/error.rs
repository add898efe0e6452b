use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("http transport error: {0}")]
    Transport(String),
    #[error("request to {path} timed out")]
    Timeout { path: &'static str },
    #[error("lamp answered {path} with HTTP {status}")]
    Status { path: &'static str, status: u16 },
    #[error("could not decode lamp response from {path}: {reason}")]
    Decode { path: &'static str, reason: String },
    #[error("invalid lamp url: {0}")]
    InvalidUrl(String),
    #[error("simulated fault: {0}")]
    Simulated(String),
}

pub type Result<T> = std::result::Result<T, HwError>;
