//! Maps `Box<dyn Error>` from trait boundaries to typed `InioError`.
//!
//! The traits in `inio_traits` use `Box<dyn Error + Send + Sync>` for maximum
//! flexibility; this module converts those to our typed error enum, with an
//! optional feature-gated path for `inio_hardware::HwError` downcasting.

use crate::error::InioError;

/// Map a trait-boundary error to a typed `InioError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_device_error(e: &(dyn std::error::Error + 'static)) -> InioError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<inio_hardware::error::HwError>() {
            return match hw {
                inio_hardware::error::HwError::Timeout { .. } => InioError::Timeout,
                other => InioError::Device(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timed out") || s.to_lowercase().contains("timeout") {
        InioError::Timeout
    } else {
        InioError::Device(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_errors_fall_back_to_strings() {
        let e: Box<dyn std::error::Error + Send + Sync> = "connection refused".into();
        assert_eq!(
            map_device_error(&*e),
            InioError::Device("connection refused".into())
        );
        let t: Box<dyn std::error::Error + Send + Sync> = "operation timed out".into();
        assert_eq!(map_device_error(&*t), InioError::Timeout);
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn hw_timeout_downcasts() {
        let e: Box<dyn std::error::Error + Send + Sync> =
            Box::new(inio_hardware::error::HwError::Timeout { path: "/x" });
        assert_eq!(map_device_error(&*e), InioError::Timeout);
        let s: Box<dyn std::error::Error + Send + Sync> =
            Box::new(inio_hardware::error::HwError::Status {
                path: "/x",
                status: 503,
            });
        assert!(matches!(map_device_error(&*s), InioError::Device(m) if m.contains("503")));
    }
}
