//! Human-readable error descriptions and structured JSON error formatting.

use inio_core::error::{BuildError, InioError};
use serde_json::json;

/// Stable name for an error class, used in JSON output.
pub fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "Build";
    }
    match err.downcast_ref::<InioError>() {
        Some(InioError::Device(_)) => "Device",
        Some(InioError::Timeout) => "Timeout",
        Some(InioError::DidNotSettle { .. }) => "DidNotSettle",
        Some(InioError::Snapshot(_)) => "Snapshot",
        Some(InioError::EmptyMap) => "EmptyMap",
        Some(InioError::UnknownMode(_)) => "UnknownMode",
        Some(InioError::Config(_)) => "Config",
        None => "Error",
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingLamp => {
                "What happened: No lamp was provided to the sweep.\nLikely causes: The device backend failed to initialize.\nHow to fix: Check [device] in the config and that the lamp is reachable.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(ie) = err.downcast_ref::<InioError>() {
        return match ie {
            InioError::Timeout => "What happened: The lamp did not answer in time.\nLikely causes: Wrong device.url, lamp powered off or off the network, or request timeout too low.\nHow to fix: Check the lamp's address and consider raising device.request_timeout_ms.".to_string(),
            InioError::DidNotSettle { polls, last } => format!(
                "What happened: The lamp's power reading did not settle after {polls} polls (last: {last}).\nLikely causes: The lamp is still fading, another controller is changing it, or the poll interval is too short.\nHow to fix: Make sure nothing else drives the lamp, then raise settle.max_polls or settle.poll_interval_ms."
            ),
            InioError::Snapshot(msg) => format!(
                "What happened: The calibration snapshot could not be used ({msg}).\nLikely causes: Calibration has not been run yet, or the file was edited or truncated.\nHow to fix: Run `inio calibrate` to create or repair it, or point sweep.snapshot at the right file."
            ),
            InioError::EmptyMap => "What happened: The calibration snapshot holds no samples.\nLikely causes: Calibration was interrupted before the first row completed.\nHow to fix: Run `inio calibrate` until at least one row has been written.".to_string(),
            InioError::UnknownMode(mode) => format!(
                "What happened: The lamp reported an unsupported mode ({mode}).\nLikely causes: Newer firmware or a mode set from the vendor app.\nHow to fix: Switch the lamp to a normal mode with its buttons, then retry."
            ),
            InioError::Device(msg) => format!(
                "What happened: The lamp returned an error ({msg}).\nLikely causes: Network problems or an unexpected API response.\nHow to fix: Re-run with --log-level=debug for the request details."
            ),
            InioError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("invalid value") {
        return format!(
            "What happened: {msg}.\nHow to fix: See `inio set --help` for accepted values."
        );
    }

    if lower.starts_with("read config") {
        return format!(
            "What happened: The config file could not be read ({msg}).\nLikely causes: Wrong --config path.\nHow to fix: Pass --config <FILE> pointing at an existing TOML file."
        );
    }

    if lower.contains("invalid configuration")
        || lower.contains("must be")
        || lower.contains("unreasonably large")
    {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nLikely causes: Missing or out-of-range values.\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Map error classes to stable exit codes; anything unclassified returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<InioError>() {
        Some(InioError::DidNotSettle { .. }) => 3,
        Some(InioError::Timeout) => 4,
        Some(InioError::Snapshot(_) | InioError::EmptyMap) => 5,
        Some(InioError::Device(_)) => 6,
        Some(InioError::UnknownMode(_)) => 7,
        Some(InioError::Config(_)) | None => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    let reason = reason_name(err);
    let msg = humanize(err);
    match err.downcast_ref::<InioError>() {
        Some(InioError::DidNotSettle { polls, last }) => json!({
            "reason": reason,
            "details": { "polls": polls, "cold": last.cold, "warm": last.warm },
            "message": msg,
        }),
        Some(InioError::UnknownMode(mode)) => json!({
            "reason": reason,
            "details": { "mode": mode },
            "message": msg,
        }),
        _ => json!({ "reason": reason, "message": msg }),
    }
    .to_string()
}
