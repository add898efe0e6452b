//! Device assembly and one function per subcommand.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use eyre::{Result, WrapErr};
use inio_config::{Backend, Config};
use inio_core::verify::run_trials;
use inio_core::{
    Accessory, Estimator, SearchKind, SettleCfg, SettleDetector, SnapshotFile, SweepBuilder,
    SweepCfg, SweepReport, compact_file, kelvin_to_mireds, load_estimator,
};
use inio_hardware::SimulatedLamp;
use inio_traits::{Lamp, Mode, ModeSwitch, PowerReading};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::{Value, json};

use crate::cli::Characteristic;

/// Anything the CLI can drive: power readings, colors and mode buttons.
pub trait LampDevice: Lamp + ModeSwitch + Send {}
impl<T: Lamp + ModeSwitch + Send> LampDevice for T {}

/// Print a result either as one JSON line or as text.
fn emit(json_mode: bool, value: &Value, text: &str) {
    if json_mode {
        println!("{value}");
    } else {
        println!("{text}");
    }
}

/// Simulated lamp, shaped by test hooks in the environment:
/// `INIO_TEST_SIM_LAG=<reads>`, `INIO_TEST_SIM_NEVER_SETTLE=1`, `INIO_TEST_SIM_MODE=<WIRE>`.
fn simulated_from_env() -> SimulatedLamp {
    let mut lamp = SimulatedLamp::new();
    if let Some(lag) = std::env::var("INIO_TEST_SIM_LAG")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
    {
        lamp = lamp.with_lag(lag);
    }
    if std::env::var("INIO_TEST_SIM_NEVER_SETTLE").is_ok_and(|v| v == "1") {
        lamp = lamp.never_settle();
    }
    if let Ok(mode) = std::env::var("INIO_TEST_SIM_MODE") {
        lamp = lamp.with_mode(Mode::from_wire(&mode));
    }
    lamp
}

pub fn open_device(cfg: &Config) -> Result<Box<dyn LampDevice>> {
    match cfg.device.backend {
        Backend::Simulated => {
            tracing::info!("using simulated lamp");
            Ok(Box::new(simulated_from_env()))
        }
        #[cfg(feature = "http")]
        Backend::Http => {
            let timeout = std::time::Duration::from_millis(cfg.device.request_timeout_ms);
            let lamp = inio_hardware::HttpLamp::new(&cfg.device.url, timeout)
                .wrap_err("open lamp connection")?;
            tracing::info!(url = %cfg.device.url, "using http lamp");
            Ok(Box::new(lamp))
        }
        #[cfg(not(feature = "http"))]
        Backend::Http => {
            eyre::bail!("http backend not compiled in; rebuild with the `http` feature")
        }
    }
}

fn snapshot_file(cfg: &Config, overridden: Option<&Path>) -> SnapshotFile {
    let path: PathBuf = overridden.map_or_else(|| cfg.sweep.snapshot.clone(), Path::to_path_buf);
    SnapshotFile::new(path)
}

fn settle_detector(cfg: &Config) -> SettleDetector {
    SettleDetector::new(SettleCfg::from(&cfg.settle))
}

fn estimator(cfg: &Config, file: &SnapshotFile) -> Result<Estimator> {
    let search = SearchKind::from(&cfg.estimator);
    let est = load_estimator(file, search)?;
    tracing::info!(samples = est.len(), ?search, "calibration map loaded");
    Ok(est)
}

fn report_json(report: &SweepReport, samples: usize) -> Value {
    let failed: Vec<Value> = report
        .failed
        .iter()
        .map(|f| {
            json!({
                "brightness": f.temperature.brightness,
                "kelvin": f.temperature.kelvin,
                "attempts": f.attempts,
                "error": f.error.to_string(),
            })
        })
        .collect();
    json!({
        "command": "calibrate",
        "samples": samples,
        "sampled": report.sampled,
        "skipped": report.skipped,
        "checkpoints": report.checkpoints,
        "interrupted": report.interrupted,
        "failed": failed,
    })
}

pub fn run_calibrate(
    cfg: &Config,
    snapshot: Option<&Path>,
    json_mode: bool,
    shutdown: Arc<AtomicBool>,
) -> Result<()> {
    let file = snapshot_file(cfg, snapshot);
    let seed = file
        .load_or_empty()
        .wrap_err("load snapshot to resume from")?;
    let lamp = open_device(cfg)?;
    let mut sweeper = SweepBuilder::new()
        .with_lamp(lamp)
        .with_settle(SettleCfg::from(&cfg.settle))
        .with_sweep(SweepCfg::from(&cfg.sweep))
        .with_shutdown(shutdown)
        .build()?;

    let mut sink = file.clone();
    let report = sweeper.run(seed, &mut sink)?;

    let compacted = report.map.compact();
    if compacted.len() != report.map.len() {
        file.save(&compacted)?;
        tracing::info!(
            before = report.map.len(),
            after = compacted.len(),
            "snapshot compacted"
        );
    }

    let mut text = format!(
        "calibration {}: {} samples ({} new, {} already present, {} failed)",
        if report.interrupted { "interrupted" } else { "complete" },
        compacted.len(),
        report.sampled,
        report.skipped,
        report.failed.len()
    );
    for f in report.failed.iter().take(10) {
        let _ = write!(
            text,
            "\n  failed {} after {} attempts: {}",
            f.temperature, f.attempts, f.error
        );
    }
    if report.interrupted || !report.failed.is_empty() {
        let _ = write!(
            text,
            "\nrerun `inio calibrate` to resume from {}",
            file.path().display()
        );
    }
    emit(json_mode, &report_json(&report, compacted.len()), &text);
    Ok(())
}

pub fn run_compact(cfg: &Config, snapshot: Option<&Path>, json_mode: bool) -> Result<()> {
    let file = snapshot_file(cfg, snapshot);
    let (before, after) = compact_file(&file)?;
    emit(
        json_mode,
        &json!({ "command": "compact", "before": before, "after": after }),
        &format!(
            "compacted {}: {before} -> {after} samples",
            file.path().display()
        ),
    );
    Ok(())
}

pub fn run_estimate(
    cfg: &Config,
    snapshot: Option<&Path>,
    observed: PowerReading,
    json_mode: bool,
) -> Result<()> {
    let file = snapshot_file(cfg, snapshot);
    let est = estimator(cfg, &file)?;
    let m = est.nearest(observed);
    let t = m.sample.temperature;
    emit(
        json_mode,
        &json!({
            "command": "estimate",
            "brightness": t.brightness,
            "kelvin": t.kelvin,
            "mireds": kelvin_to_mireds(t.kelvin),
            "distance": m.distance,
        }),
        &format!(
            "{observed} -> brightness {} kelvin {} (distance {:.5})",
            t.brightness, t.kelvin, m.distance
        ),
    );
    Ok(())
}

pub fn run_read(cfg: &Config, json_mode: bool) -> Result<()> {
    let est = estimator(cfg, &snapshot_file(cfg, None))?;
    let settle = settle_detector(cfg);
    let mut lamp = open_device(cfg)?;
    let reading = settle.read_stable(&mut lamp)?;
    let t = est.estimate(reading);
    emit(
        json_mode,
        &json!({
            "command": "read",
            "cold": reading.cold,
            "warm": reading.warm,
            "brightness": t.brightness,
            "kelvin": t.kelvin,
        }),
        &format!("{reading} -> brightness {} kelvin {}", t.brightness, t.kelvin),
    );
    Ok(())
}

pub fn run_verify(cfg: &Config, trials: usize, seed: Option<u64>, json_mode: bool) -> Result<()> {
    let est = estimator(cfg, &snapshot_file(cfg, None))?;
    let settle = settle_detector(cfg);
    let mut lamp = open_device(cfg)?;
    let mut rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    let report = run_trials(&mut lamp, &settle, &est, trials, &mut rng)?;
    emit(
        json_mode,
        &json!({
            "command": "verify",
            "trials": report.len(),
            "max_brightness_error": report.max_brightness_error(),
            "mean_brightness_error": report.mean_brightness_error(),
            "max_kelvin_error": report.max_kelvin_error(),
            "mean_kelvin_error": report.mean_kelvin_error(),
            "mean_distance": report.mean_distance(),
        }),
        &format!(
            "{} trials: brightness error max {} mean {:.2}, kelvin error max {} mean {:.1}",
            report.len(),
            report.max_brightness_error(),
            report.mean_brightness_error(),
            report.max_kelvin_error(),
            report.mean_kelvin_error()
        ),
    );
    Ok(())
}

fn accessory(cfg: &Config) -> Result<Accessory<Box<dyn LampDevice>>> {
    let est = estimator(cfg, &snapshot_file(cfg, None))?;
    Ok(Accessory::new(
        open_device(cfg)?,
        Arc::new(est),
        settle_detector(cfg),
    ))
}

fn characteristic_name(what: Characteristic) -> &'static str {
    match what {
        Characteristic::On => "on",
        Characteristic::Mode => "mode",
        Characteristic::Brightness => "brightness",
        Characteristic::ColorTemperature => "color-temperature",
    }
}

pub fn run_get(cfg: &Config, what: Characteristic, json_mode: bool) -> Result<()> {
    let mut acc = accessory(cfg)?;
    let value: Value = match what {
        Characteristic::On => json!(acc.on_get()?),
        Characteristic::Mode => json!(acc.mode_get()?),
        Characteristic::Brightness => json!(acc.brightness_get()?),
        Characteristic::ColorTemperature => json!(acc.color_temperature_get()?),
    };
    let name = characteristic_name(what);
    emit(
        json_mode,
        &json!({ "command": "get", "characteristic": name, "value": value }),
        &format!("{name} = {value}"),
    );
    Ok(())
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Ok(true),
        "false" | "off" | "0" | "no" => Ok(false),
        other => eyre::bail!("invalid value {other:?}: expected true or false"),
    }
}

pub fn run_set(cfg: &Config, what: Characteristic, raw: &str, json_mode: bool) -> Result<()> {
    // parse before touching the device
    enum Requested {
        Flag(bool),
        Level(u8),
        Mireds(u32),
    }
    let parsed = match what {
        Characteristic::On | Characteristic::Mode => Requested::Flag(parse_bool(raw)?),
        Characteristic::Brightness => {
            let v: u8 = raw
                .trim()
                .parse()
                .map_err(|_| eyre::eyre!("invalid value {raw:?}: brightness must be 0..=100"))?;
            if v > 100 {
                eyre::bail!("invalid value {raw:?}: brightness must be 0..=100");
            }
            Requested::Level(v)
        }
        Characteristic::ColorTemperature => Requested::Mireds(
            raw.trim()
                .parse()
                .map_err(|_| eyre::eyre!("invalid value {raw:?}: color temperature is in mireds"))?,
        ),
    };

    let mut acc = accessory(cfg)?;
    match (what, parsed) {
        (Characteristic::On, Requested::Flag(on)) => acc.try_on_set(on)?,
        (Characteristic::Mode, Requested::Flag(connected)) => acc.try_mode_set(connected)?,
        (Characteristic::Brightness, Requested::Level(v)) => acc.try_brightness_set(v)?,
        (Characteristic::ColorTemperature, Requested::Mireds(m)) => acc.try_color_temperature_set(m)?,
        _ => eyre::bail!("value does not match characteristic"),
    }
    let name = characteristic_name(what);
    emit(
        json_mode,
        &json!({ "command": "set", "characteristic": name, "value": raw.trim() }),
        &format!("{name} set to {}", raw.trim()),
    );
    Ok(())
}

pub fn self_check(cfg: &Config, json_mode: bool) -> Result<()> {
    let file = snapshot_file(cfg, None);
    let snapshot = match file.load() {
        Ok(map) => json!({ "ok": true, "samples": map.len(), "duplicates": map.has_duplicates() }),
        Err(e) => {
            tracing::warn!(error = %e, "snapshot not usable");
            json!({ "ok": false, "error": e.to_string() })
        }
    };
    let mut lamp = open_device(cfg)?;
    let mode = lamp
        .status()
        .map_err(|e| eyre::Report::new(inio_core::hw_error::map_device_error(&*e)))
        .wrap_err("query lamp status")?;

    let text = format!(
        "config ok\nsnapshot {}: {}\nlamp mode: {mode}\nOK",
        file.path().display(),
        if snapshot["ok"] == json!(true) {
            format!("{} samples", snapshot["samples"])
        } else {
            format!("unusable ({})", snapshot["error"].as_str().unwrap_or("unknown error"))
        }
    );
    emit(
        json_mode,
        &json!({
            "command": "self-check",
            "snapshot": snapshot,
            "mode": mode.as_wire(),
        }),
        &text,
    );
    Ok(())
}
