#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use inio_core::{CalibrationMap, Sample, SnapshotFile, grid};
use inio_hardware::simulated_duty;

/// Config for the simulated backend with every delay zeroed.
pub fn write_sim_config(dir: &Path, snapshot: &Path) -> PathBuf {
    let toml = format!(
        r#"
[device]
backend = "simulated"

[settle]
poll_interval_ms = 0
max_polls = 50

[sweep]
snapshot = '{}'
retry_attempts = 2
retry_backoff_ms = 0
retry_backoff_max_ms = 0
final_delay_ms = 0

[estimator]
index = "grid"
cell_size = 8.0
"#,
        snapshot.display()
    );
    let path = dir.join("inio.toml");
    fs::write(&path, toml).unwrap();
    path
}

/// Snapshot holding every brightness row below `rows_done`, as the simulator reports them.
pub fn write_seed(path: &Path, rows_done: u8) -> usize {
    let map: CalibrationMap = grid::points()
        .take_while(|t| t.brightness < rows_done)
        .map(|t| Sample::new(t, simulated_duty(t)))
        .collect();
    SnapshotFile::new(path).save(&map).unwrap();
    map.len()
}

/// Last stdout line parsed as JSON.
pub fn last_json_line(stdout: &[u8]) -> serde_json::Value {
    let text = String::from_utf8_lossy(stdout);
    let line = text.lines().last().unwrap_or_default();
    serde_json::from_str(line).unwrap_or_else(|e| panic!("not JSON ({e}): {line}"))
}
