use inio_core::snapshot::{from_json, to_json};
use inio_core::{
    CalibrationMap, InioError, PowerReading, Sample, SearchKind, SnapshotFile, Temperature,
    load_estimator,
};
use rstest::rstest;

fn sample_map() -> CalibrationMap {
    CalibrationMap::from_samples(vec![
        Sample::new(Temperature::new(0, 2700), PowerReading::new(0.0, 0.0)),
        Sample::new(Temperature::new(42, 3100), PowerReading::new(12.5, 96.25)),
        Sample::new(Temperature::new(100, 6500), PowerReading::new(255.0, 0.0)),
    ])
}

#[test]
fn save_then_load_preserves_order_and_values() {
    let dir = tempfile::tempdir().unwrap();
    let file = SnapshotFile::new(dir.path().join("data-packed.json"));
    file.save(&sample_map()).unwrap();

    assert_eq!(file.load().unwrap(), sample_map());
    // no temp file left behind
    assert!(!dir.path().join("data-packed.json.tmp").exists());
}

#[test]
fn save_replaces_previous_contents() {
    let dir = tempfile::tempdir().unwrap();
    let file = SnapshotFile::new(dir.path().join("data.json"));
    file.save(&sample_map()).unwrap();
    file.save(&CalibrationMap::new()).unwrap();
    assert!(file.load().unwrap().is_empty());
}

#[test]
fn missing_file_is_empty_for_resume_but_fatal_for_load() {
    let dir = tempfile::tempdir().unwrap();
    let file = SnapshotFile::new(dir.path().join("nope.json"));
    assert!(file.load_or_empty().unwrap().is_empty());
    assert!(matches!(file.load(), Err(InioError::Snapshot(_))));
    assert!(matches!(
        load_estimator(&file, SearchKind::default()),
        Err(InioError::Snapshot(_))
    ));
}

#[rstest]
#[case::not_json("hello", "not a list")]
#[case::object("{\"a\": 1}", "not a list")]
#[case::short_row("[[1, 2700, 0.5]]", "expected 4 fields")]
#[case::brightness("[[101, 2700, 0, 0]]", "brightness")]
#[case::fractional_brightness("[[1.5, 2700, 0, 0]]", "brightness")]
#[case::kelvin_low("[[1, 2000, 0, 0]]", "kelvin")]
#[case::off_grid("[[1, 2705, 0, 0]]", "10 K grid")]
#[case::negative("[[1, 2700, -1, 0]]", "warm power")]
fn malformed_snapshot_is_rejected(#[case] text: &str, #[case] needle: &str) {
    let err = from_json(text).unwrap_err();
    assert!(err.to_string().contains(needle), "{err}");
}

#[test]
fn malformed_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "[[1, 2700, 0]]").unwrap();
    let err = SnapshotFile::new(&path).load_or_empty().unwrap_err();
    assert!(err.to_string().contains("bad.json"), "{err}");
}

#[test]
fn empty_snapshot_cannot_back_an_estimator() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.json");
    std::fs::write(&path, "[]").unwrap();
    let file = SnapshotFile::new(&path);
    assert_eq!(
        load_estimator(&file, SearchKind::Linear).unwrap_err(),
        InioError::EmptyMap
    );
}

#[test]
fn json_text_round_trips() {
    let text = to_json(&sample_map()).unwrap();
    assert_eq!(from_json(&text).unwrap(), sample_map());
}
