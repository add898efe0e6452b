use inio_core::{
    CalibrationMap, InioError, PowerReading, Sample, SearchKind, SnapshotFile, Temperature,
    compact_file, load_estimator,
};
use rstest::rstest;

fn s(b: u8, k: u16, cold: f64, warm: f64) -> Sample {
    Sample::new(Temperature::new(b, k), PowerReading::new(cold, warm))
}

#[test]
fn later_sample_wins_and_keeps_first_slot() {
    let map = CalibrationMap::from_samples(vec![
        s(1, 2700, 1.0, 1.0),
        s(1, 2710, 2.0, 2.0),
        s(1, 2700, 9.0, 9.0),
        s(1, 2720, 3.0, 3.0),
    ]);
    assert!(map.has_duplicates());
    let out = map.compact();
    assert!(!out.has_duplicates());
    assert_eq!(
        out.samples(),
        &[
            s(1, 2700, 9.0, 9.0),
            s(1, 2710, 2.0, 2.0),
            s(1, 2720, 3.0, 3.0),
        ]
    );
}

#[rstest]
#[case(vec![])]
#[case(vec![s(0, 2700, 0.0, 0.0)])]
#[case(vec![s(3, 3000, 1.0, 2.0), s(3, 3000, 1.5, 2.5), s(3, 3000, 4.0, 4.0)])]
fn compaction_is_idempotent(#[case] samples: Vec<Sample>) {
    let once = CalibrationMap::from_samples(samples).compact();
    assert_eq!(once.compact(), once);
}

#[test]
fn resumed_sweep_duplicates_collapse_in_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let file = SnapshotFile::new(dir.path().join("data.json"));
    file.save(&CalibrationMap::from_samples(vec![
        s(5, 3000, 1.0, 2.0),
        s(5, 3010, 1.1, 2.1),
        s(5, 3000, 1.2, 2.2),
    ]))
    .unwrap();

    let (before, after) = compact_file(&file).unwrap();
    assert_eq!((before, after), (3, 2));

    let reloaded = file.load().unwrap();
    assert_eq!(reloaded.len(), 2);
    assert_eq!(
        reloaded.get(Temperature::new(5, 3000)).unwrap().power,
        PowerReading::new(1.2, 2.2)
    );
}

#[test]
fn compacting_a_missing_snapshot_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let file = SnapshotFile::new(dir.path().join("absent.json"));
    assert!(matches!(compact_file(&file), Err(InioError::Snapshot(_))));
}

#[test]
fn estimator_loader_compacts_before_indexing() {
    let dir = tempfile::tempdir().unwrap();
    let file = SnapshotFile::new(dir.path().join("data.json"));
    file.save(&CalibrationMap::from_samples(vec![
        s(5, 3000, 1.0, 2.0),
        s(5, 3000, 7.0, 7.0),
    ]))
    .unwrap();
    let est = load_estimator(&file, SearchKind::Linear).unwrap();
    assert_eq!(est.len(), 1);
    assert_eq!(est.nearest(PowerReading::new(7.0, 7.0)).distance, 0.0);
}
