use std::sync::Arc;

use inio_core::verify::{run_trial, run_trials};
use inio_core::{Estimator, Sample, SearchKind, SettleCfg, SettleDetector, Temperature, grid};
use inio_hardware::{SimulatedLamp, simulated_duty};
use inio_traits::clock::ManualClock;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn setup() -> (Estimator, SettleDetector) {
    let map = grid::points()
        .map(|t| Sample::new(t, simulated_duty(t)))
        .collect();
    let est = Estimator::with_search(map, SearchKind::default()).unwrap();
    let settle = SettleDetector::with_clock(SettleCfg::default(), Arc::new(ManualClock::new()));
    (est, settle)
}

#[test]
fn grid_target_is_recovered_exactly() {
    let (est, settle) = setup();
    let mut lamp = SimulatedLamp::new().with_lag(4);
    let trial = run_trial(&mut lamp, &settle, &est, Temperature::new(63, 5120)).unwrap();
    assert_eq!(trial.estimate, trial.target);
    assert_eq!(trial.distance, 0.0);
}

#[test]
fn random_trials_stay_within_half_a_kelvin_step() {
    let (est, settle) = setup();
    let mut lamp = SimulatedLamp::new().with_lag(2);
    let mut rng = StdRng::seed_from_u64(7);

    let report = run_trials(&mut lamp, &settle, &est, 100, &mut rng).unwrap();

    assert_eq!(report.len(), 100);
    for t in report.trials.iter().filter(|t| t.target.brightness > 0) {
        assert_eq!(t.brightness_error(), 0, "{t:?}");
        assert!(t.kelvin_error() <= 5, "{t:?}");
    }
    assert!(report.mean_distance() < 1.0);
}

#[test]
fn zero_trials_is_an_empty_report() {
    let (est, settle) = setup();
    let mut lamp = SimulatedLamp::new();
    let mut rng = StdRng::seed_from_u64(1);
    let report = run_trials(&mut lamp, &settle, &est, 0, &mut rng).unwrap();
    assert!(report.is_empty());
    assert_eq!(lamp.set_calls(), 0);
}
