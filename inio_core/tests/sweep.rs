use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use inio_core::mocks::MemorySink;
use inio_core::{
    CalibrationMap, CheckpointSink, InioError, RetryCfg, Sample, SettleCfg, SweepBuilder,
    SweepCfg, Sweeper, grid,
};
use inio_hardware::{SimulatedLamp, simulated_duty};
use inio_traits::clock::ManualClock;
use inio_traits::{DeviceError, Lamp, PowerReading, Temperature};

fn sweeper<L: Lamp>(lamp: L, clock: &ManualClock) -> Sweeper<L> {
    SweepBuilder::new()
        .with_lamp(lamp)
        .with_clock(clock.clone())
        .build()
        .unwrap()
}

/// Everything below `rows_done` already sampled.
fn seed_rows(rows_done: u8) -> CalibrationMap {
    grid::points()
        .take_while(|t| t.brightness < rows_done)
        .map(|t| Sample::new(t, simulated_duty(t)))
        .collect()
}

#[test]
fn empty_seed_covers_the_whole_grid() {
    let clock = ManualClock::new();
    let mut sw = sweeper(SimulatedLamp::new(), &clock);
    let mut sink = MemorySink::default();

    let report = sw.run(CalibrationMap::new(), &mut sink).unwrap();

    assert_eq!(report.sampled, grid::GRID_POINTS);
    assert_eq!(report.skipped, 0);
    assert!(report.failed.is_empty());
    assert!(!report.interrupted);
    assert_eq!(report.map.len(), grid::GRID_POINTS);
    assert!(!report.map.has_duplicates());
    assert_eq!(report.map.keys(), grid::points().collect());
    // one checkpoint per brightness row plus the final write
    assert_eq!(report.checkpoints, grid::BRIGHTNESS_LEVELS + 1);
    assert_eq!(sink.lengths.len(), grid::BRIGHTNESS_LEVELS + 1);
    assert_eq!(sink.lengths[0], grid::KELVIN_LEVELS);
    assert!(sink.lengths.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(sink.last.as_ref(), Some(&report.map));
    // recorded duty is the settled value
    let t = Temperature::new(37, 4410);
    assert_eq!(report.map.get(t).unwrap().power, simulated_duty(t));
}

#[test]
fn resume_only_samples_missing_rows() {
    let clock = ManualClock::new();
    let mut sw = sweeper(SimulatedLamp::new().with_lag(3), &clock);
    let mut sink = MemorySink::default();
    let seed = seed_rows(100);
    let seeded = seed.len();

    let report = sw.run(seed, &mut sink).unwrap();

    assert_eq!(report.skipped, seeded);
    assert_eq!(report.sampled, grid::KELVIN_LEVELS);
    assert_eq!(sw.lamp().set_calls(), grid::KELVIN_LEVELS);
    assert_eq!(report.map.len(), grid::GRID_POINTS);
    assert_eq!(
        report.map.samples()[seeded].temperature,
        Temperature::new(100, 2700)
    );
}

#[test]
fn two_runs_from_the_same_seed_agree() {
    let run = || {
        let clock = ManualClock::new();
        let mut sw = sweeper(SimulatedLamp::new().with_lag(2), &clock);
        let mut sink = MemorySink::default();
        sw.run(seed_rows(97), &mut sink).unwrap().map.compact()
    };
    let first = run();
    assert_eq!(first, run());
    assert_eq!(first.len(), grid::GRID_POINTS);
}

#[test]
fn complete_seed_is_left_untouched() {
    let clock = ManualClock::new();
    let mut sw = sweeper(SimulatedLamp::new(), &clock);
    let mut sink = MemorySink::default();
    let seed = seed_rows(101);

    let report = sw.run(seed.clone(), &mut sink).unwrap();

    assert_eq!(report.sampled, 0);
    assert_eq!(sw.lamp().set_calls(), 0);
    assert_eq!(report.map, seed);
    // the final write still happens after the configured delay
    assert_eq!(clock.elapsed(), SweepCfg::default().final_delay);
}

#[test]
fn transient_failure_is_retried_with_backoff() {
    let clock = ManualClock::new();
    let t = Temperature::new(100, 5000);
    let mut sw = sweeper(SimulatedLamp::new().fail_times(t, 2), &clock);
    let mut sink = MemorySink::default();

    let report = sw.run(seed_rows(100), &mut sink).unwrap();

    assert!(report.failed.is_empty());
    assert_eq!(report.sampled, grid::KELVIN_LEVELS);
    assert_eq!(sw.lamp().set_calls(), grid::KELVIN_LEVELS + 2);
    assert_eq!(report.map.get(t).unwrap().power, simulated_duty(t));
    // 250 ms then 500 ms of backoff, on top of settle polls and the final delay
    assert!(clock.elapsed() >= Duration::from_millis(750) + SweepCfg::default().final_delay);
}

#[test]
fn exhausted_point_is_reported_and_retried_next_run() {
    let clock = ManualClock::new();
    let t = Temperature::new(100, 2750);
    let lamp = SimulatedLamp::new().fail_times(t, 4);
    let mut sw = sweeper(lamp, &clock);
    let mut sink = MemorySink::default();

    let first = sw.run(seed_rows(100), &mut sink).unwrap();
    assert_eq!(first.failed.len(), 1);
    assert_eq!(first.failed[0].temperature, t);
    assert_eq!(first.failed[0].attempts, 3);
    assert!(matches!(first.failed[0].error, InioError::Device(_)));
    assert!(first.map.get(t).is_none());
    assert_eq!(first.map.len(), grid::GRID_POINTS - 1);

    // one injected fault left; the next run retries through it
    let mut sw = sweeper(sw.into_lamp(), &clock);
    let second = sw.run(first.map, &mut sink).unwrap();
    assert!(second.failed.is_empty());
    assert_eq!(second.sampled, 1);
    assert_eq!(second.map.len(), grid::GRID_POINTS);
}

#[test]
fn unsettled_points_fail_without_aborting_the_sweep() {
    let clock = ManualClock::new();
    let mut sw = SweepBuilder::new()
        .with_lamp(SimulatedLamp::new().never_settle())
        .with_clock(clock.clone())
        .with_settle(SettleCfg {
            max_polls: 4,
            ..SettleCfg::default()
        })
        .with_sweep(SweepCfg {
            retry: RetryCfg {
                max_attempts: 1,
                ..RetryCfg::default()
            },
            ..SweepCfg::default()
        })
        .build()
        .unwrap();
    let mut sink = MemorySink::default();

    let report = sw.run(seed_rows(100), &mut sink).unwrap();

    assert_eq!(report.failed.len(), grid::KELVIN_LEVELS);
    assert!(
        report
            .failed
            .iter()
            .all(|f| matches!(f.error, InioError::DidNotSettle { polls: 4, .. }))
    );
    assert_eq!(report.sampled, 0);
}

/// Sets the shutdown flag once `after` colors have been commanded.
struct Tripwire {
    inner: SimulatedLamp,
    flag: Arc<AtomicBool>,
    after: usize,
}

impl Lamp for Tripwire {
    fn power(&mut self) -> Result<PowerReading, DeviceError> {
        self.inner.power()
    }

    fn set_color(&mut self, to: Temperature) -> Result<(), DeviceError> {
        self.inner.set_color(to)?;
        if self.inner.set_calls() >= self.after {
            self.flag.store(true, Ordering::Relaxed);
        }
        Ok(())
    }
}

#[test]
fn interrupt_checkpoints_and_resumes() {
    let clock = ManualClock::new();
    let flag = Arc::new(AtomicBool::new(false));
    let lamp = Tripwire {
        inner: SimulatedLamp::new(),
        flag: Arc::clone(&flag),
        after: 500,
    };
    let mut sw = SweepBuilder::new()
        .with_lamp(lamp)
        .with_clock(clock.clone())
        .with_shutdown(Arc::clone(&flag))
        .build()
        .unwrap();
    let mut sink = MemorySink::default();

    let first = sw.run(CalibrationMap::new(), &mut sink).unwrap();
    assert!(first.interrupted);
    assert_eq!(first.sampled, 500);
    // row 0 checkpoint plus the interrupt checkpoint
    assert_eq!(first.checkpoints, 2);
    assert_eq!(sink.lengths, vec![grid::KELVIN_LEVELS, 500]);

    let resumed_from = sink.last.clone().unwrap();
    let mut sw = sweeper(SimulatedLamp::new(), &clock);
    let second = sw.run(resumed_from, &mut sink).unwrap();
    assert!(!second.interrupted);
    assert_eq!(second.skipped, 500);
    assert_eq!(second.sampled, grid::GRID_POINTS - 500);
    assert!(!second.map.has_duplicates());
}

#[test]
fn row_checkpoint_failures_are_not_fatal() {
    let clock = ManualClock::new();
    let mut sw = sweeper(SimulatedLamp::new(), &clock);
    let mut sink = MemorySink {
        fail_next: 3,
        ..MemorySink::default()
    };
    let report = sw.run(seed_rows(101), &mut sink).unwrap();
    assert_eq!(report.checkpoints, grid::BRIGHTNESS_LEVELS + 1 - 3);
}

/// Accepts every write except the `fail_at`-th.
struct FailAt {
    writes: usize,
    fail_at: usize,
}

impl CheckpointSink for FailAt {
    fn persist(&mut self, _map: &CalibrationMap) -> Result<(), InioError> {
        self.writes += 1;
        if self.writes == self.fail_at {
            return Err(InioError::Snapshot("disk full".into()));
        }
        Ok(())
    }
}

#[test]
fn failed_final_write_is_an_error() {
    let clock = ManualClock::new();
    let mut sw = sweeper(SimulatedLamp::new(), &clock);
    let mut sink = FailAt {
        writes: 0,
        fail_at: grid::BRIGHTNESS_LEVELS + 1,
    };
    let err = sw.run(seed_rows(101), &mut sink).unwrap_err();
    assert!(format!("{err:#}").contains("final snapshot write failed"), "{err:#}");
}
