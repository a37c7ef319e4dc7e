//! Integration tests for the complete sensing session.
//! Tests realistic swing scenarios end to end: raw three-axis samples in,
//! scheduled pulses out, and the timing guarantees in between.

use std::cell::RefCell;
use std::time::Duration;

use crate::config::{EstimatorConfig, SessionConfig, STANDARD_GRAVITY};
use crate::estimator::PhaseEstimator;
use crate::pulse::{PulseScheduler, RecordingActuator};
use crate::session::SwingSession;
use crate::source::{ChannelSource, ReplaySource, SyntheticPendulum};
use crate::types::{AccelSample, Axis, PhaseResult};

const MS: i64 = 1_000_000;

/// Scheduler that records every requested lead.
#[derive(Default)]
struct LeadLog {
    leads: RefCell<Vec<u64>>,
}

impl PulseScheduler for LeadLog {
    fn fire_now(&self) {
        self.leads.borrow_mut().push(0);
    }

    fn fire_after(&self, lead_ms: u64) {
        self.leads.borrow_mut().push(lead_ms);
    }
}

/// Helper: the two-swing reference capture on one axis, with an offset.
fn reference_capture(axis: Axis, offset: f64) -> Vec<AccelSample> {
    [
        (0, -1.0),
        (10 * MS, -1.0),
        (20 * MS, 0.3),
        (1000 * MS, -1.0),
        (1010 * MS, -1.0),
        (1020 * MS, 0.3),
    ]
    .into_iter()
    .map(|(t, v)| AccelSample::on_axis(t, axis, v + offset))
    .collect()
}

/// Helper: run an estimator over a capture, collecting results.
fn run_estimator(config: EstimatorConfig, axis: Axis, samples: &[AccelSample]) -> Vec<PhaseResult> {
    let mut estimator = PhaseEstimator::new(config);
    samples.iter().map(|s| estimator.ingest_sample(s, axis)).collect()
}

#[test]
fn reference_scenario_horizontal_axis() {
    let results = run_estimator(
        EstimatorConfig::horizontal(),
        Axis::X,
        &reference_capture(Axis::X, 0.0),
    );

    let expected = vec![
        PhaseResult::idle(),
        PhaseResult::idle(),
        PhaseResult::idle(), // first crossing, no period yet
        PhaseResult::idle(),
        PhaseResult::idle(),
        PhaseResult::pulse_after(250),
    ];
    assert_eq!(results, expected);
}

#[test]
fn reference_scenario_gravity_axis_matches_horizontal() {
    let flat = run_estimator(
        EstimatorConfig::horizontal(),
        Axis::X,
        &reference_capture(Axis::X, 0.0),
    );
    let vertical = run_estimator(
        EstimatorConfig::gravity_compensated(),
        Axis::Z,
        &reference_capture(Axis::Z, STANDARD_GRAVITY),
    );
    assert_eq!(flat, vertical);
}

#[test]
fn deterministic_across_fresh_estimators() {
    let samples: Vec<AccelSample> = SyntheticPendulum::new(Axis::X, 900, 20_000, 10_000).collect();
    let first = run_estimator(EstimatorConfig::horizontal(), Axis::X, &samples);
    let second = run_estimator(EstimatorConfig::horizontal(), Axis::X, &samples);
    assert_eq!(first, second);
}

#[test]
fn steady_swing_leads_by_quarter_period() {
    // 1.2s swing sampled at 50Hz: 60 samples per swing, so every crossing
    // lands on the same sample offset and the measured period is exact.
    let samples: Vec<AccelSample> = SyntheticPendulum::new(Axis::X, 1200, 20_000, 12_000).collect();
    let results = run_estimator(EstimatorConfig::horizontal(), Axis::X, &samples);

    let leads: Vec<u64> = results
        .iter()
        .filter(|r| r.should_pulse)
        .map(|r| r.lead_ms)
        .collect();

    assert!(leads.len() >= 8, "expected roughly one pulse per swing, got {}", leads.len());
    assert!(leads.iter().all(|&lead| lead == 300), "leads {leads:?}");
}

#[test]
fn gravity_swing_on_z_axis() {
    let samples: Vec<AccelSample> = SyntheticPendulum::new(Axis::Z, 800, 20_000, 8_000).collect();
    let mut session = SwingSession::new(SessionConfig::z_axis(), LeadLog::default()).unwrap();
    for sample in &samples {
        session.process_sample(sample);
    }

    let leads = session.scheduler().leads.borrow().clone();
    assert!(leads.len() >= 8);
    assert!(leads.iter().all(|&l| l == 200), "leads {leads:?}");
}

#[test]
fn uncompensated_gravity_axis_never_pulses() {
    // Tracking Z without the offset: the signal sits far above the dead zone.
    let samples: Vec<AccelSample> = SyntheticPendulum::new(Axis::Z, 800, 20_000, 8_000).collect();
    let results = run_estimator(EstimatorConfig::horizontal(), Axis::Z, &samples);
    assert!(results.iter().all(|r| !r.should_pulse));
}

#[test]
fn small_swing_inside_dead_zone_is_ignored() {
    let samples: Vec<AccelSample> = SyntheticPendulum::new(Axis::X, 1000, 20_000, 10_000)
        .with_amplitude(0.09)
        .collect();
    let mut estimator = PhaseEstimator::new(EstimatorConfig::horizontal());
    for s in &samples {
        assert!(!estimator.ingest_sample(s, Axis::X).should_pulse);
    }
    assert_eq!(estimator.total_crossings(), 0);
}

#[test]
fn period_change_is_tracked_after_one_swing() {
    let mut samples: Vec<AccelSample> = SyntheticPendulum::new(Axis::X, 1000, 20_000, 5_000).collect();
    let offset = samples.last().map(|s| s.timestamp_ns).unwrap_or(0) + 20 * MS;
    samples.extend(
        SyntheticPendulum::new(Axis::X, 500, 20_000, 5_000)
            .map(|s| AccelSample::new(s.timestamp_ns + offset, s.accel)),
    );

    let results = run_estimator(EstimatorConfig::horizontal(), Axis::X, &samples);
    let leads: Vec<u64> = results.iter().filter(|r| r.should_pulse).map(|r| r.lead_ms).collect();

    // 250ms before the change; the swing straddling it measures 1020ms;
    // after one full short swing the lead follows the new period.
    assert_eq!(leads[0], 250);
    assert!(leads.contains(&255));
    assert_eq!(*leads.last().unwrap(), 125);
}

#[test]
fn history_window_stays_bounded_over_session() {
    let samples: Vec<AccelSample> = SyntheticPendulum::new(Axis::X, 1000, 20_000, 30_000).collect();
    let mut estimator = PhaseEstimator::new(EstimatorConfig::horizontal().with_window_size(30));
    for s in &samples {
        estimator.ingest_sample(s, Axis::X);
        assert!(estimator.history().len() <= 30);
        assert!(estimator.crossings() <= 3);
    }
    assert!(estimator.history().is_full());
    let newest = estimator.history().latest().unwrap();
    assert_eq!(newest.0, samples.last().unwrap().timestamp_ns);
}

#[tokio::test]
async fn replayed_capture_through_session() {
    let capture = reference_capture(Axis::X, 0.0)
        .into_iter()
        .map(|s| serde_json::to_string(&s).unwrap())
        .collect::<Vec<_>>()
        .join("\n");
    let mut source = ReplaySource::from_json_lines(capture.as_bytes()).unwrap();

    let mut session = SwingSession::new(SessionConfig::x_axis(), LeadLog::default()).unwrap();
    let stats = session.run(&mut source).await.unwrap();

    assert_eq!(stats.samples, 6);
    assert_eq!(stats.crossings, 2);
    assert_eq!(stats.pulses_scheduled, 1);
    assert_eq!(*session.scheduler().leads.borrow(), vec![250]);
}

#[tokio::test(start_paused = true)]
async fn pulses_land_a_quarter_period_after_crossing() {
    let mut session =
        SwingSession::with_actuator(SessionConfig::x_axis(), RecordingActuator::new()).unwrap();

    let start = tokio::time::Instant::now();
    for sample in reference_capture(Axis::X, 0.0) {
        session.process_sample(&sample);
    }

    tokio::time::sleep(Duration::from_millis(300)).await;
    let pulses = session.scheduler().actuator().pulses();
    assert_eq!(pulses.len(), 1);
    let fired_after = pulses[0].0.duration_since(start);
    assert!(fired_after >= Duration::from_millis(250));
    assert!(fired_after < Duration::from_millis(251));

    session.close();
}

#[tokio::test(start_paused = true)]
async fn fast_swing_pulses_overlap_without_cancellation() {
    // Lead 0.9 of a 100ms swing: each pulse is still pending when the next
    // crossing schedules another.
    let mut config = SessionConfig::x_axis();
    config.estimator.lead_fraction = 0.9;
    let mut session = SwingSession::with_actuator(config, RecordingActuator::new()).unwrap();

    let mut t = 0;
    for _ in 0..4 {
        session.process_sample(&AccelSample::on_axis(t, Axis::X, -1.0));
        session.process_sample(&AccelSample::on_axis(t + 10 * MS, Axis::X, 1.0));
        t += 100 * MS;
    }
    assert_eq!(session.stats().pulses_scheduled, 3);
    assert_eq!(session.scheduler().pending(), 3);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(session.scheduler().fired(), 3);
    session.close();
}

#[tokio::test]
async fn channel_fed_session() {
    let (tx, mut source) = ChannelSource::new(64);
    let producer = tokio::spawn(async move {
        for s in reference_capture(Axis::X, 0.0) {
            tx.send(s).await.unwrap();
        }
    });

    let mut session = SwingSession::new(SessionConfig::x_axis(), LeadLog::default()).unwrap();
    let stats = session.run(&mut source).await.unwrap();
    producer.await.unwrap();

    assert_eq!(stats.samples, 6);
    assert_eq!(stats.pulses_scheduled, 1);
}
