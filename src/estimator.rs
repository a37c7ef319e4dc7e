//! Swing phase estimation from a single accelerometer axis.
//!
//! Implements the zero-crossing period tracker that drives the haptic pulse:
//! - Dead-zone classification of the gravity-compensated signal
//! - Edge-triggered Negative -> Positive crossing detection
//! - Period measurement between the two most recent crossings
//! - Quarter-period lead prediction for the next extremum
//!
//! Under a simple-harmonic model the center crossing precedes the next peak
//! by a quarter period. The previous full period stands in for the current
//! one, so a pulse can be scheduled immediately at the crossing instead of
//! waiting for the current half-period to be measured.
//!
//! The estimator is a plain state machine: `&mut self` on every ingestion,
//! no interior locking. Exactly one writer at a time is a precondition; the
//! sensor callback model delivers samples strictly in order.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::config::EstimatorConfig;
use crate::signal::{HistoryBuffer, SignalConditioner};
use crate::types::{AccelSample, Axis, PhaseResult, SignState};

/// Number of crossing timestamps retained.
pub const PERIOD_RING_CAPACITY: usize = 3;

const NANOS_PER_MILLI: i64 = 1_000_000;

/// FIFO of the most recent rising-crossing timestamps.
#[derive(Debug, Clone, Default)]
pub struct PeriodRing {
    crossings: VecDeque<i64>,
}

impl PeriodRing {
    pub fn new() -> Self {
        Self {
            crossings: VecDeque::with_capacity(PERIOD_RING_CAPACITY),
        }
    }

    /// Record a crossing, dropping the oldest when the ring is full.
    pub fn record(&mut self, timestamp_ns: i64) {
        if self.crossings.len() >= PERIOD_RING_CAPACITY {
            self.crossings.pop_front();
        }
        self.crossings.push_back(timestamp_ns);
    }

    pub fn len(&self) -> usize {
        self.crossings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crossings.is_empty()
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &i64> {
        self.crossings.iter()
    }

    /// Difference between the two most recent crossings, in nanoseconds.
    ///
    /// `None` with fewer than two crossings or when the subtraction overflows.
    pub fn latest_period_ns(&self) -> Option<i64> {
        let n = self.crossings.len();
        if n < 2 {
            return None;
        }
        self.crossings[n - 1].checked_sub(self.crossings[n - 2])
    }

    pub fn clear(&mut self) {
        self.crossings.clear();
    }
}

/// Zero-crossing phase estimator.
///
/// Feed it one sample per sensor callback; it answers whether a pulse should
/// be scheduled and after how many milliseconds.
#[derive(Debug, Clone)]
pub struct PhaseEstimator {
    config: EstimatorConfig,
    conditioner: SignalConditioner,
    sign: SignState,
    periods: PeriodRing,
    last_period_ms: Option<u64>,
    samples_seen: u64,
    total_crossings: u64,
}

impl PhaseEstimator {
    /// Create an estimator for one sensing session.
    pub fn new(config: EstimatorConfig) -> Self {
        Self {
            conditioner: SignalConditioner::new(&config),
            config,
            sign: SignState::Neutral,
            periods: PeriodRing::new(),
            last_period_ms: None,
            samples_seen: 0,
            total_crossings: 0,
        }
    }

    /// Horizontal-axis estimator with a custom history window.
    pub fn with_window_size(window_size: usize) -> Self {
        Self::new(EstimatorConfig::horizontal().with_window_size(window_size))
    }

    /// Ingest one sample and decide whether to schedule a pulse.
    ///
    /// A crossing is recorded only when the previous call classified
    /// Negative and this one classifies Positive. A Neutral reading in
    /// between overwrites the sign state and breaks the crossing.
    pub fn ingest(&mut self, timestamp_ns: i64, raw_value: f64) -> PhaseResult {
        self.samples_seen += 1;

        let conditioned = self.conditioner.process(timestamp_ns, raw_value);
        let sign = conditioned.sign;

        let result = if SignState::is_rising_crossing(self.sign, sign) {
            self.on_crossing(timestamp_ns)
        } else {
            PhaseResult::idle()
        };

        self.sign = sign;
        result
    }

    /// Ingest the `axis` component of a raw three-axis sample.
    pub fn ingest_sample(&mut self, sample: &AccelSample, axis: Axis) -> PhaseResult {
        self.ingest(sample.timestamp_ns, sample.axis(axis))
    }

    fn on_crossing(&mut self, timestamp_ns: i64) -> PhaseResult {
        self.periods.record(timestamp_ns);
        self.total_crossings += 1;

        if self.periods.len() < 2 {
            debug!(timestamp_ns, "first crossing recorded, period not yet measurable");
            return PhaseResult::idle();
        }

        let period_ns = match self.periods.latest_period_ns() {
            Some(period_ns) if period_ns > 0 => period_ns,
            other => {
                warn!(
                    timestamp_ns,
                    period_ns = ?other,
                    "non-positive period between crossings, suppressing pulse"
                );
                return PhaseResult::idle();
            }
        };

        let period_ms = (period_ns / NANOS_PER_MILLI) as u64;
        let lead_ms = (period_ms as f64 * self.config.lead_fraction).floor() as u64;
        self.last_period_ms = Some(period_ms);

        debug!(
            timestamp_ns,
            crossings = self.periods.len(),
            period_ms,
            lead_ms,
            "crossing recorded"
        );

        PhaseResult::pulse_after(lead_ms)
    }

    /// Sign classification of the most recent sample.
    pub fn sign_state(&self) -> SignState {
        self.sign
    }

    /// History of filtered samples.
    pub fn history(&self) -> &HistoryBuffer {
        self.conditioner.history()
    }

    /// Recorded crossing timestamps.
    pub fn period_ring(&self) -> &PeriodRing {
        &self.periods
    }

    /// Number of crossings currently held (at most 3).
    pub fn crossings(&self) -> usize {
        self.periods.len()
    }

    /// Crossings detected since creation or the last reset, including
    /// those already evicted from the ring.
    pub fn total_crossings(&self) -> u64 {
        self.total_crossings
    }

    /// Most recent valid period measurement in milliseconds.
    pub fn last_period_ms(&self) -> Option<u64> {
        self.last_period_ms
    }

    /// Total samples ingested since creation or the last reset.
    pub fn samples_seen(&self) -> u64 {
        self.samples_seen
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Discard all session state, as if freshly constructed.
    pub fn reset(&mut self) {
        self.conditioner.reset();
        self.sign = SignState::Neutral;
        self.periods.clear();
        self.last_period_ms = None;
        self.samples_seen = 0;
        self.total_crossings = 0;
    }
}

impl Default for PhaseEstimator {
    fn default() -> Self {
        Self::new(EstimatorConfig::default())
    }
}
