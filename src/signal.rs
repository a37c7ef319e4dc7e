//! Signal conditioning ahead of the crossing detector.
//!
//! This module provides the three per-sample stages that run before the
//! phase logic:
//! - Static gravity offset removal (constant DC subtraction)
//! - Bounded history of filtered samples
//! - Dead-zone sign classification
//!
//! Design note: every stage is O(1) per sample. The history buffer is
//! allocated once at its full capacity and never grows.
//!
//! Known limitation: [`OffsetFilter`] is NOT a low-pass filter. It removes a
//! fixed constant, so a tilted phone (gravity leaking onto the tracked axis
//! by a different amount) shifts the whole signal and the dead zone with it.
//! The history buffer is where a real smoothing stage would read from; the
//! crossing detector does not consult it today.

use std::collections::VecDeque;

use crate::config::EstimatorConfig;
use crate::types::SignState;

/// Removes a constant offset (typically standard gravity) from raw readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetFilter {
    offset: f64,
}

impl OffsetFilter {
    /// Create a filter subtracting `offset` from every reading.
    pub fn new(offset: f64) -> Self {
        Self { offset }
    }

    /// The offset being removed, in m/s².
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// filtered = raw - offset
    pub fn apply(&self, raw: f64) -> f64 {
        raw - self.offset
    }
}

/// Slots reserved up front by [`HistoryBuffer::new`].
const MAX_PREALLOCATED: usize = 256;

/// Bounded FIFO of the most recent `(timestamp_ns, filtered)` samples.
///
/// Once the buffer holds `capacity` entries, each push evicts the oldest.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    samples: VecDeque<(i64, f64)>,
    capacity: usize,
}

impl HistoryBuffer {
    /// Create an empty buffer. A zero capacity is raised to 1.
    ///
    /// Storage grows on demand past the first `MAX_PREALLOCATED` slots, so a
    /// huge window costs nothing until samples actually arrive.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity.min(MAX_PREALLOCATED)),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest once the buffer is full.
    pub fn push(&mut self, timestamp_ns: i64, value: f64) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back((timestamp_ns, value));
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &(i64, f64)> {
        self.samples.iter()
    }

    /// Most recently pushed sample.
    pub fn latest(&self) -> Option<(i64, f64)> {
        self.samples.back().copied()
    }

    /// Mean of the buffered values, `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: f64 = self.samples.iter().map(|(_, v)| v).sum();
        Some(sum / self.samples.len() as f64)
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Classifies filtered values into Negative / Neutral / Positive.
///
/// Comparisons are strict: a value exactly on the threshold is Neutral.
/// NaN compares false both ways and therefore lands in Neutral too.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignClassifier {
    threshold: f64,
}

impl SignClassifier {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.abs(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn classify(&self, filtered: f64) -> SignState {
        if filtered > self.threshold {
            SignState::Positive
        } else if filtered < -self.threshold {
            SignState::Negative
        } else {
            SignState::Neutral
        }
    }
}

/// The filtering front end: offset removal, history, classification.
///
/// This is the hot path. One call per delivered sample.
#[derive(Debug, Clone)]
pub struct SignalConditioner {
    filter: OffsetFilter,
    history: HistoryBuffer,
    classifier: SignClassifier,
}

impl SignalConditioner {
    pub fn new(config: &EstimatorConfig) -> Self {
        Self {
            filter: OffsetFilter::new(config.gravity_offset),
            history: HistoryBuffer::new(config.window_size),
            classifier: SignClassifier::new(config.dead_zone),
        }
    }

    /// Filter one raw reading, record it, and classify it.
    pub fn process(&mut self, timestamp_ns: i64, raw: f64) -> ConditionedSample {
        let filtered = self.filter.apply(raw);
        self.history.push(timestamp_ns, filtered);

        ConditionedSample {
            timestamp_ns,
            filtered,
            sign: self.classifier.classify(filtered),
        }
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn filter(&self) -> &OffsetFilter {
        &self.filter
    }

    pub fn classifier(&self) -> &SignClassifier {
        &self.classifier
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}

/// A sample after offset removal and classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConditionedSample {
    pub timestamp_ns: i64,
    pub filtered: f64,
    pub sign: SignState,
}
