//! Accelerometer sample feeds.
//!
//! The estimator only needs an ordered supply of `(timestamp, value)` pairs.
//! This module provides the trait the session pulls from plus the feeds used
//! off-device:
//! - [`ChannelSource`]: a platform callback thread pushes, the session pulls
//! - [`ReplaySource`]: a recorded capture, in memory or from JSON lines
//! - [`SyntheticPendulum`]: an ideal swing for demos and tests
//!
//! Sensor lookup goes through [`SensorRegistry`] so that a device without an
//! accelerometer fails at session construction instead of producing nonsense.

use std::collections::VecDeque;
use std::f64::consts::{PI, TAU};
use std::io::BufRead;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::config::STANDARD_GRAVITY;
use crate::error::{Error, Result};
use crate::types::{AccelSample, Axis};

/// Ordered supply of accelerometer samples.
#[async_trait]
pub trait SampleSource: Send {
    /// Next sample, or `None` once the feed has ended.
    async fn recv(&mut self) -> Result<Option<AccelSample>>;
}

/// Platform sensor lookup.
pub trait SensorRegistry {
    /// The default accelerometer, if the device has one.
    fn default_accelerometer(&self) -> Option<Box<dyn SampleSource>>;
}

/// Look up the accelerometer or fail with [`Error::SensorUnavailable`].
pub fn open_accelerometer(registry: &dyn SensorRegistry) -> Result<Box<dyn SampleSource>> {
    registry
        .default_accelerometer()
        .ok_or_else(|| Error::SensorUnavailable {
            sensor: "accelerometer".into(),
        })
}

/// Sender half handed to the platform callback.
#[derive(Debug, Clone)]
pub struct SampleSender {
    tx: mpsc::Sender<AccelSample>,
}

impl SampleSender {
    /// Push a sample without blocking. Returns false if the buffer is full
    /// or the session has gone away; the sample is dropped in that case.
    pub fn try_send(&self, sample: AccelSample) -> bool {
        self.tx.try_send(sample).is_ok()
    }

    /// Push a sample, waiting for buffer space.
    pub async fn send(&self, sample: AccelSample) -> Result<()> {
        self.tx.send(sample).await.map_err(|_| Error::SourceClosed)
    }
}

/// Receiving end of a bounded sample channel.
#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::Receiver<AccelSample>,
}

impl ChannelSource {
    /// Create a bounded channel holding at most `capacity` undelivered samples.
    pub fn new(capacity: usize) -> (SampleSender, ChannelSource) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (SampleSender { tx }, ChannelSource { rx })
    }
}

#[async_trait]
impl SampleSource for ChannelSource {
    async fn recv(&mut self) -> Result<Option<AccelSample>> {
        Ok(self.rx.recv().await)
    }
}

/// Replays a fixed sequence of samples.
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    samples: VecDeque<AccelSample>,
}

impl ReplaySource {
    pub fn new(samples: Vec<AccelSample>) -> Self {
        Self {
            samples: samples.into(),
        }
    }

    /// Parse one JSON object per line: `{"timestamp_ns": .., "accel": [x, y, z]}`.
    ///
    /// Blank lines are skipped. Errors carry the 1-based line number.
    pub fn from_json_lines<R: BufRead>(reader: R) -> Result<Self> {
        let mut samples = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let sample: AccelSample = serde_json::from_str(trimmed)
                .map_err(|e| Error::InvalidInput(format!("line {}: {}", index + 1, e)))?;
            samples.push(sample);
        }
        Ok(Self::new(samples))
    }

    /// Samples not yet delivered.
    pub fn remaining(&self) -> usize {
        self.samples.len()
    }
}

#[async_trait]
impl SampleSource for ReplaySource {
    async fn recv(&mut self) -> Result<Option<AccelSample>> {
        Ok(self.samples.pop_front())
    }
}

/// Generator for an ideal, undamped swing on one axis.
///
/// value(t) = bias + amplitude * sin(2π t / period + phase)
///
/// On the Z axis the bias is standard gravity, matching a phone whose
/// tracked axis also carries gravity.
#[derive(Debug, Clone)]
pub struct SyntheticPendulum {
    axis: Axis,
    period_ns: i64,
    amplitude: f64,
    bias: f64,
    phase_rad: f64,
    interval_ns: i64,
    duration_ns: i64,
    next_ns: Option<i64>,
}

/// Convert a count of `unit_ns`-long units to nanoseconds, saturating at `i64::MAX`.
fn saturating_ns(count: u64, unit_ns: i64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX).saturating_mul(unit_ns)
}

/// Like [`saturating_ns`], but `None` when the result does not fit.
fn checked_ns(count: u64, unit_ns: i64) -> Option<i64> {
    i64::try_from(count).ok()?.checked_mul(unit_ns)
}

impl SyntheticPendulum {
    /// A swing of `period_ms` sampled every `interval_us` for `duration_ms`.
    ///
    /// Durations that do not fit in i64 nanoseconds saturate. The default
    /// phase puts each rising center crossing halfway between two samples,
    /// so no sample lands in the dead zone around it.
    pub fn new(axis: Axis, period_ms: u64, interval_us: u64, duration_ms: u64) -> Self {
        let bias = if axis == Axis::Z { STANDARD_GRAVITY } else { 0.0 };
        let period_ns = saturating_ns(period_ms.max(1), 1_000_000);
        let interval_ns = saturating_ns(interval_us.max(1), 1_000);
        Self {
            axis,
            period_ns,
            amplitude: 3.0,
            bias,
            phase_rad: -PI * interval_ns as f64 / period_ns as f64,
            interval_ns,
            duration_ns: saturating_ns(duration_ms, 1_000_000),
            next_ns: Some(0),
        }
    }

    /// Like [`SyntheticPendulum::new`], but rejects arguments that overflow
    /// i64 nanoseconds instead of saturating them.
    pub fn checked(axis: Axis, period_ms: u64, interval_us: u64, duration_ms: u64) -> Result<Self> {
        let overflow = |what: &str| Error::Config(format!("{what} is too large to express in nanoseconds"));
        checked_ns(period_ms, 1_000_000).ok_or_else(|| overflow("swing period"))?;
        checked_ns(interval_us, 1_000).ok_or_else(|| overflow("sample interval"))?;
        checked_ns(duration_ms, 1_000_000).ok_or_else(|| overflow("duration"))?;
        Ok(Self::new(axis, period_ms, interval_us, duration_ms))
    }

    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn with_phase(mut self, phase_rad: f64) -> Self {
        self.phase_rad = phase_rad;
        self
    }

    pub fn with_bias(mut self, bias: f64) -> Self {
        self.bias = bias;
        self
    }

    fn value_at(&self, t_ns: i64) -> f64 {
        let cycles = t_ns as f64 / self.period_ns as f64;
        self.bias + self.amplitude * (TAU * cycles + self.phase_rad).sin()
    }

    /// Produce the next sample, `None` past the configured duration.
    pub fn next_sample(&mut self) -> Option<AccelSample> {
        let t = self.next_ns.filter(|&t| t <= self.duration_ns)?;
        self.next_ns = t.checked_add(self.interval_ns);
        Some(AccelSample::on_axis(t, self.axis, self.value_at(t)))
    }
}

impl Iterator for SyntheticPendulum {
    type Item = AccelSample;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_sample()
    }
}

#[async_trait]
impl SampleSource for SyntheticPendulum {
    async fn recv(&mut self) -> Result<Option<AccelSample>> {
        Ok(self.next_sample())
    }
}
