//! Core data types for the swing phase engine.
//!
//! This module defines the vocabulary shared by the estimator, the sample
//! feed and the pulse scheduler. Types are kept small and `Copy` so they can
//! cross the sensor-callback boundary without allocation.
//!
//! Design principle: if a concept exists, it gets a type. The estimator only
//! ever sees a timestamp and one scalar, but everything around it (axis
//! selection, sign state, pulse decision) is named explicitly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A single raw accelerometer event as delivered by the platform.
///
/// This is the minimal input contract: three-axis acceleration and a
/// monotonic timestamp. The raw values are never modified here; the filtering
/// stage works on the scalar extracted with [`AccelSample::axis`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccelSample {
    /// Monotonic timestamp in nanoseconds. Must be non-decreasing within a
    /// session for the period measurement to be meaningful.
    pub timestamp_ns: i64,

    /// Accelerometer reading [x, y, z] in m/s², gravity included.
    pub accel: [f64; 3],
}

impl AccelSample {
    /// Creates a new accelerometer sample.
    pub fn new(timestamp_ns: i64, accel: [f64; 3]) -> Self {
        Self { timestamp_ns, accel }
    }

    /// Creates a sample that only carries a value on one axis.
    pub fn on_axis(timestamp_ns: i64, axis: Axis, value: f64) -> Self {
        let mut accel = [0.0; 3];
        accel[axis.index()] = value;
        Self { timestamp_ns, accel }
    }

    /// Extract the scalar acceleration along `axis`.
    pub fn axis(&self, axis: Axis) -> f64 {
        self.accel[axis.index()]
    }
}

/// Device axis the swing is tracked along.
///
/// `X` is the horizontal axis of a phone hanging upright; `Z` is the axis
/// dominated by gravity when the phone hangs face-forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    #[default]
    X,
    Y,
    Z,
}

impl Axis {
    /// Index of this axis in an `[x, y, z]` reading.
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
            Axis::Z => write!(f, "z"),
        }
    }
}

impl FromStr for Axis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            other => Err(Error::Config(format!("unknown axis '{other}', expected x, y or z"))),
        }
    }
}

/// Three-way classification of a filtered sample against the dead zone.
///
/// `Neutral` is a real state, not "unknown": a neutral reading overwrites a
/// previous `Negative` and therefore breaks a pending crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SignState {
    Negative,
    #[default]
    Neutral,
    Positive,
}

impl SignState {
    /// True for the Negative -> Positive transition (center crossed moving
    /// in the positive direction).
    pub fn is_rising_crossing(previous: SignState, current: SignState) -> bool {
        previous == SignState::Negative && current == SignState::Positive
    }
}

/// Output of one estimator ingestion.
///
/// `lead_ms` is only meaningful when `should_pulse` is true; otherwise it is
/// always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhaseResult {
    /// Whether a pulse should be scheduled for this sample.
    pub should_pulse: bool,
    /// Delay in milliseconds after which the pulse should fire.
    pub lead_ms: u64,
}

impl PhaseResult {
    /// The "nothing to do" result.
    pub fn idle() -> Self {
        Self {
            should_pulse: false,
            lead_ms: 0,
        }
    }

    /// A pulse scheduled `lead_ms` from now.
    pub fn pulse_after(lead_ms: u64) -> Self {
        Self {
            should_pulse: true,
            lead_ms,
        }
    }
}
