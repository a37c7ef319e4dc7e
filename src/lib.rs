//! Swing Pulse Library
//!
//! A small on-device engine that watches one accelerometer axis of a phone
//! hanging from a swinging object, estimates the swing period from
//! successive center crossings, and schedules a haptic pulse to land on the
//! next peak of the swing.
//!
//! # Design Philosophy
//!
//! - **One state machine**: all the logic lives in [`PhaseEstimator`], a
//!   deterministic function of its state and the new sample.
//! - **Side effects at the edge**: sensor delivery and vibration are traits
//!   ([`SampleSource`], [`HapticActuator`], [`PulseScheduler`]) so the host
//!   platform plugs in its own.
//! - **Fail fast at the boundary**: no accelerometer or a bad config stops
//!   the session at construction; the estimator itself never errors.
//! - **Fixed memory**: bounded history and a three-entry period ring.
//!
//! # Example
//!
//! ```
//! use swing_pulse::{EstimatorConfig, PhaseEstimator};
//!
//! let mut estimator = PhaseEstimator::new(EstimatorConfig::horizontal());
//! let ms = 1_000_000;
//! for (t, v) in [(0, -1.0), (20 * ms, 0.3), (1000 * ms, -1.0), (1020 * ms, 0.3)] {
//!     let result = estimator.ingest(t, v);
//!     if result.should_pulse {
//!         assert_eq!(result.lead_ms, 250);
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod estimator;
pub mod ffi;
pub mod pulse;
pub mod session;
pub mod signal;
pub mod source;
pub mod types;

#[cfg(test)]
mod integration_tests;

// Re-export commonly used types
pub use config::{EstimatorConfig, PulseConfig, SessionConfig, STANDARD_GRAVITY};
pub use error::{Error, Result};
pub use estimator::{PeriodRing, PhaseEstimator, PERIOD_RING_CAPACITY};
pub use pulse::{
    HapticActuator, LoggingActuator, PulsePattern, PulseScheduler, RecordingActuator,
    TokioPulseScheduler,
};
pub use session::{SessionStats, SwingSession};
pub use signal::{HistoryBuffer, OffsetFilter, SignClassifier};
pub use source::{
    open_accelerometer, ChannelSource, ReplaySource, SampleSender, SampleSource, SensorRegistry,
    SyntheticPendulum,
};
pub use types::{AccelSample, Axis, PhaseResult, SignState};
