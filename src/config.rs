//! Configuration for the estimator and the sensing session.
//!
//! The two functional app variants differ only in constants (tracked axis,
//! dead zone, gravity offset, pulse length), so they are expressed here as
//! presets over the same structures instead of separate code paths.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Axis;

/// Standard gravity used for the static offset on the vertical axis (m/s²).
pub const STANDARD_GRAVITY: f64 = 9.8;

/// Default history window, in samples (~600ms at 50Hz).
pub const DEFAULT_WINDOW_SIZE: usize = 30;

/// Default sensor delivery interval in microseconds (~50Hz).
pub const DEFAULT_SAMPLE_INTERVAL_US: u64 = 20_000;

/// Prefix of environment variables that override configuration values.
pub const ENV_PREFIX: &str = "SWING_PULSE";

fn env_source() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX).separator("__")
}

/// Parameters of the phase estimator.
///
/// Tuned for a phone hanging from a swinging object and sampled at ~50Hz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Capacity of the history buffer in samples. Must be at least 1.
    pub window_size: usize,

    /// Half-width of the dead zone around zero in m/s².
    /// Readings within [-dead_zone, dead_zone] classify as Neutral.
    /// Typical: 0.1 on a horizontal axis, 0.2 on the gravity axis.
    pub dead_zone: f64,

    /// Constant subtracted from every raw reading (m/s²).
    /// 0.0 on a horizontal axis, ~9.8 on the axis carrying gravity.
    /// This is a static DC offset, not a low-pass filter.
    pub gravity_offset: f64,

    /// Fraction of the measured period used as the pulse lead.
    /// 0.25 places the pulse a quarter period after the center crossing,
    /// i.e. at the next extremum of a simple harmonic swing. Range: [0.0, 1.0].
    pub lead_fraction: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self::horizontal()
    }
}

impl EstimatorConfig {
    /// Horizontal-axis preset: no offset, 0.1 m/s² dead zone.
    pub fn horizontal() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            dead_zone: 0.1,
            gravity_offset: 0.0,
            lead_fraction: 0.25,
        }
    }

    /// Gravity-compensated preset for the vertical axis: 9.8 m/s² offset,
    /// 0.2 m/s² dead zone.
    pub fn gravity_compensated() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            dead_zone: 0.2,
            gravity_offset: STANDARD_GRAVITY,
            lead_fraction: 0.25,
        }
    }

    /// Replace the history window size.
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Check every parameter is within its documented range.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(Error::Config("window_size must be at least 1".into()));
        }
        if !self.dead_zone.is_finite() || self.dead_zone < 0.0 {
            return Err(Error::Config(format!(
                "dead_zone must be a finite non-negative value, got {}",
                self.dead_zone
            )));
        }
        if !self.gravity_offset.is_finite() {
            return Err(Error::Config(format!(
                "gravity_offset must be finite, got {}",
                self.gravity_offset
            )));
        }
        if !self.lead_fraction.is_finite() || !(0.0..=1.0).contains(&self.lead_fraction) {
            return Err(Error::Config(format!(
                "lead_fraction must be within [0, 1], got {}",
                self.lead_fraction
            )));
        }
        Ok(())
    }
}

/// Shape of the haptic pulse fired at each predicted peak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    /// Pulse length in milliseconds.
    pub duration_ms: u64,
    /// Drive amplitude, 1..=255.
    pub amplitude: u8,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            duration_ms: 100,
            amplitude: 255,
        }
    }
}

/// Complete configuration of a sensing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Axis the swing is tracked along.
    pub axis: Axis,

    /// Requested sensor delivery interval in microseconds.
    pub sample_interval_us: u64,

    /// Estimator parameters.
    pub estimator: EstimatorConfig,

    /// Haptic pulse shape.
    pub pulse: PulseConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::x_axis()
    }
}

impl SessionConfig {
    /// Phone hanging upright, tracking the horizontal X axis.
    pub fn x_axis() -> Self {
        Self {
            axis: Axis::X,
            sample_interval_us: DEFAULT_SAMPLE_INTERVAL_US,
            estimator: EstimatorConfig::horizontal(),
            pulse: PulseConfig::default(),
        }
    }

    /// Phone hanging face-forward, tracking the gravity-dominated Z axis.
    pub fn z_axis() -> Self {
        Self {
            axis: Axis::Z,
            sample_interval_us: DEFAULT_SAMPLE_INTERVAL_US,
            estimator: EstimatorConfig::gravity_compensated(),
            pulse: PulseConfig {
                duration_ms: 30,
                amplitude: 255,
            },
        }
    }

    /// Preset matching the given axis: gravity compensation on Z, none otherwise.
    pub fn for_axis(axis: Axis) -> Self {
        match axis {
            Axis::Z => Self::z_axis(),
            other => Self {
                axis: other,
                ..Self::x_axis()
            },
        }
    }

    /// Load configuration from a file, overridden by `SWING_PULSE__*` env vars.
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(env_source())
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `SWING_PULSE__*` environment variables over
    /// the default (X axis) preset.
    pub fn from_env() -> Result<Self> {
        Self::with_env_overrides(&Self::default())
    }

    /// Layer `SWING_PULSE__*` environment variables over `base`, e.g.
    /// `SWING_PULSE__ESTIMATOR__DEAD_ZONE=0.15`.
    pub fn with_env_overrides(base: &Self) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(base)?)
            .add_source(env_source())
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the session and its estimator parameters.
    pub fn validate(&self) -> Result<()> {
        if self.sample_interval_us == 0 {
            return Err(Error::Config("sample_interval_us must be positive".into()));
        }
        if self.pulse.amplitude == 0 {
            return Err(Error::Config("pulse amplitude must be in 1..=255".into()));
        }
        self.estimator.validate()
    }
}
