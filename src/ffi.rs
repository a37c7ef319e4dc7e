//! C FFI Bindings for the Android host
//!
//! This module exposes the phase estimator to the mobile app via C ABI.
//! The host keeps sensor registration, vibration, and timers on its side and
//! calls into Rust once per accelerometer callback.
//!
//! Memory Safety:
//! - The estimator instance must be freed with `swing_estimator_destroy()`
//! - NULL checks are performed on all inputs
//!
//! Thread Safety:
//! - The estimator is NOT thread-safe. Call it from the sensor callback
//!   thread only, or guard it with a mutex.

use std::os::raw::c_char;

use crate::config::EstimatorConfig;
use crate::estimator::PhaseEstimator;

// ============================================================================
// OPAQUE HANDLE TYPES
// ============================================================================

/// Opaque handle to a phase estimator.
pub struct SwingEstimator {
    estimator: PhaseEstimator,
}

/// Result status codes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwingStatus {
    /// Operation succeeded.
    Ok = 0,
    /// Null pointer provided.
    NullPointer = 1,
}

/// Output from a single ingestion.
#[repr(C)]
#[derive(Debug, Clone, Default)]
pub struct SwingPhaseOutput {
    /// 1 if a pulse should be scheduled, 0 otherwise.
    pub should_pulse: i32,
    /// Delay before the pulse in milliseconds (0 unless should_pulse).
    pub lead_ms: u64,
    /// Sign state after this sample (-1, 0, 1).
    pub sign: i32,
    /// Crossings currently held in the period ring (0-3).
    pub crossings: u32,
}

/// Configuration for the estimator.
#[repr(C)]
#[derive(Debug, Clone)]
pub struct SwingConfig {
    /// History window in samples (>= 1).
    pub window_size: u32,
    /// Dead-zone half-width in m/s².
    pub dead_zone: f64,
    /// Constant subtracted from raw readings (9.8 on the gravity axis).
    pub gravity_offset: f64,
    /// Fraction of the period used as pulse lead, [0, 1].
    pub lead_fraction: f64,
}

impl From<&SwingConfig> for EstimatorConfig {
    fn from(config: &SwingConfig) -> Self {
        Self {
            window_size: config.window_size as usize,
            dead_zone: config.dead_zone,
            gravity_offset: config.gravity_offset,
            lead_fraction: config.lead_fraction,
        }
    }
}

// ============================================================================
// ESTIMATOR LIFECYCLE
// ============================================================================

/// Create a new phase estimator.
///
/// # Safety
/// - `config` must be NULL or a valid pointer to SwingConfig.
/// - The returned pointer must be freed with `swing_estimator_destroy()`.
///
/// # Returns
/// - Pointer to SwingEstimator on success. A NULL `config` selects the
///   horizontal-axis defaults.
/// - NULL if the configuration is invalid.
#[no_mangle]
pub unsafe extern "C" fn swing_estimator_create(config: *const SwingConfig) -> *mut SwingEstimator {
    let config = if config.is_null() {
        EstimatorConfig::default()
    } else {
        EstimatorConfig::from(&*config)
    };

    if config.validate().is_err() {
        return std::ptr::null_mut();
    }

    Box::into_raw(Box::new(SwingEstimator {
        estimator: PhaseEstimator::new(config),
    }))
}

/// Destroy a phase estimator.
///
/// # Safety
/// - `estimator` must be a valid pointer from `swing_estimator_create()`.
/// - Must not be called more than once for the same pointer.
#[no_mangle]
pub unsafe extern "C" fn swing_estimator_destroy(estimator: *mut SwingEstimator) {
    if !estimator.is_null() {
        drop(Box::from_raw(estimator));
    }
}

/// Discard all session state.
///
/// # Safety
/// - `estimator` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn swing_estimator_reset(estimator: *mut SwingEstimator) -> SwingStatus {
    if estimator.is_null() {
        return SwingStatus::NullPointer;
    }

    (*estimator).estimator.reset();
    SwingStatus::Ok
}

// ============================================================================
// SAMPLE PROCESSING
// ============================================================================

/// Ingest one sample along the tracked axis.
///
/// # Safety
/// - `estimator` must be a valid pointer.
/// - `output` must be a valid pointer to receive results.
///
/// # Parameters
/// - `timestamp_ns`: Sensor event timestamp in nanoseconds.
/// - `value`: Raw acceleration on the tracked axis in m/s².
#[no_mangle]
pub unsafe extern "C" fn swing_estimator_ingest(
    estimator: *mut SwingEstimator,
    timestamp_ns: i64,
    value: f64,
    output: *mut SwingPhaseOutput,
) -> SwingStatus {
    if estimator.is_null() || output.is_null() {
        return SwingStatus::NullPointer;
    }

    let estimator = &mut (*estimator).estimator;
    let output = &mut *output;

    let result = estimator.ingest(timestamp_ns, value);

    output.should_pulse = i32::from(result.should_pulse);
    output.lead_ms = result.lead_ms;
    output.sign = match estimator.sign_state() {
        crate::types::SignState::Negative => -1,
        crate::types::SignState::Neutral => 0,
        crate::types::SignState::Positive => 1,
    };
    output.crossings = estimator.crossings() as u32;

    SwingStatus::Ok
}

/// Most recent valid period in milliseconds, or -1 if none yet.
///
/// # Safety
/// - `estimator` must be NULL or a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn swing_estimator_last_period_ms(estimator: *const SwingEstimator) -> i64 {
    if estimator.is_null() {
        return -1;
    }

    match (*estimator).estimator.last_period_ms() {
        Some(ms) => i64::try_from(ms).unwrap_or(i64::MAX),
        None => -1,
    }
}

// ============================================================================
// VERSION INFO
// ============================================================================

/// Get the library version string.
///
/// # Returns
/// - Static string, do NOT free.
#[no_mangle]
pub extern "C" fn swing_version() -> *const c_char {
    static VERSION: &[u8] = concat!("swing-pulse/", env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;
    use std::ptr;

    const MS: i64 = 1_000_000;

    #[test]
    fn test_estimator_lifecycle() {
        unsafe {
            let estimator = swing_estimator_create(ptr::null());
            assert!(!estimator.is_null());

            assert_eq!(swing_estimator_reset(estimator), SwingStatus::Ok);
            swing_estimator_destroy(estimator);
        }
    }

    #[test]
    fn test_invalid_config_returns_null() {
        let config = SwingConfig {
            window_size: 0,
            dead_zone: 0.1,
            gravity_offset: 0.0,
            lead_fraction: 0.25,
        };
        unsafe {
            assert!(swing_estimator_create(&config).is_null());
        }
    }

    #[test]
    fn test_max_window_size_does_not_preallocate() {
        let config = SwingConfig {
            window_size: u32::MAX,
            dead_zone: 0.1,
            gravity_offset: 0.0,
            lead_fraction: 0.25,
        };
        unsafe {
            let estimator = swing_estimator_create(&config);
            assert!(!estimator.is_null());

            let mut output = SwingPhaseOutput::default();
            for (t, v) in [(0, -1.0), (10 * MS, 1.0), (1000 * MS, -1.0), (1010 * MS, 1.0)] {
                assert_eq!(swing_estimator_ingest(estimator, t, v, &mut output), SwingStatus::Ok);
            }
            assert_eq!(output.should_pulse, 1);
            assert_eq!(output.lead_ms, 250);

            swing_estimator_destroy(estimator);
        }
    }

    #[test]
    fn test_gravity_axis_ingestion() {
        let config = SwingConfig {
            window_size: 30,
            dead_zone: 0.2,
            gravity_offset: 9.8,
            lead_fraction: 0.25,
        };

        unsafe {
            let estimator = swing_estimator_create(&config);
            let mut output = SwingPhaseOutput::default();

            let samples = [
                (0, -1.0),
                (10 * MS, -1.0),
                (20 * MS, 0.3),
                (1000 * MS, -1.0),
                (1010 * MS, -1.0),
                (1020 * MS, 0.3),
            ];
            for (t, v) in samples {
                let status = swing_estimator_ingest(estimator, t, v + 9.8, &mut output);
                assert_eq!(status, SwingStatus::Ok);
            }

            assert_eq!(output.should_pulse, 1);
            assert_eq!(output.lead_ms, 250);
            assert_eq!(output.sign, 1);
            assert_eq!(output.crossings, 2);
            assert_eq!(swing_estimator_last_period_ms(estimator), 1000);

            swing_estimator_destroy(estimator);
        }
    }

    #[test]
    fn test_version() {
        let version = swing_version();
        assert!(!version.is_null());

        unsafe {
            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(version_str.starts_with("swing-pulse/"));
        }
    }

    #[test]
    fn test_null_safety() {
        unsafe {
            assert_eq!(swing_estimator_reset(ptr::null_mut()), SwingStatus::NullPointer);

            let mut output = SwingPhaseOutput::default();
            let status = swing_estimator_ingest(ptr::null_mut(), 0, 0.0, &mut output);
            assert_eq!(status, SwingStatus::NullPointer);

            let estimator = swing_estimator_create(ptr::null());
            let status = swing_estimator_ingest(estimator, 0, 0.0, ptr::null_mut());
            assert_eq!(status, SwingStatus::NullPointer);
            swing_estimator_destroy(estimator);

            assert_eq!(swing_estimator_last_period_ms(ptr::null()), -1);
            swing_estimator_destroy(ptr::null_mut());
        }
    }
}
