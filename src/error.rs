//! Error types for the swing phase engine.
//!
//! The estimator itself is total over its numeric input and never fails.
//! Everything here is a precondition or configuration failure at the
//! boundary with the platform collaborators (sensor, actuator, config).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Sensor unavailable: no {sensor} present on this device")]
    SensorUnavailable { sensor: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Haptic actuator error: {0}")]
    Actuator(String),

    #[error("Sample source closed")]
    SourceClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidInput(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_unavailable_message() {
        let err = Error::SensorUnavailable {
            sensor: "accelerometer".into(),
        };
        assert_eq!(
            err.to_string(),
            "Sensor unavailable: no accelerometer present on this device"
        );
    }

    #[test]
    fn test_json_error_maps_to_invalid_input() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
