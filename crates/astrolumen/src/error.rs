//! Error taxonomy for chart computation.
//!
//! Every failure carries one of three kinds. The first two are caused by the
//! caller's input and are safe to report back verbatim; computation failures
//! are internal faults and should only be logged.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Exhaustive classification of [`ChartError`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad sidereal key, unsupported house system, unrecognized zone id,
    /// impossible local date or time.
    InvalidConfiguration,
    /// Geocode or timezone lookup found nothing for the input.
    LookupFailure,
    /// Ephemeris/house provider failure or a violated internal invariant.
    ComputationFailure,
}

impl ErrorKind {
    /// Whether the error was caused by the caller's input.
    pub fn is_caller_facing(self) -> bool {
        !matches!(self, ErrorKind::ComputationFailure)
    }
}

/// Errors that can occur while building a chart or searching for an event.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    #[error("Invalid house system: {code}. Valid systems: {valid:?}")]
    InvalidHouseSystem { code: String, valid: Vec<String> },
    #[error("Invalid sidereal mode: {key}. Valid modes: {valid:?}")]
    InvalidAyanamsa { key: String, valid: Vec<String> },
    #[error("Unrecognized timezone id: {zone}")]
    UnknownTimezone { zone: String },
    #[error("Local time {local} does not exist in timezone {zone}")]
    NonexistentLocalTime { local: NaiveDateTime, zone: String },
    #[error("Invalid date: {message}")]
    InvalidDate { message: String },
    #[error("Could not find the place: {place}")]
    PlaceNotFound { place: String },
    #[error("No timezone found for coordinates ({lat}, {lon})")]
    TimezoneNotFound { lat: f64, lon: f64 },
    #[error("Ephemeris file not found at path: {path}. {message}")]
    FileNotFound { path: String, message: String },
    #[error("Failed to calculate position for {body} at {datetime}: {message}")]
    CalculationFailed {
        body: String,
        datetime: DateTime<Utc>,
        message: String,
    },
    #[error("House calculation failed: {message}")]
    HouseCalculationFailed { message: String },
    #[error("Internal invariant violated: {message}")]
    Invariant { message: String },
}

impl ChartError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChartError::InvalidHouseSystem { .. }
            | ChartError::InvalidAyanamsa { .. }
            | ChartError::UnknownTimezone { .. }
            | ChartError::NonexistentLocalTime { .. }
            | ChartError::InvalidDate { .. } => ErrorKind::InvalidConfiguration,
            ChartError::PlaceNotFound { .. } | ChartError::TimezoneNotFound { .. } => {
                ErrorKind::LookupFailure
            }
            ChartError::FileNotFound { .. }
            | ChartError::CalculationFailed { .. }
            | ChartError::HouseCalculationFailed { .. }
            | ChartError::Invariant { .. } => ErrorKind::ComputationFailure,
        }
    }

    pub fn is_caller_facing(&self) -> bool {
        self.kind().is_caller_facing()
    }

    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        ChartError::Invariant {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let err = ChartError::InvalidHouseSystem {
            code: "Z".to_string(),
            valid: vec!["P".to_string()],
        };
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
        assert!(err.is_caller_facing());

        let err = ChartError::PlaceNotFound {
            place: "Atlantis".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::LookupFailure);
        assert!(err.is_caller_facing());

        let err = ChartError::invariant("natal sun missing");
        assert_eq!(err.kind(), ErrorKind::ComputationFailure);
        assert!(!err.is_caller_facing());
    }
}
