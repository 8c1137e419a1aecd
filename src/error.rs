//! Error types.
//!
//! `AppError` is the process-level error: a message plus the exit code the `sf`
//! binary returns. `ForecastError` stays local to a single forecast so one
//! failing series never takes the other views down with it.

use thiserror::Error;

/// Input, usage, or IO problem (bad flags, unreadable files, failed exports).
pub const EXIT_INPUT: u8 = 2;
/// No source rows survived loading and cleaning.
pub const EXIT_NO_DATA: u8 = 3;
/// Terminal, model, or other internal failure.
pub const EXIT_INTERNAL: u8 = 4;

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(EXIT_INPUT, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(EXIT_INTERNAL, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure while fitting or projecting a single series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("invalid ARIMA order ({p},{d},{q}): {reason}")]
    InvalidOrder {
        p: usize,
        d: usize,
        q: usize,
        reason: String,
    },

    #[error("series too short for the model: need {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("series contains a non-finite or negative value at index {index}")]
    NonFiniteInput { index: usize },

    #[error("model fit did not converge after {iterations} iterations")]
    NotConverged { iterations: usize },

    #[error("model produced a non-finite forecast at step {step}")]
    NonFiniteForecast { step: usize },
}

impl From<ForecastError> for AppError {
    fn from(err: ForecastError) -> Self {
        AppError::internal(format!("Forecast failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_error_maps_to_internal_exit_code() {
        let err: AppError = ForecastError::NotConverged { iterations: 12 }.into();
        assert_eq!(err.exit_code(), EXIT_INTERNAL);
        assert!(err.to_string().contains("did not converge"));
    }
}
