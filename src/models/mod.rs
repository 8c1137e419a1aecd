//! ARIMA model evaluation.
//!
//! Models are implemented as small, pure functions so that fitting/search code
//! can stay generic over the coefficient vector.

pub mod arima;

pub use arima::*;
