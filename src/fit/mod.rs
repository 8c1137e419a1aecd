//! ARIMA estimation.
//!
//! Responsibilities:
//!
//! - generate start points (Hannan–Rissanen + a coarse coefficient grid)
//! - evaluate each start's conditional sum of squares (parallel)
//! - refine the best starts with Nelder–Mead and keep the best converged fit

pub mod fitter;
pub mod optimizer;
pub mod start_grid;

pub use fitter::*;
pub use optimizer::*;
pub use start_grid::*;
