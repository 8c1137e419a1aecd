//! Mathematical utilities: least squares and series transforms.

pub mod ols;
pub mod transform;

pub use ols::*;
pub use transform::*;
