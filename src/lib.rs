//! `sales-forecast` library crate.
//!
//! The binary (`sf`) is a thin wrapper around this library so that:
//!
//! - the cleaning, aggregation, and forecasting logic is testable without
//!   spawning processes
//! - the CLI and the dashboard share one pipeline (`app::pipeline`)

pub mod aggregate;
pub mod app;
pub mod clean;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod forecast;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod tui;
