//! Reporting utilities: formatted terminal output for the CLI.

pub mod format;

pub use format::*;
