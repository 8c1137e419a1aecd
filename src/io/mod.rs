//! Input/output helpers.
//!
//! - monthly CSV ingest (`ingest`)
//! - table and forecast CSV exports (`export`)
//! - JSON run report (`json`)

pub mod export;
pub mod ingest;
pub mod json;

pub use export::*;
pub use ingest::*;
pub use json::*;
