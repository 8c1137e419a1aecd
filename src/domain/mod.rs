//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw and cleaned transaction rows (`RawRecord`, `Transaction`, `CleanedDataset`)
//! - the three aggregate views (`MonthlySummary`, `ProductSummary`, `DailySeries`)
//! - forecast outputs and run configuration (`ForecastResult`, `PipelineConfig`)

pub mod types;

pub use types::*;
