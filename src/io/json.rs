//! Read/write the JSON run report.
//!
//! The report is the portable representation of one run:
//! - configuration (data directory, year, order, horizon)
//! - load statistics and rejection counts
//! - the three aggregate tables
//! - each forecast, or the error that prevented it

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::app::pipeline::PipelineOutput;
use crate::domain::{
    ArimaOrder, DailyPoint, ForecastResult, LoadStats, MonthlySummary, ProductSummary, SeriesKind,
};
use crate::error::{AppError, ForecastError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportFile {
    pub tool: String,
    pub data_dir: String,
    pub year: i32,
    pub order: ArimaOrder,
    pub horizon: usize,
    pub load: LoadStats,
    pub monthly: Vec<MonthlySummary>,
    pub products: Vec<ProductSummary>,
    pub daily: Vec<DailyPoint>,
    pub forecasts: Vec<ForecastEntry>,
}

/// One forecast slot: exactly one of `result` / `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub series: SeriesKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ForecastResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub type ForecastOutcome = Result<ForecastResult, (SeriesKind, ForecastError)>;

/// Assemble the report from a pipeline run.
pub fn build_report(output: &PipelineOutput, forecasts: &[ForecastOutcome]) -> ReportFile {
    let aggregates = output.aggregates();
    let forecasts = forecasts
        .iter()
        .map(|f| match f {
            Ok(result) => ForecastEntry {
                series: result.kind,
                result: Some(result.clone()),
                error: None,
            },
            Err((kind, err)) => ForecastEntry {
                series: *kind,
                result: None,
                error: Some(err.to_string()),
            },
        })
        .collect();

    ReportFile {
        tool: "sf".to_string(),
        data_dir: output.config.data_dir.display().to_string(),
        year: output.config.year,
        order: output.config.order,
        horizon: output.config.horizon,
        load: output.loaded.stats.clone(),
        monthly: aggregates.monthly.clone(),
        products: aggregates.products.clone(),
        daily: aggregates.daily.points().to_vec(),
        forecasts,
    }
}

/// Write the report JSON file.
pub fn write_report_json(
    path: &Path,
    output: &PipelineOutput,
    forecasts: &[ForecastOutcome],
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create report JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, &build_report(output, forecasts))
        .map_err(|e| AppError::input(format!("Failed to write report JSON: {e}")))?;

    Ok(())
}

/// Read a report JSON file.
pub fn read_report_json(path: &Path) -> Result<ReportFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open report JSON '{}': {e}", path.display())))?;
    let report: ReportFile =
        serde_json::from_reader(file).map_err(|e| AppError::input(format!("Invalid report JSON: {e}")))?;
    Ok(report)
}
