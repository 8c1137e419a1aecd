//! Shared pipeline logic used by the CLI and the TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! read files -> clean -> aggregate -> (on demand) forecast
//!
//! Loading runs once per process; the result is handed to the views
//! explicitly rather than cached behind a global. The views then only call
//! the three data interfaces on `PipelineOutput`: `aggregates`,
//! `revenue_forecast`, and `transaction_forecast`.

use tracing::{info, warn};

use crate::aggregate::{Aggregates, aggregate};
use crate::clean::clean_records;
use crate::domain::{
    CleanedDataset, DailyPoint, ForecastResult, LoadStats, PipelineConfig, RejectReason, RejectedRow,
    SeriesKind,
};
use crate::error::{AppError, EXIT_NO_DATA, ForecastError};
use crate::io::ingest::read_source_files;

/// Cleaned rows plus the bookkeeping of how they were obtained.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub dataset: CleanedDataset,
    pub rejected: Vec<RejectedRow>,
    pub stats: LoadStats,
}

/// Result of the load step.
///
/// `NoData` is the sentinel for "nothing to analyse": no source files were
/// found, or cleaning removed every row. Callers short-circuit on it.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Loaded(LoadedData),
    NoData(LoadStats),
}

/// Read, concatenate, and clean the monthly exports.
pub fn load_and_clean(config: &PipelineConfig) -> Result<LoadOutcome, AppError> {
    let raw = read_source_files(&config.data_dir, config.year)?;
    let rows_read = raw.rows_read();
    let files_found = raw.files_found;
    let files_missing = raw.files_missing;

    if files_found.is_empty() {
        warn!(dir = %config.data_dir.display(), year = config.year, "no source files found");
        return Ok(LoadOutcome::NoData(LoadStats {
            files_found,
            files_missing,
            ..LoadStats::default()
        }));
    }

    let mut outcome = clean_records(raw.records);
    outcome.rejected.extend(raw.unreadable);
    let rejected_counts = outcome.rejected_by_reason();

    let stats = LoadStats {
        files_found,
        files_missing,
        rows_read,
        rows_kept: outcome.dataset.len(),
        rejected: rejected_counts,
    };

    for reason in RejectReason::ALL {
        if let Some(count) = stats.rejected.get(&reason) {
            info!(reason = reason.label(), count, "rejected rows");
        }
    }
    info!(
        files = stats.files_found.len(),
        rows_read = stats.rows_read,
        rows_kept = stats.rows_kept,
        "loaded transactions"
    );

    if outcome.dataset.is_empty() {
        warn!("every row was rejected during cleaning");
        return Ok(LoadOutcome::NoData(stats));
    }

    Ok(LoadOutcome::Loaded(LoadedData {
        dataset: outcome.dataset,
        rejected: outcome.rejected,
        stats,
    }))
}

/// Everything the views consume, computed from one load.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub config: PipelineConfig,
    pub loaded: LoadedData,
    aggregates: Aggregates,
}

impl PipelineOutput {
    /// Aggregate a loaded dataset.
    pub fn new(config: PipelineConfig, loaded: LoadedData) -> Self {
        let aggregates = aggregate(&loaded.dataset);
        Self {
            config,
            loaded,
            aggregates,
        }
    }

    pub fn aggregates(&self) -> &Aggregates {
        &self.aggregates
    }

    pub fn revenue_forecast(&self) -> Result<ForecastResult, ForecastError> {
        self.forecast(SeriesKind::Revenue)
    }

    pub fn transaction_forecast(&self) -> Result<ForecastResult, ForecastError> {
        self.forecast(SeriesKind::Transactions)
    }

    /// Fit and project one measure. Blocking; each call refits.
    pub fn forecast(&self, kind: SeriesKind) -> Result<ForecastResult, ForecastError> {
        crate::forecast::forecast_series(
            &self.aggregates.daily,
            kind,
            self.config.order,
            self.config.horizon,
        )
    }

    /// Trailing history shown next to a forecast.
    pub fn history_tail(&self) -> &[DailyPoint] {
        self.aggregates.daily.tail(self.config.history_tail)
    }
}

/// Load and aggregate; `Ok(None)` is the no-data outcome.
pub fn prepare(config: &PipelineConfig) -> Result<Option<PipelineOutput>, AppError> {
    match load_and_clean(config)? {
        LoadOutcome::Loaded(loaded) => Ok(Some(PipelineOutput::new(config.clone(), loaded))),
        LoadOutcome::NoData(_) => Ok(None),
    }
}

/// `prepare`, turning the no-data outcome into the user-facing error.
pub fn prepare_or_fail(config: &PipelineConfig) -> Result<PipelineOutput, AppError> {
    prepare(config)?.ok_or_else(|| no_data_error(config))
}

pub fn no_data_error(config: &PipelineConfig) -> AppError {
    AppError::new(
        EXIT_NO_DATA,
        format!(
            "Failed to load data: no usable sales_data_<month>_{}.csv rows under '{}'.",
            config.year,
            config.data_dir.display()
        ),
    )
}
