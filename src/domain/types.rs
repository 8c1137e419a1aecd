//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - built once by the loader and shared read-only with every view
//! - exported to JSON/CSV
//! - asserted on directly in tests

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Calendar year of the default monthly export set.
pub const DEFAULT_YEAR: i32 = 2019;

/// Number of days projected past the end of the daily series.
pub const DEFAULT_HORIZON: usize = 30;

/// Number of trailing history days shown next to a forecast.
pub const DEFAULT_HISTORY_TAIL: usize = 90;

/// ARIMA order `(p, d, q)`.
///
/// Defaults to `(1, 1, 1)`. The order is never searched; it is a constant that
/// can be overridden from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ArimaOrder {
    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Number of estimated coefficients (AR + MA).
    pub fn coeff_count(self) -> usize {
        self.p + self.q
    }
}

impl Default for ArimaOrder {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.p, self.d, self.q)
    }
}

impl FromStr for ArimaOrder {
    type Err = String;

    /// Parse `p,d,q` (parentheses and spaces allowed, e.g. `(1, 1, 1)`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s.trim().trim_start_matches('(').trim_end_matches(')');
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(format!("expected `p,d,q`, got '{s}'"));
        }
        let mut values = [0usize; 3];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse::<usize>()
                .map_err(|e| format!("invalid order component '{part}': {e}"))?;
        }
        Ok(Self::new(values[0], values[1], values[2]))
    }
}

/// Which daily measure a forecast is computed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Revenue,
    Transactions,
}

impl SeriesKind {
    pub const ALL: [SeriesKind; 2] = [SeriesKind::Revenue, SeriesKind::Transactions];

    pub fn display_name(self) -> &'static str {
        match self {
            SeriesKind::Revenue => "Revenue",
            SeriesKind::Transactions => "Transactions",
        }
    }

    /// Column name in exports; matches the daily series fields.
    pub fn column_name(self) -> &'static str {
        match self {
            SeriesKind::Revenue => "total_revenue",
            SeriesKind::Transactions => "total_transactions",
        }
    }

    /// Count series are reported as whole numbers.
    pub fn is_count(self) -> bool {
        matches!(self, SeriesKind::Transactions)
    }
}

/// Where a raw row came from (file name + 1-based CSV line).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowSource {
    pub file: String,
    pub line: usize,
}

/// A row as read from a monthly export, before any type coercion.
///
/// Required fields are `None` when the cell is absent or blank.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub source: Option<RowSource>,
    pub order_id: Option<String>,
    pub product: Option<String>,
    pub quantity: Option<String>,
    pub unit_price: Option<String>,
    pub order_timestamp: Option<String>,
    /// True when any non-required column of the row is blank.
    pub other_missing: bool,
    /// Non-required cells in column order, e.g. the purchase address.
    pub extra: Vec<String>,
}

/// A fully typed, validated transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub order_id: String,
    pub product: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub order_timestamp: NaiveDateTime,
    /// `quantity × unit_price`.
    pub revenue: f64,
}

impl Transaction {
    pub fn new(
        order_id: impl Into<String>,
        product: impl Into<String>,
        quantity: u32,
        unit_price: f64,
        order_timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            product: product.into(),
            quantity,
            unit_price,
            order_timestamp,
            revenue: f64::from(quantity) * unit_price,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.order_timestamp.date()
    }
}

/// Why a raw row did not make it into the cleaned dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The CSV reader could not decode the row at all.
    Unreadable,
    /// A cell was blank or absent.
    MissingValue,
    /// The row repeats the header line.
    HeaderRow,
    InvalidTimestamp,
    InvalidQuantity,
    InvalidPrice,
    /// Exact duplicate of an earlier row.
    Duplicate,
}

impl RejectReason {
    pub const ALL: [RejectReason; 7] = [
        RejectReason::Unreadable,
        RejectReason::MissingValue,
        RejectReason::HeaderRow,
        RejectReason::InvalidTimestamp,
        RejectReason::InvalidQuantity,
        RejectReason::InvalidPrice,
        RejectReason::Duplicate,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RejectReason::Unreadable => "unreadable",
            RejectReason::MissingValue => "missing value",
            RejectReason::HeaderRow => "repeated header",
            RejectReason::InvalidTimestamp => "invalid order date",
            RejectReason::InvalidQuantity => "invalid quantity",
            RejectReason::InvalidPrice => "invalid price",
            RejectReason::Duplicate => "duplicate",
        }
    }
}

/// A rejected row with its reason.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    pub source: Option<RowSource>,
    pub reason: RejectReason,
    pub detail: Option<String>,
}

/// The deduplicated, typed transaction table.
///
/// Built once per run and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanedDataset {
    transactions: Vec<Transaction>,
}

impl CleanedDataset {
    pub fn from_transactions(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// First and last calendar date present, if any.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut iter = self.transactions.iter().map(Transaction::date);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }

    pub fn total_revenue(&self) -> f64 {
        self.transactions.iter().map(|t| t.revenue).sum()
    }
}

/// Bookkeeping about a load: which files were read and what was dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadStats {
    pub files_found: Vec<String>,
    pub files_missing: Vec<String>,
    pub rows_read: usize,
    pub rows_kept: usize,
    pub rejected: BTreeMap<RejectReason, usize>,
}

impl LoadStats {
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}

/// One calendar month of activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    /// First day of the month.
    pub month: NaiveDate,
    pub order_count: usize,
    pub total_revenue: f64,
}

/// Per-product totals and means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub product: String,
    pub order_count: usize,
    pub revenue_sum: f64,
    pub revenue_mean: f64,
    pub quantity_sum: u64,
    pub quantity_mean: f64,
}

/// One day of the gap-filled daily series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub total_revenue: f64,
    /// Units ordered on the day.
    pub total_transactions: u64,
    /// Order lines on the day.
    pub order_count: usize,
}

impl DailyPoint {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total_revenue: 0.0,
            total_transactions: 0,
            order_count: 0,
        }
    }

    pub fn value(&self, kind: SeriesKind) -> f64 {
        match kind {
            SeriesKind::Revenue => self.total_revenue,
            SeriesKind::Transactions => self.total_transactions as f64,
        }
    }
}

/// Contiguous daily series: one point per calendar day, no gaps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    points: Vec<DailyPoint>,
}

impl DailySeries {
    /// Build from points that are already sorted and contiguous.
    ///
    /// Returns `None` if any two neighbours are not exactly one day apart.
    pub fn from_contiguous(points: Vec<DailyPoint>) -> Option<Self> {
        let contiguous = points
            .windows(2)
            .all(|w| w[0].date.succ_opt() == Some(w[1].date));
        contiguous.then_some(Self { points })
    }

    pub fn points(&self) -> &[DailyPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    pub fn values(&self, kind: SeriesKind) -> Vec<f64> {
        self.points.iter().map(|p| p.value(kind)).collect()
    }

    /// The last `n` days (or the whole series if shorter).
    pub fn tail(&self, n: usize) -> &[DailyPoint] {
        let start = self.points.len().saturating_sub(n);
        &self.points[start..]
    }

    pub fn total_revenue(&self) -> f64 {
        self.points.iter().map(|p| p.total_revenue).sum()
    }
}

/// A single projected day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Estimated model parameters and fit diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    pub order: ArimaOrder,
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    /// Mean of the differenced series (only estimated when `d = 0`).
    pub mean: f64,
    /// Conditional sum of squared residuals on the log scale.
    pub css: f64,
    pub sigma2: f64,
    pub n_obs: usize,
    pub iterations: usize,
    /// Number of zero observations replaced by one before the log.
    pub zero_substitutions: usize,
}

/// Forecast for one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub kind: SeriesKind,
    pub last_observed: NaiveDate,
    pub points: Vec<ForecastPoint>,
    pub fit: FitSummary,
}

impl ForecastResult {
    /// Forecast values as whole counts (transactions are already truncated).
    pub fn counts(&self) -> Vec<(NaiveDate, u64)> {
        self.points
            .iter()
            .map(|p| (p.date, p.value.max(0.0) as u64))
            .collect()
    }
}

/// A run's configuration as understood by the pipeline.
///
/// Derived from CLI flags, environment, and defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub year: i32,
    pub horizon: usize,
    pub history_tail: usize,
    pub order: ArimaOrder,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            year: DEFAULT_YEAR,
            horizon: DEFAULT_HORIZON,
            history_tail: DEFAULT_HISTORY_TAIL,
            order: ArimaOrder::default(),
        }
    }
}
