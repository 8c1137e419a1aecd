//! Command-line parsing for the sales analysis and forecasting tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline and presentation code. Values that may also come from the
//! environment are `Option`s here; `app` resolves them.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::domain::{ArimaOrder, DEFAULT_HORIZON, SeriesKind};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "sf", version, about = "Retail sales analysis and 30-day forecasting")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print load statistics, the monthly and product tables, and the daily span.
    Summary(CommonArgs),
    /// Fit the model and print forecast tables (optionally with an ASCII chart).
    Forecast(ForecastArgs),
    /// Write the aggregate tables, forecasts, and a JSON report to a directory.
    Export(ExportArgs),
    /// Write twelve synthetic monthly CSV files in the source format.
    Generate(GenerateArgs),
    /// Launch the interactive dashboard.
    Tui(CommonArgs),
}

/// Options shared by every command that loads data.
#[derive(Debug, Args, Clone)]
pub struct CommonArgs {
    /// Directory containing the `sales_data_<month>_<year>.csv` files.
    /// Falls back to `SALES_DATA_DIR`, then the current directory.
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Year in the source file names. Falls back to `SALES_YEAR`, then 2019.
    #[arg(long)]
    pub year: Option<i32>,

    /// Forecast horizon in days.
    #[arg(long, default_value_t = DEFAULT_HORIZON)]
    pub horizon: usize,

    /// ARIMA order as `p,d,q`.
    #[arg(long, default_value_t = ArimaOrder::default())]
    pub order: ArimaOrder,

    #[command(flatten)]
    pub log: LogArgs,
}

/// Logging options.
#[derive(Debug, Args, Clone)]
pub struct LogArgs {
    /// Log level: error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Append logs to this file (the dashboard otherwise discards them).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

/// Which forecasts to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeriesSelection {
    Revenue,
    Transactions,
    Both,
}

impl SeriesSelection {
    pub fn kinds(self) -> Vec<SeriesKind> {
        match self {
            Self::Revenue => vec![SeriesKind::Revenue],
            Self::Transactions => vec![SeriesKind::Transactions],
            Self::Both => SeriesKind::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Series to forecast.
    #[arg(long, value_enum, default_value_t = SeriesSelection::Both)]
    pub series: SeriesSelection,

    /// Render an ASCII chart of the recent history and the forecast.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Output directory (created if needed).
    #[arg(long, value_name = "DIR")]
    pub out: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct GenerateArgs {
    /// Output directory (created if needed).
    #[arg(long, value_name = "DIR")]
    pub out: PathBuf,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Year written into the file names and timestamps.
    #[arg(long, default_value_t = crate::domain::DEFAULT_YEAR)]
    pub year: i32,

    /// Mean number of orders per day.
    #[arg(long, default_value_t = 40.0)]
    pub orders_per_day: f64,

    #[command(flatten)]
    pub log: LogArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_forecast_flags() {
        let cli = Cli::parse_from([
            "sf", "forecast", "--data-dir", "data", "--order", "2,1,0", "--series", "revenue", "--plot",
        ]);
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast");
        };
        assert_eq!(args.common.data_dir, Some(PathBuf::from("data")));
        assert_eq!(args.common.order, ArimaOrder::new(2, 1, 0));
        assert_eq!(args.series.kinds(), vec![SeriesKind::Revenue]);
        assert!(args.plot);
        assert_eq!(args.common.horizon, 30);
        assert_eq!(args.common.log.log_level, "warn");
    }

    #[test]
    fn rejects_malformed_order() {
        assert!(Cli::try_parse_from(["sf", "summary", "--order", "1,1"]).is_err());
    }
}
