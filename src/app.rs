//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and resolves configuration
//! - installs the log subscriber
//! - runs the load/clean/aggregate pipeline
//! - prints reports, plots, and forecasts
//! - writes exports and synthetic datasets

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Command, CommonArgs, ExportArgs, ForecastArgs, GenerateArgs, LogArgs};
use crate::domain::{DEFAULT_HISTORY_TAIL, DEFAULT_YEAR, PipelineConfig, SeriesKind};
use crate::error::AppError;
use crate::models::validate_order;

pub mod pipeline;

/// Environment variable naming the directory with the monthly exports.
pub const ENV_DATA_DIR: &str = "SALES_DATA_DIR";
/// Environment variable overriding the year in the file names.
pub const ENV_YEAR: &str = "SALES_YEAR";

/// Entry point for the `sf` binary.
pub fn run() -> Result<(), AppError> {
    // A missing `.env` is the normal case.
    dotenvy::dotenv().ok();

    // We want `sf` and `sf --data-dir X` to behave like `sf tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Summary(args) => {
            init_tracing(&args.log, LogSink::Stderr)?;
            handle_summary(&args)
        }
        Command::Forecast(args) => {
            init_tracing(&args.common.log, LogSink::Stderr)?;
            handle_forecast(&args)
        }
        Command::Export(args) => {
            init_tracing(&args.common.log, LogSink::Stderr)?;
            handle_export(&args)
        }
        Command::Generate(args) => {
            init_tracing(&args.log, LogSink::Stderr)?;
            handle_generate(&args)
        }
        Command::Tui(args) => {
            init_tracing(&args.log, LogSink::Discard)?;
            handle_tui(&args)
        }
    }
}

fn handle_summary(args: &CommonArgs) -> Result<(), AppError> {
    let config = pipeline_config_from_args(args)?;
    let output = pipeline::prepare_or_fail(&config)?;

    println!("{}", crate::report::format_load_summary(&output.loaded.stats, &config));
    println!("{}", crate::report::format_monthly_table(&output.aggregates().monthly));
    println!("{}", crate::report::format_product_table(&output.aggregates().products));
    println!("{}", crate::report::format_daily_span(&output.aggregates().daily));
    Ok(())
}

fn handle_forecast(args: &ForecastArgs) -> Result<(), AppError> {
    let config = pipeline_config_from_args(&args.common)?;
    let output = pipeline::prepare_or_fail(&config)?;

    let mut first_failure = None;
    for kind in args.series.kinds() {
        match output.forecast(kind) {
            Ok(result) => {
                println!("{}", crate::report::format_forecast(&result));
                if args.plot {
                    println!(
                        "{}",
                        crate::plot::render_forecast_plot(
                            output.history_tail(),
                            &result,
                            args.width,
                            args.height,
                        )
                    );
                }
            }
            Err(err) => {
                // One failing series must not hide the other.
                eprintln!("{} forecast failed: {err}", kind.display_name());
                first_failure.get_or_insert(err);
            }
        }
    }

    match first_failure {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

fn handle_export(args: &ExportArgs) -> Result<(), AppError> {
    let config = pipeline_config_from_args(&args.common)?;
    let output = pipeline::prepare_or_fail(&config)?;
    let out = &args.out;

    std::fs::create_dir_all(out).map_err(|e| {
        AppError::input(format!("Failed to create output directory '{}': {e}", out.display()))
    })?;

    let aggregates = output.aggregates();
    crate::io::export::write_monthly_csv(&out.join("monthly.csv"), &aggregates.monthly)?;
    crate::io::export::write_products_csv(&out.join("products.csv"), &aggregates.products)?;
    crate::io::export::write_daily_csv(&out.join("daily.csv"), &aggregates.daily)?;

    let mut forecasts = Vec::new();
    for kind in SeriesKind::ALL {
        let path = out.join(forecast_file_name(kind));
        match output.forecast(kind) {
            Ok(result) => {
                crate::io::export::write_forecast_csv(&path, &result)?;
                forecasts.push(Ok(result));
            }
            Err(err) => {
                warn!(series = kind.display_name(), error = %err, "forecast skipped in export");
                eprintln!("{} forecast failed: {err}", kind.display_name());
                forecasts.push(Err((kind, err)));
            }
        }
    }

    crate::io::json::write_report_json(&out.join("report.json"), &output, &forecasts)?;
    info!(dir = %out.display(), "export complete");
    println!("Wrote exports to {}", out.display());
    Ok(())
}

fn handle_generate(args: &GenerateArgs) -> Result<(), AppError> {
    let options = crate::data::SampleOptions {
        year: args.year,
        seed: args.seed,
        orders_per_day: args.orders_per_day,
        ..crate::data::SampleOptions::default()
    };
    let written = crate::data::write_sample_dataset(&args.out, &options)?;
    println!("Wrote {} files to {}", written.len(), args.out.display());
    Ok(())
}

fn handle_tui(args: &CommonArgs) -> Result<(), AppError> {
    let config = pipeline_config_from_args(args)?;
    crate::tui::run(config)
}

/// Export file name of one forecast.
pub fn forecast_file_name(kind: SeriesKind) -> &'static str {
    match kind {
        SeriesKind::Revenue => "forecast_revenue.csv",
        SeriesKind::Transactions => "forecast_transactions.csv",
    }
}

/// Resolve flags, then environment, then defaults.
pub fn pipeline_config_from_args(args: &CommonArgs) -> Result<PipelineConfig, AppError> {
    let env_dir = std::env::var(ENV_DATA_DIR).ok();
    let env_year = std::env::var(ENV_YEAR).ok();
    resolve_config(args, env_dir.as_deref(), env_year.as_deref())
}

fn resolve_config(
    args: &CommonArgs,
    env_dir: Option<&str>,
    env_year: Option<&str>,
) -> Result<PipelineConfig, AppError> {
    let data_dir = args
        .data_dir
        .clone()
        .or_else(|| env_dir.filter(|s| !s.trim().is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));

    let year = match (args.year, env_year) {
        (Some(year), _) => year,
        (None, Some(raw)) => raw
            .trim()
            .parse::<i32>()
            .map_err(|e| AppError::input(format!("Invalid {ENV_YEAR} '{raw}': {e}")))?,
        (None, None) => DEFAULT_YEAR,
    };

    validate_order(args.order).map_err(|e| AppError::input(e.to_string()))?;
    if args.horizon == 0 {
        return Err(AppError::input("Forecast horizon must be at least one day."));
    }

    Ok(PipelineConfig {
        data_dir,
        year,
        horizon: args.horizon,
        history_tail: DEFAULT_HISTORY_TAIL,
        order: args.order,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogSink {
    Stderr,
    /// Used while the dashboard owns the terminal.
    Discard,
}

/// Install the global log subscriber.
///
/// `RUST_LOG` wins over `--log-level`. `--log-file` always wins over `sink`.
fn init_tracing(args: &LogArgs, sink: LogSink) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .map_err(|e| AppError::input(format!("Invalid log level '{}': {e}", args.log_level)))?;

    let layer = tracing_subscriber::fmt::layer()
        .without_time()
        .with_target(false);

    // `try_init` only fails if a subscriber is already set, which is harmless.
    match (&args.log_file, sink) {
        (Some(path), _) => {
            let file = open_log_file(path)?;
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(layer.with_ansi(false).with_writer(std::sync::Mutex::new(file)))
                .try_init();
        }
        (None, LogSink::Stderr) => {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(layer.with_writer(std::io::stderr))
                .try_init();
        }
        (None, LogSink::Discard) => {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(layer.with_writer(std::io::sink))
                .try_init();
        }
    }
    Ok(())
}

fn open_log_file(path: &Path) -> Result<std::fs::File, AppError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::input(format!("Failed to open log file '{}': {e}", path.display())))
}

/// Rewrite argv so `sf` defaults to `sf tui`.
///
/// Rules:
/// - `sf`                      -> `sf tui`
/// - `sf --data-dir X ...`     -> `sf tui --data-dir X ...`
/// - `sf --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(
        arg1.as_str(),
        "summary" | "forecast" | "export" | "generate" | "tui"
    );
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}
