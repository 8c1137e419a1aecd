use std::collections::HashSet;
use std::fs;
use std::path::Path;

use sales_forecast::aggregate::day_span;
use sales_forecast::app::pipeline::{LoadOutcome, PipelineOutput, load_and_clean, prepare, prepare_or_fail};
use sales_forecast::data::{SampleFile, SampleOptions, SampleRow, generate_sample, write_sample_dataset};
use sales_forecast::domain::{PipelineConfig, RejectReason, SeriesKind};
use sales_forecast::error::EXIT_NO_DATA;
use sales_forecast::io::{read_report_json, write_forecast_csv, write_report_json};

fn options() -> SampleOptions {
    SampleOptions {
        orders_per_day: 20.0,
        seed: 7,
        ..SampleOptions::default()
    }
}

fn config_for(dir: &Path) -> PipelineConfig {
    PipelineConfig {
        data_dir: dir.to_path_buf(),
        ..PipelineConfig::default()
    }
}

fn generated(dir: &Path) -> (Vec<SampleFile>, PipelineOutput) {
    write_sample_dataset(dir, &options()).unwrap();
    let files = generate_sample(&options()).unwrap();
    let output = prepare_or_fail(&config_for(dir)).unwrap();
    (files, output)
}

#[test]
fn generated_artifacts_are_rejected_by_reason() {
    let dir = tempfile::tempdir().unwrap();
    let (files, output) = generated(dir.path());
    let stats = &output.loaded.stats;

    let total_rows: usize = files.iter().map(|f| f.rows.len()).sum();
    let headers: usize = files
        .iter()
        .map(|f| f.count(|r| matches!(r, SampleRow::HeaderRepeat)))
        .sum();
    let blanks: usize = files.iter().map(|f| f.count(|r| matches!(r, SampleRow::Blank))).sum();
    let order_lines: usize = files.iter().map(|f| f.order_lines().count()).sum();
    let distinct: HashSet<u64> = files
        .iter()
        .flat_map(|f| f.order_lines().map(|o| o.order_id))
        .collect();

    assert_eq!(stats.files_found.len(), 12);
    assert!(stats.files_missing.is_empty());
    assert_eq!(stats.rows_read, total_rows);
    assert_eq!(stats.rows_kept, distinct.len());
    assert_eq!(stats.rejected.get(&RejectReason::HeaderRow).copied().unwrap_or(0), headers);
    assert_eq!(stats.rejected.get(&RejectReason::MissingValue).copied().unwrap_or(0), blanks);
    assert_eq!(
        stats.rejected.get(&RejectReason::Duplicate).copied().unwrap_or(0),
        order_lines - distinct.len()
    );
    assert_eq!(stats.rows_read, stats.rows_kept + stats.rejected_total());
}

#[test]
fn cleaned_rows_hold_the_row_invariants() {
    let dir = tempfile::tempdir().unwrap();
    let (_, output) = generated(dir.path());

    for t in output.loaded.dataset.transactions() {
        assert_ne!(t.order_id, "Order ID");
        assert!(t.unit_price >= 0.0);
        assert_eq!(t.revenue, f64::from(t.quantity) * t.unit_price);
    }
}

#[test]
fn daily_series_spans_the_observed_range() {
    let dir = tempfile::tempdir().unwrap();
    let (_, output) = generated(dir.path());

    let (first, last) = output.loaded.dataset.date_range().unwrap();
    let daily = &output.aggregates().daily;
    assert_eq!(daily.len(), day_span(first, last));
    assert_eq!(daily.len() as i64, (last - first).num_days() + 1);
    assert_eq!(daily.first_date(), Some(first));
    assert_eq!(daily.last_date(), Some(last));
    for w in daily.points().windows(2) {
        assert_eq!(w[0].date.succ_opt(), Some(w[1].date));
    }
}

#[test]
fn monthly_and_daily_revenue_agree() {
    let dir = tempfile::tempdir().unwrap();
    let (_, output) = generated(dir.path());
    let aggregates = output.aggregates();

    let monthly: f64 = aggregates.monthly.iter().map(|m| m.total_revenue).sum();
    let daily = aggregates.daily.total_revenue();
    assert!((monthly - daily).abs() <= 1e-6 * daily.max(1.0), "{monthly} vs {daily}");
    assert_eq!(aggregates.monthly.len(), 12);

    let orders: usize = aggregates.monthly.iter().map(|m| m.order_count).sum();
    assert_eq!(orders, output.loaded.dataset.len());
}

#[test]
fn both_forecasts_cover_thirty_days_after_the_last_date() {
    let dir = tempfile::tempdir().unwrap();
    let (_, output) = generated(dir.path());
    let last = output.aggregates().daily.last_date().unwrap();

    for kind in SeriesKind::ALL {
        let result = output.forecast(kind).unwrap();
        assert_eq!(result.points.len(), 30);
        assert_eq!(result.last_observed, last);
        assert_eq!(result.points[0].date, last.succ_opt().unwrap());
        for w in result.points.windows(2) {
            assert!(w[0].date < w[1].date);
        }
        for p in &result.points {
            assert!(p.value.is_finite() && p.value > 0.0);
            if kind.is_count() {
                assert_eq!(p.value.fract(), 0.0);
            }
        }
    }

    assert_eq!(output.history_tail().len(), 90);
}

#[test]
fn missing_directory_is_the_no_data_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&dir.path().join("absent"));

    match load_and_clean(&config).unwrap() {
        LoadOutcome::NoData(stats) => {
            assert!(stats.files_found.is_empty());
            assert_eq!(stats.files_missing.len(), 12);
            assert_eq!(stats.rows_read, 0);
        }
        LoadOutcome::Loaded(_) => panic!("expected no data"),
    }
    assert!(prepare(&config).unwrap().is_none());
    assert_eq!(prepare_or_fail(&config).unwrap_err().exit_code(), EXIT_NO_DATA);
}

#[test]
fn fully_rejected_input_is_the_no_data_outcome() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("sales_data_january_2019.csv"),
        "Order ID,Product,Quantity Ordered,Price Each,Order Date,Purchase Address\n\
         Order ID,Product,Quantity Ordered,Price Each,Order Date,Purchase Address\n\
         ,,,,,\n\
         1,Widget,many,1.00,01/02/19 10:00,somewhere\n",
    )
    .unwrap();

    match load_and_clean(&config_for(dir.path())).unwrap() {
        LoadOutcome::NoData(stats) => {
            assert_eq!(stats.files_found.len(), 1);
            assert_eq!(stats.rows_read, 3);
            assert_eq!(stats.rows_kept, 0);
            assert_eq!(stats.rejected_total(), 3);
        }
        LoadOutcome::Loaded(_) => panic!("expected no data"),
    }
}

#[test]
fn missing_months_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write_sample_dataset(dir.path(), &options()).unwrap();
    for month in ["february", "june", "july"] {
        fs::remove_file(dir.path().join(format!("sales_data_{month}_2019.csv"))).unwrap();
    }

    let output = prepare_or_fail(&config_for(dir.path())).unwrap();
    let stats = &output.loaded.stats;
    assert_eq!(stats.files_found.len(), 9);
    assert_eq!(stats.files_missing.len(), 3);

    // Gaps inside the range are zero-filled, not dropped.
    let feb = output
        .aggregates()
        .daily
        .points()
        .iter()
        .find(|p| p.date.to_string() == "2019-02-14")
        .unwrap();
    assert_eq!(feb.order_count, 0);
    assert_eq!(feb.total_revenue, 0.0);
}

#[test]
fn report_json_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let (_, output) = generated(dir.path());
    let out = dir.path().join("out");
    fs::create_dir_all(&out).unwrap();

    let revenue = output.revenue_forecast().unwrap();
    write_forecast_csv(&out.join("forecast_revenue.csv"), &revenue).unwrap();
    let forecasts = vec![Ok(revenue.clone()), Ok(output.transaction_forecast().unwrap())];
    write_report_json(&out.join("report.json"), &output, &forecasts).unwrap();

    let report = read_report_json(&out.join("report.json")).unwrap();
    assert_eq!(report.year, 2019);
    assert_eq!(report.load, output.loaded.stats);
    assert_eq!(report.monthly.len(), 12);
    assert_eq!(report.daily.len(), output.aggregates().daily.len());
    assert_eq!(report.forecasts.len(), 2);
    assert_eq!(report.forecasts[0].series, SeriesKind::Revenue);
    assert_eq!(report.forecasts[0].result.as_ref().map(|r| r.points.len()), Some(30));

    let csv = fs::read_to_string(out.join("forecast_revenue.csv")).unwrap();
    assert_eq!(csv.lines().count(), 31);
    assert!(csv.starts_with("date,total_revenue\n"));
}

#[test]
fn broken_files_are_rejected_without_losing_good_ones() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("sales_data_january_2019.csv"),
        "Order ID,Product,Quantity Ordered,Price Each,Order Date,Purchase Address\n\
         1,Widget,2,1.50,01/02/19 10:00,\"1 Main St, Austin, TX 73301\"\n\
         2,Widget,1,1.50,01/03/19 11:00,\"2 Main St, Austin, TX 73301\"\n",
    )
    .unwrap();
    fs::write(dir.path().join("sales_data_march_2019.csv"), "").unwrap();
    fs::write(
        dir.path().join("sales_data_april_2019.csv"),
        "Order ID,Product,Price Each,Order Date\n3,Widget,1.50,04/02/19 10:00\n",
    )
    .unwrap();

    let output = prepare_or_fail(&config_for(dir.path())).unwrap();
    let stats = &output.loaded.stats;
    assert_eq!(stats.files_found.len(), 3);
    assert_eq!(stats.rows_kept, 2);
    assert_eq!(stats.rejected.get(&RejectReason::Unreadable).copied(), Some(1));
    assert_eq!(stats.rejected.get(&RejectReason::MissingValue).copied(), Some(1));
    assert_eq!(stats.rows_read, stats.rows_kept + stats.rejected_total());
}

#[test]
fn only_broken_files_is_the_no_data_outcome() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("sales_data_march_2019.csv"), "").unwrap();

    let err = prepare_or_fail(&config_for(dir.path())).unwrap_err();
    assert_eq!(err.exit_code(), EXIT_NO_DATA);
}
