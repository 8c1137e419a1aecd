//! Export the aggregate tables and forecasts to CSV.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::domain::{DailySeries, ForecastResult, MonthlySummary, ProductSummary};
use crate::error::AppError;

fn create(path: &Path) -> Result<Writer<File>, AppError> {
    Writer::from_path(path)
        .map_err(|e| AppError::input(format!("Failed to create export CSV '{}': {e}", path.display())))
}

fn write_row<I, S>(writer: &mut Writer<File>, row: I) -> Result<(), AppError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    writer
        .write_record(row)
        .map_err(|e| AppError::input(format!("Failed to write export CSV row: {e}")))
}

fn finish(mut writer: Writer<File>, path: &Path) -> Result<(), AppError> {
    writer
        .flush()
        .map_err(|e| AppError::input(format!("Failed to write export CSV '{}': {e}", path.display())))
}

/// `month,order_count,total_revenue`, months as `YYYY-MM`.
pub fn write_monthly_csv(path: &Path, rows: &[MonthlySummary]) -> Result<(), AppError> {
    let mut w = create(path)?;
    write_row(&mut w, ["month", "order_count", "total_revenue"])?;
    for r in rows {
        write_row(&mut w, [
            r.month.format("%Y-%m").to_string(),
            r.order_count.to_string(),
            format!("{:.2}", r.total_revenue),
        ])?;
    }
    finish(w, path)
}

/// One row per product, in the order given.
pub fn write_products_csv(path: &Path, rows: &[ProductSummary]) -> Result<(), AppError> {
    let mut w = create(path)?;
    write_row(&mut w, [
        "product",
        "order_count",
        "revenue_sum",
        "revenue_mean",
        "quantity_sum",
        "quantity_mean",
    ])?;
    for r in rows {
        write_row(&mut w, [
            r.product.clone(),
            r.order_count.to_string(),
            format!("{:.2}", r.revenue_sum),
            format!("{:.4}", r.revenue_mean),
            r.quantity_sum.to_string(),
            format!("{:.4}", r.quantity_mean),
        ])?;
    }
    finish(w, path)
}

pub fn write_daily_csv(path: &Path, series: &DailySeries) -> Result<(), AppError> {
    let mut w = create(path)?;
    write_row(&mut w, ["date", "total_revenue", "total_transactions", "order_count"])?;
    for p in series.points() {
        write_row(&mut w, [
            p.date.to_string(),
            format!("{:.2}", p.total_revenue),
            p.total_transactions.to_string(),
            p.order_count.to_string(),
        ])?;
    }
    finish(w, path)
}

/// `date,<series>`; transaction forecasts are written as integers.
pub fn write_forecast_csv(path: &Path, forecast: &ForecastResult) -> Result<(), AppError> {
    let mut w = create(path)?;
    write_row(&mut w, ["date", forecast.kind.column_name()])?;
    for p in &forecast.points {
        let value = if forecast.kind.is_count() {
            format!("{:.0}", p.value)
        } else {
            format!("{:.2}", p.value)
        };
        write_row(&mut w, [p.date.to_string(), value])?;
    }
    finish(w, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DailyPoint;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, 3, d).unwrap()
    }

    #[test]
    fn product_names_with_commas_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.csv");
        write_products_csv(&path, &[ProductSummary {
            product: "Cable, USB-C".to_string(),
            order_count: 2,
            revenue_sum: 23.9,
            revenue_mean: 11.95,
            quantity_sum: 2,
            quantity_mean: 1.0,
        }])
        .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("product,order_count,revenue_sum,revenue_mean,quantity_sum,quantity_mean")
        );
        assert_eq!(lines.next(), Some("\"Cable, USB-C\",2,23.90,11.9500,2,1.0000"));
    }

    #[test]
    fn daily_rows_follow_the_series() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daily.csv");
        let series = DailySeries::from_contiguous(vec![
            DailyPoint {
                date: day(1),
                total_revenue: 10.0,
                total_transactions: 3,
                order_count: 2,
            },
            DailyPoint::empty(day(2)),
        ])
        .unwrap();
        write_daily_csv(&path, &series).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "date,total_revenue,total_transactions,order_count\n2019-03-01,10.00,3,2\n2019-03-02,0.00,0,0\n"
        );
    }

    #[test]
    fn unwritable_path_is_an_input_error() {
        let err = write_monthly_csv(Path::new("/definitely/not/here/monthly.csv"), &[]).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
    }
}
