//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the pipeline and model code stay clean and testable
//! - output changes are localized

use crate::aggregate::{day_span, sort_by_revenue_desc};
use crate::domain::{
    DailySeries, FitSummary, ForecastResult, LoadStats, MonthlySummary, PipelineConfig, ProductSummary,
    RejectReason,
};

/// Dataset stats: files, rows, rejections by reason.
pub fn format_load_summary(stats: &LoadStats, config: &PipelineConfig) -> String {
    let mut out = String::new();

    out.push_str("=== sf - Sales Analysis ===\n");
    out.push_str(&format!("Data dir: {}\n", config.data_dir.display()));
    out.push_str(&format!(
        "Files: {} found, {} missing (year {})\n",
        stats.files_found.len(),
        stats.files_missing.len(),
        config.year
    ));
    if !stats.files_missing.is_empty() {
        out.push_str(&format!("  missing: {}\n", stats.files_missing.join(", ")));
    }
    out.push_str(&format!(
        "Rows: read={} kept={} rejected={}\n",
        stats.rows_read,
        stats.rows_kept,
        stats.rejected_total()
    ));
    for reason in RejectReason::ALL {
        if let Some(count) = stats.rejected.get(&reason) {
            out.push_str(&format!("  {:<20} {count:>8}\n", reason.label()));
        }
    }

    out
}

pub fn format_monthly_table(rows: &[MonthlySummary]) -> String {
    let mut out = String::new();
    out.push_str("Monthly summary:\n");
    push_line(&mut out, format!("{:<8} {:>10} {:>16}", "month", "orders", "revenue"));
    push_line(&mut out, format!("{:-<8} {:-<10} {:-<16}", "", "", ""));

    for r in rows {
        push_line(
            &mut out,
            format!(
                "{:<8} {:>10} {:>16}",
                r.month.format("%Y-%m"),
                r.order_count,
                fmt_money(r.total_revenue)
            ),
        );
    }

    let orders: usize = rows.iter().map(|r| r.order_count).sum();
    let revenue: f64 = rows.iter().map(|r| r.total_revenue).sum();
    push_line(&mut out, format!("{:<8} {orders:>10} {:>16}", "total", fmt_money(revenue)));
    out
}

/// Products sorted by revenue, highest first.
pub fn format_product_table(rows: &[ProductSummary]) -> String {
    let mut sorted = rows.to_vec();
    sort_by_revenue_desc(&mut sorted);

    let mut out = String::new();
    out.push_str("Products by revenue:\n");
    push_line(
        &mut out,
        format!(
            "{:<28} {:>8} {:>14} {:>10} {:>8} {:>7}",
            "product", "orders", "revenue", "rev/order", "qty", "qty/ord"
        ),
    );
    push_line(
        &mut out,
        format!("{:-<28} {:-<8} {:-<14} {:-<10} {:-<8} {:-<7}", "", "", "", "", "", ""),
    );

    for r in &sorted {
        push_line(
            &mut out,
            format!(
                "{:<28} {:>8} {:>14} {:>10.2} {:>8} {:>7.3}",
                truncate(&r.product, 28),
                r.order_count,
                fmt_money(r.revenue_sum),
                r.revenue_mean,
                r.quantity_sum,
                r.quantity_mean,
            ),
        );
    }

    out
}

pub fn format_daily_span(series: &DailySeries) -> String {
    match (series.first_date(), series.last_date()) {
        (Some(first), Some(last)) => {
            let empty_days = series.points().iter().filter(|p| p.order_count == 0).count();
            format!(
                "Daily series: {first} .. {last} ({} days, {empty_days} without orders)\n",
                day_span(first, last)
            )
        }
        _ => "Daily series: empty\n".to_string(),
    }
}

/// Forecast table followed by the fit diagnostics.
pub fn format_forecast(result: &ForecastResult) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} forecast ({} days after {}):\n",
        result.kind.display_name(),
        result.points.len(),
        result.last_observed
    ));
    push_line(&mut out, format!("{:<10} {:>14}", "date", result.kind.column_name()));
    push_line(&mut out, format!("{:-<10} {:-<14}", "", ""));
    for p in &result.points {
        let value = if result.kind.is_count() {
            format!("{:.0}", p.value)
        } else {
            fmt_money(p.value)
        };
        push_line(&mut out, format!("{:<10} {value:>14}", p.date));
    }
    out.push('\n');
    out.push_str(&format_fit_summary(&result.fit));
    out
}

pub fn format_fit_summary(fit: &FitSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("Model: ARIMA{} on ln(series)\n", fit.order));
    out.push_str(&format!("- ar    : {}\n", fmt_vec(&fit.ar)));
    out.push_str(&format!("- ma    : {}\n", fmt_vec(&fit.ma)));
    if fit.order.d == 0 {
        out.push_str(&format!("- mean  : {:.6}\n", fit.mean));
    }
    out.push_str(&format!("- sigma2: {:.6}\n", fit.sigma2));
    out.push_str(&format!("- css   : {:.6} (n={}, iterations={})\n", fit.css, fit.n_obs, fit.iterations));
    if fit.zero_substitutions > 0 {
        out.push_str(&format!("- zero days replaced by 1: {}\n", fit.zero_substitutions));
    }
    out
}

/// Thousands-separated amount with two decimals, e.g. `1,234,567.89`.
pub fn fmt_money(v: f64) -> String {
    if !v.is_finite() {
        return format!("{v}");
    }
    let raw = format!("{:.2}", v.abs());
    let (int_part, frac) = raw.split_once('.').unwrap_or((raw.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if v < 0.0 && raw != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac}")
}

pub fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}
