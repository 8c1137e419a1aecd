//! Calendar-month totals.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::domain::{CleanedDataset, MonthlySummary};

/// Order count and revenue per calendar month, ascending.
///
/// Months between the first and last observed month with no orders are
/// included with zero counts, so the table is a contiguous monthly calendar.
pub fn monthly_summary(dataset: &CleanedDataset) -> Vec<MonthlySummary> {
    let mut buckets: BTreeMap<NaiveDate, (usize, f64)> = BTreeMap::new();
    for tx in dataset.transactions() {
        let Some(month) = month_start(tx.date()) else {
            continue;
        };
        let entry = buckets.entry(month).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += tx.revenue;
    }

    let (Some(&first), Some(&last)) = (buckets.keys().next(), buckets.keys().next_back()) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut month = Some(first);
    while let Some(m) = month.filter(|m| *m <= last) {
        let (order_count, total_revenue) = buckets.get(&m).copied().unwrap_or((0, 0.0));
        out.push(MonthlySummary {
            month: m,
            order_count,
            total_revenue,
        });
        month = next_month(m);
    }
    out
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
}

fn next_month(month: NaiveDate) -> Option<NaiveDate> {
    if month.month() == 12 {
        NaiveDate::from_ymd_opt(month.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(month.year(), month.month() + 1, 1)
    }
}
