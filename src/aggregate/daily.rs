//! Gap-filled daily series.
//!
//! The forecaster assumes equally spaced observations, so every calendar day
//! between the first and last order date gets a point; days without orders are
//! zero.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{CleanedDataset, DailyPoint, DailySeries};

/// Daily revenue, units, and order lines over `[min_date, max_date]`.
pub fn daily_series(dataset: &CleanedDataset) -> DailySeries {
    let mut by_day: BTreeMap<NaiveDate, DailyPoint> = BTreeMap::new();
    for tx in dataset.transactions() {
        let date = tx.date();
        let point = by_day.entry(date).or_insert_with(|| DailyPoint::empty(date));
        point.total_revenue += tx.revenue;
        point.total_transactions += u64::from(tx.quantity);
        point.order_count += 1;
    }

    let (Some(&first), Some(&last)) = (by_day.keys().next(), by_day.keys().next_back()) else {
        return DailySeries::default();
    };

    let mut points = Vec::with_capacity(day_span(first, last));
    let mut day = Some(first);
    while let Some(d) = day.filter(|d| *d <= last) {
        points.push(by_day.remove(&d).unwrap_or_else(|| DailyPoint::empty(d)));
        day = d.succ_opt();
    }

    // Contiguous by construction.
    DailySeries::from_contiguous(points).unwrap_or_default()
}

/// Number of calendar days in `[first, last]`.
pub fn day_span(first: NaiveDate, last: NaiveDate) -> usize {
    usize::try_from((last - first).num_days() + 1).unwrap_or(0)
}
