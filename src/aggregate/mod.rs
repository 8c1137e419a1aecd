//! Aggregate views over the cleaned dataset.
//!
//! All three views are pure functions of a `CleanedDataset`:
//!
//! - `monthly`: order count and revenue per calendar month
//! - `product`: revenue/quantity sums and means per product
//! - `daily`: the gap-filled daily series the forecaster runs on

pub mod daily;
pub mod monthly;
pub mod product;

pub use daily::*;
pub use monthly::*;
pub use product::*;

use serde::Serialize;
use tracing::info;

use crate::domain::{CleanedDataset, DailySeries, MonthlySummary, ProductSummary};

/// The three derived tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregates {
    pub monthly: Vec<MonthlySummary>,
    pub products: Vec<ProductSummary>,
    pub daily: DailySeries,
}

/// Compute every aggregate view.
pub fn aggregate(dataset: &CleanedDataset) -> Aggregates {
    let monthly = monthly_summary(dataset);
    let products = product_summary(dataset);
    let daily = daily_series(dataset);

    info!(
        months = monthly.len(),
        products = products.len(),
        days = daily.len(),
        "computed aggregates"
    );

    Aggregates {
        monthly,
        products,
        daily,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Transaction;
    use chrono::NaiveDate;

    fn tx(id: &str, product: &str, qty: u32, price: f64, y: i32, m: u32, d: u32) -> Transaction {
        let ts = NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        Transaction::new(id, product, qty, price, ts)
    }

    #[test]
    fn monthly_and_daily_revenue_are_conserved() {
        let dataset = CleanedDataset::from_transactions(vec![
            tx("1", "iPhone", 1, 700.0, 2019, 1, 3),
            tx("2", "Wired Headphones", 2, 11.99, 2019, 1, 31),
            tx("3", "Macbook Pro Laptop", 1, 1700.0, 2019, 3, 15),
            tx("4", "AAA Batteries (4-pack)", 4, 2.99, 2019, 3, 15),
            tx("5", "AAA Batteries (4-pack)", 1, 2.99, 2019, 4, 1),
        ]);

        let agg = aggregate(&dataset);
        let monthly_total: f64 = agg.monthly.iter().map(|m| m.total_revenue).sum();
        let daily_total = agg.daily.total_revenue();
        let rel = (monthly_total - daily_total).abs() / monthly_total.abs().max(1.0);
        assert!(rel < 1e-12, "monthly={monthly_total} daily={daily_total}");
        assert!((daily_total - dataset.total_revenue()).abs() < 1e-9);
    }

    #[test]
    fn empty_dataset_produces_empty_views() {
        let agg = aggregate(&CleanedDataset::default());
        assert!(agg.monthly.is_empty());
        assert!(agg.products.is_empty());
        assert!(agg.daily.is_empty());
    }
}
