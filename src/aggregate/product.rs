//! Per-product statistics.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::domain::{CleanedDataset, ProductSummary};

#[derive(Debug, Default)]
struct Acc {
    rows: usize,
    revenue: f64,
    quantity: u64,
}

/// One row per distinct product, ordered by product name.
pub fn product_summary(dataset: &CleanedDataset) -> Vec<ProductSummary> {
    let mut groups: BTreeMap<&str, Acc> = BTreeMap::new();
    for tx in dataset.transactions() {
        let acc = groups.entry(tx.product.as_str()).or_default();
        acc.rows += 1;
        acc.revenue += tx.revenue;
        acc.quantity += u64::from(tx.quantity);
    }

    groups
        .into_iter()
        .map(|(product, acc)| {
            let n = acc.rows as f64;
            ProductSummary {
                product: product.to_string(),
                order_count: acc.rows,
                revenue_sum: acc.revenue,
                revenue_mean: acc.revenue / n,
                quantity_sum: acc.quantity,
                quantity_mean: acc.quantity as f64 / n,
            }
        })
        .collect()
}

/// Sort for display: highest total revenue first, ties by name.
pub fn sort_by_revenue_desc(products: &mut [ProductSummary]) {
    products.sort_by(|a, b| {
        b.revenue_sum
            .partial_cmp(&a.revenue_sum)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.product.cmp(&b.product))
    });
}
