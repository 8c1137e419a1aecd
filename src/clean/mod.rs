//! Row cleaning: raw CSV rows in, typed transactions out.
//!
//! Rows are never silently defaulted. Every input row ends up either in the
//! cleaned dataset or in the rejected list with a reason, in this order:
//!
//! 1. any blank cell → `MissingValue`
//! 2. a repeat of the header line → `HeaderRow`
//! 3. order date, quantity, price coercion → `Invalid*`
//! 4. an exact repeat of an earlier surviving row, every column compared,
//!    → `Duplicate`
//!
//! Revenue is derived for every surviving row.

use std::collections::{BTreeMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::domain::{CleanedDataset, RawRecord, RejectReason, RejectedRow, Transaction};

/// The header value that marks a repeated header line in the exports.
const HEADER_ORDER_ID: &str = "Order ID";

/// Timestamp layouts accepted for the order date.
///
/// Two-digit years come first so `04/19/19` is not read as year 19.
const TIMESTAMP_FMTS: [&str; 6] = [
    "%m/%d/%y %H:%M",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%y %H:%M:%S",
];
const DATE_FMTS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Partition of the raw rows into kept and rejected.
#[derive(Debug, Clone, Default)]
pub struct CleanOutcome {
    pub dataset: CleanedDataset,
    pub rejected: Vec<RejectedRow>,
}

impl CleanOutcome {
    pub fn rejected_by_reason(&self) -> BTreeMap<RejectReason, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.rejected {
            *counts.entry(row.reason).or_insert(0) += 1;
        }
        counts
    }

    pub fn rejected_count(&self, reason: RejectReason) -> usize {
        self.rejected.iter().filter(|r| r.reason == reason).count()
    }
}

/// Clean a concatenated raw table.
pub fn clean_records(records: Vec<RawRecord>) -> CleanOutcome {
    let mut kept: Vec<Transaction> = Vec::with_capacity(records.len());
    let mut rejected = Vec::new();
    let mut seen: HashSet<DedupKey> = HashSet::with_capacity(records.len());

    for raw in records {
        match coerce(&raw) {
            Ok(tx) => {
                if seen.insert(DedupKey::of(&tx, &raw.extra)) {
                    kept.push(tx);
                } else {
                    rejected.push(RejectedRow {
                        source: raw.source,
                        reason: RejectReason::Duplicate,
                        detail: None,
                    });
                }
            }
            Err((reason, detail)) => rejected.push(RejectedRow {
                source: raw.source,
                reason,
                detail,
            }),
        }
    }

    debug!(kept = kept.len(), rejected = rejected.len(), "cleaned raw rows");

    CleanOutcome {
        dataset: CleanedDataset::from_transactions(kept),
        rejected,
    }
}

type Rejection = (RejectReason, Option<String>);

fn coerce(raw: &RawRecord) -> Result<Transaction, Rejection> {
    let (Some(order_id), Some(product), Some(quantity), Some(price), Some(timestamp)) = (
        raw.order_id.as_deref(),
        raw.product.as_deref(),
        raw.quantity.as_deref(),
        raw.unit_price.as_deref(),
        raw.order_timestamp.as_deref(),
    ) else {
        return Err((RejectReason::MissingValue, None));
    };
    if raw.other_missing {
        return Err((RejectReason::MissingValue, None));
    }

    if is_header_row(order_id) {
        return Err((RejectReason::HeaderRow, None));
    }

    let order_timestamp = parse_timestamp(timestamp)
        .ok_or_else(|| (RejectReason::InvalidTimestamp, Some(timestamp.to_string())))?;
    let quantity = parse_quantity(quantity)
        .ok_or_else(|| (RejectReason::InvalidQuantity, Some(quantity.to_string())))?;
    let unit_price =
        parse_price(price).ok_or_else(|| (RejectReason::InvalidPrice, Some(price.to_string())))?;

    Ok(Transaction::new(order_id, product, quantity, unit_price, order_timestamp))
}

fn is_header_row(order_id: &str) -> bool {
    order_id == HEADER_ORDER_ID
}

/// Parse an order timestamp; date-only values resolve to midnight.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    TIMESTAMP_FMTS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FMTS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parse a non-negative whole quantity. `"2.0"` is accepted, `"2.5"` is not.
pub fn parse_quantity(s: &str) -> Option<u32> {
    let s = s.trim();
    if let Ok(v) = s.parse::<u32>() {
        return Some(v);
    }
    let v = s.parse::<f64>().ok()?;
    let whole = v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= f64::from(u32::MAX);
    whole.then_some(v as u32)
}

/// Parse a finite, non-negative unit price.
pub fn parse_price(s: &str) -> Option<f64> {
    let v = s.trim().parse::<f64>().ok()?;
    (v.is_finite() && v >= 0.0).then_some(v)
}

/// Identity of a row for exact-duplicate removal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DedupKey {
    order_id: String,
    product: String,
    quantity: u32,
    unit_price_bits: u64,
    order_timestamp: NaiveDateTime,
    extra: Vec<String>,
}

impl DedupKey {
    fn of(tx: &Transaction, extra: &[String]) -> Self {
        Self {
            order_id: tx.order_id.clone(),
            product: tx.product.clone(),
            quantity: tx.quantity,
            unit_price_bits: tx.unit_price.to_bits(),
            order_timestamp: tx.order_timestamp,
            extra: extra.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(order_id: &str, product: &str, qty: &str, price: &str, ts: &str) -> RawRecord {
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        RawRecord {
            source: None,
            order_id: opt(order_id),
            product: opt(product),
            quantity: opt(qty),
            unit_price: opt(price),
            order_timestamp: opt(ts),
            other_missing: false,
            extra: Vec::new(),
        }
    }

    fn with_address(mut row: RawRecord, address: &str) -> RawRecord {
        row.extra = vec![address.to_string()];
        row
    }

    #[test]
    fn header_repeat_is_rejected() {
        let out = clean_records(vec![
            raw("176558", "USB-C Charging Cable", "2", "11.95", "04/19/19 08:46"),
            raw("Order ID", "Product", "Quantity Ordered", "Price Each", "Order Date"),
        ]);
        assert_eq!(out.dataset.len(), 1);
        assert!(out.dataset.transactions().iter().all(|t| t.order_id != "Order ID"));
        assert_eq!(out.rejected_count(RejectReason::HeaderRow), 1);
    }

    #[test]
    fn blank_cells_are_rejected_before_coercion() {
        let mut partial = raw("176560", "Google Phone", "1", "600", "04/12/19 14:38");
        partial.other_missing = true;

        let out = clean_records(vec![
            raw("", "", "", "", ""),
            raw("176559", "", "1", "99.99", "04/07/19 22:30"),
            partial,
        ]);
        assert!(out.dataset.is_empty());
        assert_eq!(out.rejected_count(RejectReason::MissingValue), 3);
    }

    #[test]
    fn coercion_failures_are_partitioned_by_reason() {
        let out = clean_records(vec![
            raw("1", "A", "2", "1.50", "not a date"),
            raw("2", "A", "two", "1.50", "04/19/19 08:46"),
            raw("3", "A", "-1", "1.50", "04/19/19 08:46"),
            raw("4", "A", "2", "abc", "04/19/19 08:46"),
            raw("5", "A", "2", "-3", "04/19/19 08:46"),
            raw("6", "A", "2", "1.50", "04/19/19 08:46"),
        ]);
        assert_eq!(out.dataset.len(), 1);
        let counts = out.rejected_by_reason();
        assert_eq!(counts.get(&RejectReason::InvalidTimestamp), Some(&1));
        assert_eq!(counts.get(&RejectReason::InvalidQuantity), Some(&2));
        assert_eq!(counts.get(&RejectReason::InvalidPrice), Some(&2));
    }

    #[test]
    fn exact_duplicates_keep_first_occurrence() {
        let out = clean_records(vec![
            raw("7", "Lightning Charging Cable", "1", "14.95", "12/30/19 00:01"),
            raw("7", "Lightning Charging Cable", "1", "14.95", "12/30/19 00:01"),
            raw("7", "Lightning Charging Cable", "2", "14.95", "12/30/19 00:01"),
        ]);
        assert_eq!(out.dataset.len(), 2);
        assert_eq!(out.rejected_count(RejectReason::Duplicate), 1);
    }

    #[test]
    fn rows_differing_only_in_address_are_both_kept() {
        let line = || raw("1", "USB-C Charging Cable", "1", "11.95", "04/19/19 08:46");
        let out = clean_records(vec![
            with_address(line(), "917 1st St, Dallas, TX 75001"),
            with_address(line(), "682 Chestnut St, Boston, MA 02215"),
            with_address(line(), "682 Chestnut St, Boston, MA 02215"),
        ]);
        assert_eq!(out.dataset.len(), 2);
        assert_eq!(out.rejected_count(RejectReason::Duplicate), 1);
    }

    #[test]
    fn revenue_matches_quantity_times_price_exactly() {
        let out = clean_records(vec![
            raw("1", "AAA Batteries (4-pack)", "3", "2.99", "01/22/19 21:25"),
            raw("2", "27in FHD Monitor", "1", "149.99", "01/28/19 14:15"),
            raw("3", "Wired Headphones", "0", "11.99", "01/17/19 13:33"),
        ]);
        assert_eq!(out.dataset.len(), 3);
        for t in out.dataset.transactions() {
            assert_eq!(t.revenue, f64::from(t.quantity) * t.unit_price);
            assert!(t.unit_price >= 0.0);
        }
    }

    #[test]
    fn timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2019, 4, 19)
            .unwrap()
            .and_hms_opt(8, 46, 0)
            .unwrap();
        assert_eq!(parse_timestamp("04/19/19 08:46"), Some(expected));
        assert_eq!(parse_timestamp("04/19/2019 08:46"), Some(expected));
        assert_eq!(parse_timestamp("2019-04-19 08:46:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2019-04-19").map(|t| t.date()),
            Some(expected.date())
        );
        assert_eq!(parse_timestamp("Order Date"), None);
    }

    #[test]
    fn quantity_accepts_whole_floats_only() {
        assert_eq!(parse_quantity("3"), Some(3));
        assert_eq!(parse_quantity("3.0"), Some(3));
        assert_eq!(parse_quantity("3.5"), None);
        assert_eq!(parse_quantity("-1"), None);
        assert_eq!(parse_quantity("NaN"), None);
    }
}
