//! CSV ingest for the monthly sales exports.
//!
//! This module only turns files into `RawRecord`s. It does no type coercion and
//! drops nothing except rows the CSV reader itself cannot decode; everything
//! else is left to `crate::clean`. A file with a broken header never fails the
//! load: its rows are kept with the absent columns blank, or the header line is
//! recorded as unreadable.
//!
//! Design goals:
//! - **Fixed file set**: twelve `sales_data_<month>_<year>.csv` exports
//! - **Missing files are fine**: they are listed, logged, and skipped
//! - **Header-driven**: columns are located by name, extra columns ignored

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, info, warn};

use crate::domain::{RawRecord, RejectReason, RejectedRow, RowSource};
use crate::error::AppError;

/// Lowercase English month names, in calendar order.
pub const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Required columns and the header spellings accepted for each.
const ORDER_ID_COLUMNS: [&str; 2] = ["order id", "order_id"];
const PRODUCT_COLUMNS: [&str; 1] = ["product"];
const QUANTITY_COLUMNS: [&str; 2] = ["quantity ordered", "quantity"];
const PRICE_COLUMNS: [&str; 3] = ["price each", "unit_price", "unit price"];
const DATE_COLUMNS: [&str; 2] = ["order date", "order_timestamp"];

/// The concatenated contents of every source file that was found.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub records: Vec<RawRecord>,
    /// Rows the CSV reader could not decode.
    pub unreadable: Vec<RejectedRow>,
    pub files_found: Vec<String>,
    pub files_missing: Vec<String>,
}

impl RawTable {
    pub fn rows_read(&self) -> usize {
        self.records.len() + self.unreadable.len()
    }
}

/// File names of the twelve monthly exports for `year`.
pub fn source_file_names(year: i32) -> Vec<String> {
    MONTH_NAMES
        .iter()
        .map(|month| format!("sales_data_{month}_{year}.csv"))
        .collect()
}

/// Read every monthly export for `year` that exists under `dir`.
///
/// Absent files (including an absent directory) are recorded in
/// `files_missing`; they are not an error.
pub fn read_source_files(dir: &Path, year: i32) -> Result<RawTable, AppError> {
    let mut table = RawTable::default();

    for name in source_file_names(year) {
        let path = dir.join(&name);
        if !path.is_file() {
            debug!(file = %path.display(), "source file not found, skipping");
            table.files_missing.push(name);
            continue;
        }

        let file = File::open(&path).map_err(|e| {
            AppError::input(format!("Failed to open CSV '{}': {e}", path.display()))
        })?;
        let (records, unreadable) = read_csv(file, &name);
        info!(file = %name, rows = records.len(), unreadable = unreadable.len(), "read source file");

        table.records.extend(records);
        table.unreadable.extend(unreadable);
        table.files_found.push(name);
    }

    Ok(table)
}

/// Read a single export from any reader.
///
/// `label` is used as the file name in row provenance and log messages.
///
/// An empty or undecodable header yields a single `Unreadable` row for line 1
/// and nothing else. Required columns absent from the header are read as blank
/// cells, so cleaning rejects those rows as missing values.
pub fn read_csv<R: Read>(reader: R, label: &str) -> (Vec<RawRecord>, Vec<RejectedRow>) {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = match reader.headers() {
        Ok(h) if h.iter().any(|name| !name.is_empty()) => h.clone(),
        Ok(_) => {
            warn!(file = %label, "source file has no header line");
            return (Vec::new(), vec![unreadable_header(label, "empty header".to_string())]);
        }
        Err(e) => {
            warn!(file = %label, error = %e, "source file header could not be decoded");
            return (Vec::new(), vec![unreadable_header(label, format!("CSV header error: {e}"))]);
        }
    };
    let columns = ColumnMap::resolve(&headers);
    let absent = columns.absent();
    if !absent.is_empty() {
        warn!(file = %label, columns = ?absent, "required columns missing; rows will be rejected");
    }

    let mut records = Vec::new();
    let mut unreadable = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header and CSV lines are 1-based.
        let fallback_line = idx + 2;
        match result {
            Ok(record) => {
                let line = record
                    .position()
                    .map_or(fallback_line, |p| p.line() as usize);
                records.push(columns.extract(&record, RowSource {
                    file: label.to_string(),
                    line,
                }));
            }
            Err(e) => unreadable.push(RejectedRow {
                source: Some(RowSource {
                    file: label.to_string(),
                    line: fallback_line,
                }),
                reason: RejectReason::Unreadable,
                detail: Some(format!("CSV parse error: {e}")),
            }),
        }
    }

    (records, unreadable)
}

fn unreadable_header(label: &str, detail: String) -> RejectedRow {
    RejectedRow {
        source: Some(RowSource {
            file: label.to_string(),
            line: 1,
        }),
        reason: RejectReason::Unreadable,
        detail: Some(detail),
    }
}

/// Column indices of the required fields within one file's header.
///
/// `None` marks a required column the header does not have.
#[derive(Debug, Clone)]
struct ColumnMap {
    order_id: Option<usize>,
    product: Option<usize>,
    quantity: Option<usize>,
    unit_price: Option<usize>,
    order_timestamp: Option<usize>,
    width: usize,
}

impl ColumnMap {
    fn resolve(headers: &StringRecord) -> Self {
        let header_map = build_header_map(headers);
        let find = |aliases: &[&str]| aliases.iter().find_map(|name| header_map.get(*name).copied());

        Self {
            order_id: find(&ORDER_ID_COLUMNS),
            product: find(&PRODUCT_COLUMNS),
            quantity: find(&QUANTITY_COLUMNS),
            unit_price: find(&PRICE_COLUMNS),
            order_timestamp: find(&DATE_COLUMNS),
            width: headers.len(),
        }
    }

    fn required(&self) -> [(&'static str, Option<usize>); 5] {
        [
            (ORDER_ID_COLUMNS[0], self.order_id),
            (PRODUCT_COLUMNS[0], self.product),
            (QUANTITY_COLUMNS[0], self.quantity),
            (PRICE_COLUMNS[0], self.unit_price),
            (DATE_COLUMNS[0], self.order_timestamp),
        ]
    }

    /// Canonical names of the required columns missing from the header.
    fn absent(&self) -> Vec<&'static str> {
        self.required()
            .into_iter()
            .filter_map(|(name, idx)| idx.is_none().then_some(name))
            .collect()
    }

    fn is_required(&self, idx: usize) -> bool {
        self.required().iter().any(|(_, col)| *col == Some(idx))
    }

    fn extract(&self, record: &StringRecord, source: RowSource) -> RawRecord {
        let other_missing = record.len() < self.width
            || record
                .iter()
                .enumerate()
                .any(|(idx, cell)| !self.is_required(idx) && cell.is_empty());
        let extra = record
            .iter()
            .enumerate()
            .filter(|(idx, _)| !self.is_required(*idx))
            .map(|(_, cell)| cell.trim().to_string())
            .collect();

        RawRecord {
            source: Some(source),
            order_id: cell(record, self.order_id),
            product: cell(record, self.product),
            quantity: cell(record, self.quantity),
            unit_price: cell(record, self.unit_price),
            order_timestamp: cell(record, self.order_timestamp),
            other_missing,
            extra,
        }
    }
}

fn cell(record: &StringRecord, idx: Option<usize>) -> Option<String> {
    record
        .get(idx?)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}
