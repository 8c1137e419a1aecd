//! Synthetic monthly sales exports.
//!
//! Produces twelve `sales_data_<month>_<year>.csv` files in the same layout as
//! the real exports, including the artifacts the cleaner has to deal with:
//! repeated header lines, all-blank rows, and exact duplicate orders.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Normal, Poisson};
use tracing::info;

use crate::error::AppError;
use crate::io::ingest::{MONTH_NAMES, source_file_names};

/// Header of the source exports.
pub const SOURCE_HEADER: [&str; 6] = [
    "Order ID",
    "Product",
    "Quantity Ordered",
    "Price Each",
    "Order Date",
    "Purchase Address",
];

/// Catalog: (product, unit price, relative popularity).
const CATALOG: [(&str, f64, f64); 19] = [
    ("USB-C Charging Cable", 11.95, 22.0),
    ("Lightning Charging Cable", 14.95, 21.0),
    ("AAA Batteries (4-pack)", 2.99, 20.0),
    ("AA Batteries (4-pack)", 3.84, 20.0),
    ("Wired Headphones", 11.99, 19.0),
    ("Apple Airpods Headphones", 150.0, 15.0),
    ("Bose SoundSport Headphones", 99.99, 13.0),
    ("27in FHD Monitor", 149.99, 7.0),
    ("iPhone", 700.0, 7.0),
    ("27in 4K Gaming Monitor", 389.99, 6.0),
    ("34in Ultrawide Monitor", 379.99, 6.0),
    ("Google Phone", 600.0, 5.5),
    ("Flatscreen TV", 300.0, 4.8),
    ("Macbook Pro Laptop", 1700.0, 4.7),
    ("ThinkPad Laptop", 999.99, 4.1),
    ("20in Monitor", 109.99, 4.1),
    ("Vareebadd Phone", 400.0, 2.1),
    ("LG Washing Machine", 600.0, 0.7),
    ("LG Dryer", 600.0, 0.6),
];

/// Items cheap enough to be ordered several at a time.
const MULTI_QUANTITY_MAX_PRICE: f64 = 20.0;

const CITIES: [(&str, &str, &str); 6] = [
    ("San Francisco", "CA", "94016"),
    ("Los Angeles", "CA", "90001"),
    ("New York City", "NY", "10001"),
    ("Boston", "MA", "02215"),
    ("Dallas", "TX", "75001"),
    ("Seattle", "WA", "98101"),
];
const STREETS: [&str; 6] = ["Main St", "Park St", "Lake St", "Hill St", "1st St", "Chestnut St"];

/// Generator settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleOptions {
    pub year: i32,
    pub seed: u64,
    /// Mean orders per day before seasonality.
    pub orders_per_day: f64,
    /// Lognormal day-to-day noise on the order rate.
    pub daily_noise: f64,
    /// Repeated header lines inserted per file.
    pub header_repeats_per_file: usize,
    /// All-blank rows inserted per file.
    pub blank_rows_per_file: usize,
    /// Probability that an order line is written twice.
    pub duplicate_prob: f64,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            year: crate::domain::DEFAULT_YEAR,
            seed: 42,
            orders_per_day: 40.0,
            daily_noise: 0.15,
            header_repeats_per_file: 2,
            blank_rows_per_file: 2,
            duplicate_prob: 0.002,
        }
    }
}

/// One line of a generated export.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleRow {
    Order(OrderLine),
    HeaderRepeat,
    Blank,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub order_id: u64,
    pub product: &'static str,
    pub quantity: u32,
    pub unit_price: f64,
    pub ordered_at: NaiveDateTime,
    pub address: String,
}

impl SampleRow {
    fn to_record(&self) -> [String; 6] {
        match self {
            SampleRow::Order(o) => [
                o.order_id.to_string(),
                o.product.to_string(),
                o.quantity.to_string(),
                format_price(o.unit_price),
                o.ordered_at.format("%m/%d/%y %H:%M").to_string(),
                o.address.clone(),
            ],
            SampleRow::HeaderRepeat => SOURCE_HEADER.map(str::to_string),
            SampleRow::Blank => Default::default(),
        }
    }
}

/// One generated monthly file.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleFile {
    pub name: String,
    pub rows: Vec<SampleRow>,
}

impl SampleFile {
    pub fn order_lines(&self) -> impl Iterator<Item = &OrderLine> {
        self.rows.iter().filter_map(|r| match r {
            SampleRow::Order(o) => Some(o),
            _ => None,
        })
    }

    pub fn count(&self, pred: impl Fn(&SampleRow) -> bool) -> usize {
        self.rows.iter().filter(|r| pred(r)).count()
    }
}

/// Generate all twelve months in memory.
pub fn generate_sample(options: &SampleOptions) -> Result<Vec<SampleFile>, AppError> {
    if !(options.orders_per_day.is_finite() && options.orders_per_day > 0.0) {
        return Err(AppError::input("Orders per day must be > 0."));
    }
    if !(0.0..1.0).contains(&options.duplicate_prob) {
        return Err(AppError::input("Duplicate probability must be in [0, 1)."));
    }

    let mut rng = StdRng::seed_from_u64(options.seed);
    let noise = Normal::new(0.0, options.daily_noise.max(0.0))
        .map_err(|e| AppError::internal(format!("Noise distribution error: {e}")))?;
    let products = WeightedIndex::new(CATALOG.iter().map(|&(_, _, w)| w))
        .map_err(|e| AppError::internal(format!("Product distribution error: {e}")))?;

    let names = source_file_names(options.year);
    let mut next_order_id: u64 = 141_234;
    let mut files = Vec::with_capacity(MONTH_NAMES.len());

    for (month0, name) in names.into_iter().enumerate() {
        let first = NaiveDate::from_ymd_opt(options.year, month0 as u32 + 1, 1)
            .ok_or_else(|| AppError::input(format!("Invalid year {}", options.year)))?;

        let mut rows = Vec::new();
        for date in first.iter_days().take_while(|d| d.month() == first.month()) {
            let rate = options.orders_per_day * seasonality(date) * noise.sample(&mut rng).exp();
            let orders = Poisson::new(rate.max(1e-6))
                .map_err(|e| AppError::internal(format!("Order distribution error: {e}")))?
                .sample(&mut rng) as usize;

            for _ in 0..orders {
                let line = order_line(&mut rng, &products, next_order_id, date);
                next_order_id += 1;
                if rng.gen_bool(options.duplicate_prob) {
                    rows.push(SampleRow::Order(line.clone()));
                }
                rows.push(SampleRow::Order(line));
            }
        }

        // Artifacts land at random positions, never before the first order.
        for _ in 0..options.header_repeats_per_file {
            let at = rng.gen_range(1..=rows.len().max(1)).min(rows.len());
            rows.insert(at, SampleRow::HeaderRepeat);
        }
        for _ in 0..options.blank_rows_per_file {
            let at = rng.gen_range(1..=rows.len().max(1)).min(rows.len());
            rows.insert(at, SampleRow::Blank);
        }

        files.push(SampleFile { name, rows });
    }

    Ok(files)
}

/// Generate and write the twelve files into `dir` (created if needed).
pub fn write_sample_dataset(dir: &Path, options: &SampleOptions) -> Result<Vec<PathBuf>, AppError> {
    let files = generate_sample(options)?;
    fs::create_dir_all(dir)
        .map_err(|e| AppError::input(format!("Failed to create output directory '{}': {e}", dir.display())))?;

    let mut written = Vec::with_capacity(files.len());
    for file in &files {
        let path = dir.join(&file.name);
        write_sample_file(&path, file)?;
        info!(file = %file.name, rows = file.rows.len(), "wrote sample file");
        written.push(path);
    }
    Ok(written)
}

fn write_sample_file(path: &Path, file: &SampleFile) -> Result<(), AppError> {
    let err = |e: csv::Error| AppError::input(format!("Failed to write sample CSV '{}': {e}", path.display()));

    let mut writer = csv::Writer::from_path(path).map_err(err)?;
    writer.write_record(SOURCE_HEADER).map_err(err)?;
    for row in &file.rows {
        writer.write_record(row.to_record()).map_err(err)?;
    }
    writer
        .flush()
        .map_err(|e| AppError::input(format!("Failed to write sample CSV '{}': {e}", path.display())))
}

/// Relative order rate: a December peak and busier weekends.
fn seasonality(date: NaiveDate) -> f64 {
    let month = match date.month() {
        12 => 1.6,
        11 | 10 => 1.2,
        4 | 5 => 1.1,
        1 | 2 => 0.8,
        _ => 1.0,
    };
    let weekday = match date.weekday() {
        chrono::Weekday::Sat | chrono::Weekday::Sun => 1.1,
        _ => 1.0,
    };
    month * weekday
}

fn order_line(rng: &mut StdRng, products: &WeightedIndex<f64>, order_id: u64, date: NaiveDate) -> OrderLine {
    let (product, unit_price, _) = CATALOG[products.sample(rng)];
    let quantity = if unit_price < MULTI_QUANTITY_MAX_PRICE && rng.gen_bool(0.15) {
        rng.gen_range(2..=4)
    } else {
        1
    };

    let secs: i64 = rng.gen_range(0..24 * 60) * 60;
    let ordered_at = date
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight + chrono::Duration::seconds(secs))
        .unwrap_or_default();

    let (city, state, zip) = CITIES[rng.gen_range(0..CITIES.len())];
    let street = STREETS[rng.gen_range(0..STREETS.len())];
    let address = format!("{} {street}, {city}, {state} {zip}", rng.gen_range(1..1000));

    OrderLine {
        order_id,
        product,
        quantity,
        unit_price,
        ordered_at,
        address,
    }
}

/// Prices as they appear in the exports: `150` rather than `150.0`.
fn format_price(p: f64) -> String {
    if p.fract() == 0.0 {
        format!("{p:.0}")
    } else {
        format!("{p}")
    }
}
