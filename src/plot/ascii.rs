//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed history: `-` line
//! - forecast: `*` line
//! - forecast start: `|` column

use chrono::NaiveDate;

use crate::domain::{DailyPoint, ForecastResult};

/// Render the history tail followed by its forecast.
pub fn render_forecast_plot(
    history: &[DailyPoint],
    forecast: &ForecastResult,
    width: usize,
    height: usize,
) -> String {
    let kind = forecast.kind;
    let observed: Vec<(NaiveDate, f64)> = history.iter().map(|p| (p.date, p.value(kind))).collect();
    let predicted: Vec<(NaiveDate, f64)> = forecast.points.iter().map(|p| (p.date, p.value)).collect();
    render_plot(kind.display_name(), &observed, &predicted, width, height)
}

fn render_plot(
    title: &str,
    observed: &[(NaiveDate, f64)],
    predicted: &[(NaiveDate, f64)],
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let Some((d_min, d_max)) = date_range(observed.iter().chain(predicted)) else {
        return format!("Plot: {title} (no data)\n");
    };
    let (y_min, y_max) = y_range(observed.iter().chain(predicted)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let x_of = |d: NaiveDate| (d - d_min).num_days() as f64;
    let x_max = x_of(d_max).max(1.0);

    let mut grid = vec![vec![' '; width]; height];

    if let Some(&(first, _)) = predicted.first() {
        let x = map_x(x_of(first), 0.0, x_max, width);
        for row in grid.iter_mut() {
            row[x] = '|';
        }
    }

    let to_cells = |series: &[(NaiveDate, f64)]| -> Vec<(usize, usize)> {
        series
            .iter()
            .map(|&(d, y)| (map_x(x_of(d), 0.0, x_max, width), map_y(y, y_min, y_max, height)))
            .collect()
    };
    draw_series(&mut grid, &to_cells(observed), '-');
    draw_series(&mut grid, &to_cells(predicted), '*');

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {title} | date=[{d_min}, {d_max}] | y=[{y_min:.2}, {y_max:.2}]\n"
    ));

    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }

    out
}

fn date_range<'a>(points: impl Iterator<Item = &'a (NaiveDate, f64)>) -> Option<(NaiveDate, NaiveDate)> {
    points.fold(None, |acc, &(d, _)| match acc {
        None => Some((d, d)),
        Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
    })
}

fn y_range<'a>(points: impl Iterator<Item = &'a (NaiveDate, f64)>) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &(_, y) in points {
        if y.is_finite() {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else if min_y.is_finite() {
        // Flat series: center it.
        Some((min_y - 1.0, max_y + 1.0))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_series(grid: &mut [Vec<char>], cells: &[(usize, usize)], ch: char) {
    let mut prev: Option<(usize, usize)> = None;
    for &(x, y) in cells {
        match prev {
            Some((x0, y0)) => draw_line(grid, x0, y0, x, y, ch),
            None => grid[y][x] = ch,
        }
        prev = Some((x, y));
    }
}

/// Integer line drawing (Bresenham-ish). Later series overwrite earlier ones.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0 && (y0 as usize) < grid.len() && x0 >= 0 && (x0 as usize) < grid[0].len() {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArimaOrder, FitSummary, ForecastPoint, SeriesKind};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, 12, d).unwrap()
    }

    fn forecast(points: Vec<ForecastPoint>) -> ForecastResult {
        ForecastResult {
            kind: SeriesKind::Revenue,
            last_observed: day(5),
            points,
            fit: FitSummary {
                order: ArimaOrder::default(),
                ar: vec![0.0],
                ma: vec![0.0],
                mean: 0.0,
                css: 0.0,
                sigma2: 0.0,
                n_obs: 0,
                iterations: 0,
                zero_substitutions: 0,
            },
        }
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let history: Vec<DailyPoint> = (1..=5)
            .map(|d| DailyPoint {
                date: day(d),
                total_revenue: 100.0,
                total_transactions: 1,
                order_count: 1,
            })
            .collect();
        let f = forecast(
            (6..=10)
                .map(|d| ForecastPoint {
                    date: day(d),
                    value: 110.0,
                })
                .collect(),
        );

        let txt = render_forecast_plot(&history, &f, 10, 5);
        let expected = concat!(
            "Plot: Revenue | date=[2019-12-01, 2019-12-10] | y=[99.50, 110.50]\n",
            "     *****\n",
            "     |\n",
            "     |\n",
            "     |\n",
            "-----|\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn empty_inputs_do_not_panic() {
        let txt = render_forecast_plot(&[], &forecast(Vec::new()), 10, 5);
        assert_eq!(txt, "Plot: Revenue (no data)\n");
    }
}
