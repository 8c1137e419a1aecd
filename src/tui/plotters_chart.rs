//! Plotters-powered time-series chart widget for Ratatui.
//!
//! Plotters output is rendered into the Ratatui buffer with
//! `plotters-ratatui-backend`.

use chrono::NaiveDate;
use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// A lightweight, render-only chart description.
///
/// All series and bounds are computed outside the render call; x values are
/// days since the common era (`NaiveDate::num_days_from_ce`).
pub struct SeriesPlottersChart<'a> {
    /// Observed values (line).
    pub history: &'a [(f64, f64)],
    /// Forecast values (line, drawn on top). May be empty.
    pub forecast: &'a [(f64, f64)],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    /// Axis labels (kept simple for terminal rendering).
    pub x_label: &'a str,
    pub y_label: String,
    /// Formatting of tick labels.
    pub fmt_x: fn(f64) -> String,
    pub fmt_y: fn(f64) -> String,
}

impl<'a> Widget for SeriesPlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        // In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let x0 = self.x_bounds[0];
        let x1 = self.x_bounds[1];
        let y0 = self.y_bounds[0];
        let y1 = self.y_bounds[1];

        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 10)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(&self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let history_color = RGBColor(0, 255, 255); // cyan
            let forecast_color = RGBColor(255, 215, 0); // gold

            chart.draw_series(LineSeries::new(self.history.iter().copied(), &history_color))?;

            if !self.forecast.is_empty() {
                // Join the forecast to the last observation so the lines connect.
                let bridge = self.history.last().copied();
                chart.draw_series(LineSeries::new(
                    bridge.into_iter().chain(self.forecast.iter().copied()),
                    &forecast_color,
                ))?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// X coordinate of a date.
pub fn date_x(date: NaiveDate) -> f64 {
    f64::from(chrono::Datelike::num_days_from_ce(&date))
}

/// Inverse of `date_x` (rounded to the nearest day).
pub fn x_date(x: f64) -> Option<NaiveDate> {
    if !x.is_finite() || x.abs() > f64::from(i32::MAX) {
        return None;
    }
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
}

/// Bounds covering every series, with 5% vertical padding.
///
/// Degenerate inputs fall back to a unit box so the widget can still draw axes.
pub fn chart_bounds(series: &[&[(f64, f64)]]) -> ([f64; 2], [f64; 2]) {
    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in series.iter().flat_map(|s| s.iter()) {
        if x.is_finite() && y.is_finite() {
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
    }

    if !x_min.is_finite() || !x_max.is_finite() {
        return ([0.0, 1.0], [0.0, 1.0]);
    }
    if x_max <= x_min {
        x_max = x_min + 1.0;
    }
    if y_max <= y_min {
        y_min -= 1.0;
        y_max += 1.0;
    }

    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);
    ([x_min, x_max], [y_min - pad, y_max + pad])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_round_trip() {
        let d = NaiveDate::from_ymd_opt(2019, 12, 31).unwrap();
        assert_eq!(x_date(date_x(d)), Some(d));
        assert_eq!(x_date(f64::NAN), None);
    }

    #[test]
    fn bounds_cover_all_series() {
        let a = [(1.0, 10.0), (2.0, 20.0)];
        let b = [(3.0, 5.0)];
        let (x, y) = chart_bounds(&[&a, &b]);
        assert_eq!(x, [1.0, 3.0]);
        assert!(y[0] < 5.0 && y[1] > 20.0);
    }

    #[test]
    fn degenerate_bounds_are_widened() {
        let (x, y) = chart_bounds(&[]);
        assert_eq!((x, y), ([0.0, 1.0], [0.0, 1.0]));

        let flat = [(5.0, 100.0)];
        let (x, y) = chart_bounds(&[&flat]);
        assert_eq!(x, [5.0, 6.0]);
        assert!(y[0] < 100.0 && y[1] > 100.0);
    }
}
