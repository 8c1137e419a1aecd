//! Ratatui-based terminal dashboard.
//!
//! Three tabs over one loaded dataset:
//! 1. data analysis (monthly table + chart, products, load stats)
//! 2. revenue forecast
//! 3. transaction forecast
//!
//! Forecasts are fitted the first time their tab is opened and kept for the
//! rest of the session. A failed fit is shown inside its tab only.

use std::collections::HashMap;
use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap},
};
use tracing::debug;

use crate::app::pipeline::{self, PipelineOutput};
use crate::domain::{DailyPoint, ForecastResult, MonthlySummary, PipelineConfig, ProductSummary, SeriesKind};
use crate::error::{AppError, ForecastError};
use crate::report::{fmt_money, fmt_vec, truncate};

mod plotters_chart;

use plotters_chart::{SeriesPlottersChart, chart_bounds, date_x, x_date};

/// Width of the revenue bar column in the product table.
const BAR_WIDTH: usize = 16;

/// Load the data, then run the dashboard until the user quits.
pub fn run(config: PipelineConfig) -> Result<(), AppError> {
    let output = pipeline::prepare(&config)?;

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::internal(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(config, output);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::internal(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::internal(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Analysis,
    Revenue,
    Transactions,
}

impl Tab {
    const ALL: [Tab; 3] = [Tab::Analysis, Tab::Revenue, Tab::Transactions];

    fn title(self) -> &'static str {
        match self {
            Tab::Analysis => "1 Data Analysis",
            Tab::Revenue => "2 Revenue Forecast",
            Tab::Transactions => "3 Transaction Forecast",
        }
    }

    fn index(self) -> usize {
        match self {
            Tab::Analysis => 0,
            Tab::Revenue => 1,
            Tab::Transactions => 2,
        }
    }

    fn next(self) -> Self {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    fn prev(self) -> Self {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }

    fn series(self) -> Option<SeriesKind> {
        match self {
            Tab::Analysis => None,
            Tab::Revenue => Some(SeriesKind::Revenue),
            Tab::Transactions => Some(SeriesKind::Transactions),
        }
    }
}

/// Per-series forecast memo. Failures are memoized too.
#[derive(Debug, Default)]
struct ForecastCache {
    entries: HashMap<SeriesKind, Result<ForecastResult, ForecastError>>,
}

impl ForecastCache {
    fn get(&self, kind: SeriesKind) -> Option<&Result<ForecastResult, ForecastError>> {
        self.entries.get(&kind)
    }

    fn get_or_compute(
        &mut self,
        kind: SeriesKind,
        compute: impl FnOnce() -> Result<ForecastResult, ForecastError>,
    ) -> &Result<ForecastResult, ForecastError> {
        self.entries.entry(kind).or_insert_with(compute)
    }
}

/// Messages for the key actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Quit,
    Select(Tab),
    Scroll(isize),
    None,
}

fn action_for(code: KeyCode, current: Tab) -> Action {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('1') => Action::Select(Tab::Analysis),
        KeyCode::Char('2') => Action::Select(Tab::Revenue),
        KeyCode::Char('3') => Action::Select(Tab::Transactions),
        KeyCode::Tab | KeyCode::Right => Action::Select(current.next()),
        KeyCode::BackTab | KeyCode::Left => Action::Select(current.prev()),
        KeyCode::Down => Action::Scroll(1),
        KeyCode::Up => Action::Scroll(-1),
        KeyCode::PageDown => Action::Scroll(10),
        KeyCode::PageUp => Action::Scroll(-10),
        _ => Action::None,
    }
}

struct App {
    config: PipelineConfig,
    output: Option<PipelineOutput>,
    tab: Tab,
    scroll: [usize; 3],
    forecasts: ForecastCache,
    /// Set when the selected tab still needs its fit; resolved after a redraw.
    pending_fit: bool,
    status: String,
}

impl App {
    fn new(config: PipelineConfig, output: Option<PipelineOutput>) -> Self {
        let status = match &output {
            Some(o) => format!("{} rows loaded", o.loaded.stats.rows_kept),
            None => "No data".to_string(),
        };
        Self {
            config,
            output,
            tab: Tab::Analysis,
            scroll: [0; 3],
            forecasts: ForecastCache::default(),
            pending_fit: false,
            status,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::internal(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            // The "fitting" frame is on screen; now do the blocking work.
            if self.pending_fit {
                self.resolve_forecast();
                needs_redraw = true;
                continue;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::internal(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::internal(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match action_for(code, self.tab) {
            Action::Quit => return true,
            Action::Select(tab) => self.select(tab),
            Action::Scroll(delta) => {
                let slot = &mut self.scroll[self.tab.index()];
                *slot = slot.saturating_add_signed(delta);
            }
            Action::None => {}
        }
        false
    }

    fn select(&mut self, tab: Tab) {
        if self.output.is_none() {
            return;
        }
        self.tab = tab;
        if let Some(kind) = tab.series() {
            if self.forecasts.get(kind).is_none() {
                self.pending_fit = true;
                self.status = format!("Fitting ARIMA{} on {}...", self.config.order, kind.display_name());
            }
        }
    }

    fn resolve_forecast(&mut self) {
        self.pending_fit = false;
        let (Some(output), Some(kind)) = (&self.output, self.tab.series()) else {
            return;
        };
        debug!(series = kind.display_name(), "fitting forecast for tab");
        let result = self.forecasts.get_or_compute(kind, || output.forecast(kind));
        self.status = match result {
            Ok(_) => format!("{} forecast ready", kind.display_name()),
            Err(err) => format!("{} forecast failed: {err}", kind.display_name()),
        };
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        match &self.output {
            None => self.draw_no_data(frame, chunks[1]),
            Some(output) => match self.tab.series() {
                None => self.draw_analysis(frame, chunks[1], output),
                Some(kind) => self.draw_forecast_tab(frame, chunks[1], output, kind),
            },
        }
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let titles: Vec<Line> = Tab::ALL.iter().map(|t| Line::from(t.title())).collect();
        let tabs = Tabs::new(titles)
            .select(self.tab.index())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(Span::styled(" sf | retail sales ", Style::default().fg(Color::Cyan))),
            )
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White).add_modifier(Modifier::BOLD));
        frame.render_widget(tabs, area);
    }

    fn draw_no_data(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let lines = vec![
            Line::from(Span::styled(
                "Failed to load data",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(format!(
                "No usable rows in sales_data_<month>_{}.csv under '{}'.",
                self.config.year,
                self.config.data_dir.display()
            )),
            Line::from("Set --data-dir or SALES_DATA_DIR, or create a demo set with `sf generate --out DIR`."),
        ];
        let p = Paragraph::new(Text::from(lines))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_analysis(&self, frame: &mut ratatui::Frame<'_>, area: Rect, output: &PipelineOutput) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(area);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(16), Constraint::Min(0)])
            .split(columns[0]);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(7)])
            .split(columns[1]);

        let aggregates = output.aggregates();
        draw_monthly_table(frame, left[0], &aggregates.monthly);
        draw_monthly_chart(frame, left[1], &aggregates.monthly);
        draw_product_table(frame, right[0], &aggregates.products, self.scroll[0]);
        self.draw_load_stats(frame, right[1], output);
    }

    fn draw_load_stats(&self, frame: &mut ratatui::Frame<'_>, area: Rect, output: &PipelineOutput) {
        let stats = &output.loaded.stats;
        let daily = &output.aggregates().daily;
        let span = match (daily.first_date(), daily.last_date()) {
            (Some(a), Some(b)) => format!("{a} .. {b} ({} days)", daily.len()),
            _ => "-".to_string(),
        };
        let rejected: Vec<String> = stats
            .rejected
            .iter()
            .map(|(reason, n)| format!("{}={n}", reason.label()))
            .collect();

        let lines = vec![
            Line::from(format!(
                "files: {} found, {} missing",
                stats.files_found.len(),
                stats.files_missing.len()
            )),
            Line::from(format!(
                "rows: read {} | kept {} | rejected {}",
                stats.rows_read,
                stats.rows_kept,
                stats.rejected_total()
            )),
            Line::from(Span::styled(rejected.join("  "), Style::default().fg(Color::Gray))),
            Line::from(format!("daily series: {span}")),
            Line::from(format!("total revenue: {}", fmt_money(output.loaded.dataset.total_revenue()))),
        ];
        let p = Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Load").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_forecast_tab(
        &self,
        frame: &mut ratatui::Frame<'_>,
        area: Rect,
        output: &PipelineOutput,
        kind: SeriesKind,
    ) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(36)])
            .split(area);

        let title = format!(
            "{} | last {} days + {}-day forecast",
            kind.display_name(),
            self.config.history_tail,
            self.config.horizon
        );
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(columns[0]);
        frame.render_widget(block, columns[0]);
        frame.render_widget(Clear, inner);

        match self.forecasts.get(kind) {
            None => {
                let msg = Paragraph::new("Fitting model...").style(Style::default().fg(Color::Yellow));
                frame.render_widget(msg, inner);
            }
            Some(Err(err)) => {
                let msg = Paragraph::new(format!("Forecast failed: {err}"))
                    .wrap(Wrap { trim: true })
                    .style(Style::default().fg(Color::Red));
                frame.render_widget(msg, inner);
            }
            Some(Ok(result)) => {
                draw_forecast_chart(frame, inner, output.history_tail(), result);
                let side = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(9)])
                    .split(columns[1]);
                draw_forecast_table(frame, side[0], result, self.scroll[self.tab.index()]);
                draw_diagnostics(frame, side[1], result);
                return;
            }
        }

        let empty = Block::default().title("Forecast").borders(Borders::ALL);
        frame.render_widget(empty, columns[1]);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "1/2/3 or Tab/←/→ switch  ↑/↓ scroll  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn header_row(cells: &[&str]) -> Row<'static> {
    Row::new(cells.iter().map(|c| Cell::from(c.to_string())).collect::<Vec<_>>())
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
}

fn draw_monthly_table(frame: &mut ratatui::Frame<'_>, area: Rect, monthly: &[MonthlySummary]) {
    let rows: Vec<Row> = monthly
        .iter()
        .map(|m| {
            Row::new(vec![
                Cell::from(m.month.format("%Y-%m").to_string()),
                Cell::from(format!("{:>8}", m.order_count)),
                Cell::from(format!("{:>14}", fmt_money(m.total_revenue))),
            ])
        })
        .collect();

    let table = Table::new(rows, [Constraint::Length(8), Constraint::Length(9), Constraint::Min(14)])
        .header(header_row(&["month", "  orders", "       revenue"]))
        .block(Block::default().title("Monthly").borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn draw_monthly_chart(frame: &mut ratatui::Frame<'_>, area: Rect, monthly: &[MonthlySummary]) {
    let block = Block::default().title("Monthly revenue").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Clear, inner);

    let points = monthly_points(monthly);
    let (x_bounds, y_bounds) = chart_bounds(&[&points]);
    let widget = SeriesPlottersChart {
        history: &points,
        forecast: &[],
        x_bounds,
        y_bounds,
        x_label: "month",
        y_label: "revenue".to_string(),
        fmt_x: fmt_axis_month,
        fmt_y: fmt_axis_compact,
    };
    frame.render_widget(widget, inner);
}

fn draw_product_table(frame: &mut ratatui::Frame<'_>, area: Rect, products: &[ProductSummary], scroll: usize) {
    let sorted = products_by_revenue(products);
    let max = sorted.first().map_or(0.0, |p| p.revenue_sum);
    let offset = scroll.min(sorted.len().saturating_sub(1));

    let rows: Vec<Row> = sorted
        .iter()
        .skip(offset)
        .map(|p| {
            Row::new(vec![
                Cell::from(truncate(&p.product, 26)),
                Cell::from(format!("{:>13}", fmt_money(p.revenue_sum))),
                Cell::from(format!("{:>7}", p.quantity_sum)),
                Cell::from(Span::styled(
                    revenue_bar(p.revenue_sum, max, BAR_WIDTH),
                    Style::default().fg(Color::Green),
                )),
            ])
        })
        .collect();

    let table = Table::new(rows, [
        Constraint::Length(26),
        Constraint::Length(14),
        Constraint::Length(8),
        Constraint::Min(BAR_WIDTH as u16),
    ])
    .header(header_row(&["product", "      revenue", "    qty", ""]))
    .block(
        Block::default()
            .title(format!("Products by revenue ({})", sorted.len()))
            .borders(Borders::ALL),
    );
    frame.render_widget(table, area);
}

fn draw_forecast_chart(frame: &mut ratatui::Frame<'_>, area: Rect, history: &[DailyPoint], result: &ForecastResult) {
    let history_points = history_points(history, result.kind);
    let forecast_points = forecast_points(result);
    let (x_bounds, y_bounds) = chart_bounds(&[&history_points, &forecast_points]);

    let widget = SeriesPlottersChart {
        history: &history_points,
        forecast: &forecast_points,
        x_bounds,
        y_bounds,
        x_label: "date",
        y_label: result.kind.column_name().to_string(),
        fmt_x: fmt_axis_day,
        fmt_y: fmt_axis_compact,
    };
    frame.render_widget(widget, area);
}

fn draw_forecast_table(frame: &mut ratatui::Frame<'_>, area: Rect, result: &ForecastResult, scroll: usize) {
    let offset = scroll.min(result.points.len().saturating_sub(1));
    let rows: Vec<Row> = result
        .points
        .iter()
        .skip(offset)
        .map(|p| {
            let value = if result.kind.is_count() {
                format!("{:>14.0}", p.value)
            } else {
                format!("{:>14}", fmt_money(p.value))
            };
            Row::new(vec![Cell::from(p.date.to_string()), Cell::from(value)])
        })
        .collect();

    let table = Table::new(rows, [Constraint::Length(10), Constraint::Min(14)])
        .header(header_row(&["date", "      forecast"]))
        .block(Block::default().title("Forecast").borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn draw_diagnostics(frame: &mut ratatui::Frame<'_>, area: Rect, result: &ForecastResult) {
    let fit = &result.fit;
    let lines = vec![
        Line::from(format!("ARIMA{} on ln(series)", fit.order)),
        Line::from(format!("ar {}", fmt_vec(&fit.ar))),
        Line::from(format!("ma {}", fmt_vec(&fit.ma))),
        Line::from(format!("sigma2 {:.5}", fit.sigma2)),
        Line::from(format!("n={} iters={}", fit.n_obs, fit.iterations)),
        Line::from(Span::styled(
            format!("zero days -> 1: {}", fit.zero_substitutions),
            Style::default().fg(Color::Gray),
        )),
    ];
    let p = Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: true })
        .block(Block::default().title("Model").borders(Borders::ALL));
    frame.render_widget(p, area);
}

fn monthly_points(monthly: &[MonthlySummary]) -> Vec<(f64, f64)> {
    monthly.iter().map(|m| (date_x(m.month), m.total_revenue)).collect()
}

fn history_points(history: &[DailyPoint], kind: SeriesKind) -> Vec<(f64, f64)> {
    history.iter().map(|p| (date_x(p.date), p.value(kind))).collect()
}

fn forecast_points(result: &ForecastResult) -> Vec<(f64, f64)> {
    result.points.iter().map(|p| (date_x(p.date), p.value)).collect()
}

fn products_by_revenue(products: &[ProductSummary]) -> Vec<ProductSummary> {
    let mut sorted = products.to_vec();
    crate::aggregate::sort_by_revenue_desc(&mut sorted);
    sorted
}

/// Horizontal bar proportional to `value / max`.
fn revenue_bar(value: f64, max: f64, width: usize) -> String {
    if !(max > 0.0) || !value.is_finite() {
        return String::new();
    }
    let cells = ((value / max).clamp(0.0, 1.0) * width as f64).round() as usize;
    "█".repeat(cells)
}

fn fmt_axis_month(v: f64) -> String {
    x_date(v).map(|d| d.format("%b").to_string()).unwrap_or_default()
}

fn fmt_axis_day(v: f64) -> String {
    x_date(v).map(|d| d.format("%m-%d").to_string()).unwrap_or_default()
}

/// Compact tick label: `950`, `12.5k`, `1.2M`.
fn fmt_axis_compact(v: f64) -> String {
    let a = v.abs();
    if a >= 1e6 {
        format!("{:.1}M", v / 1e6)
    } else if a >= 1e3 {
        format!("{:.1}k", v / 1e3)
    } else {
        format!("{v:.0}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArimaOrder, FitSummary, ForecastPoint};
    use chrono::NaiveDate;
    use std::cell::Cell as Counter;

    fn result(kind: SeriesKind) -> ForecastResult {
        ForecastResult {
            kind,
            last_observed: NaiveDate::from_ymd_opt(2019, 12, 31).unwrap(),
            points: vec![ForecastPoint {
                date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                value: 42.0,
            }],
            fit: FitSummary {
                order: ArimaOrder::default(),
                ar: vec![0.1],
                ma: vec![-0.5],
                mean: 0.0,
                css: 1.0,
                sigma2: 0.01,
                n_obs: 364,
                iterations: 50,
                zero_substitutions: 0,
            },
        }
    }

    #[test]
    fn tab_cycling_wraps() {
        assert_eq!(Tab::Analysis.next(), Tab::Revenue);
        assert_eq!(Tab::Transactions.next(), Tab::Analysis);
        assert_eq!(Tab::Analysis.prev(), Tab::Transactions);
        assert_eq!(Tab::Revenue.series(), Some(SeriesKind::Revenue));
        assert_eq!(Tab::Analysis.series(), None);
    }

    #[test]
    fn keys_map_to_actions() {
        assert_eq!(action_for(KeyCode::Char('q'), Tab::Analysis), Action::Quit);
        assert_eq!(action_for(KeyCode::Char('3'), Tab::Analysis), Action::Select(Tab::Transactions));
        assert_eq!(action_for(KeyCode::BackTab, Tab::Revenue), Action::Select(Tab::Analysis));
        assert_eq!(action_for(KeyCode::Right, Tab::Revenue), Action::Select(Tab::Transactions));
        assert_eq!(action_for(KeyCode::Up, Tab::Revenue), Action::Scroll(-1));
        assert_eq!(action_for(KeyCode::Char('x'), Tab::Revenue), Action::None);
    }

    #[test]
    fn forecasts_are_computed_once_per_series() {
        let calls = Counter::new(0);
        let mut cache = ForecastCache::default();
        for _ in 0..3 {
            let r = cache.get_or_compute(SeriesKind::Revenue, || {
                calls.set(calls.get() + 1);
                Ok(result(SeriesKind::Revenue))
            });
            assert!(r.is_ok());
        }
        assert_eq!(calls.get(), 1);

        let err = cache.get_or_compute(SeriesKind::Transactions, || {
            calls.set(calls.get() + 1);
            Err(ForecastError::NotConverged { iterations: 2000 })
        });
        assert!(err.is_err());
        // A failed series stays failed; the other is untouched.
        assert!(cache.get(SeriesKind::Revenue).is_some_and(|r| r.is_ok()));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn tabs_stay_on_failure_screen_without_data() {
        let mut app = App::new(PipelineConfig::default(), None);
        app.select(Tab::Revenue);
        assert_eq!(app.tab, Tab::Analysis);
        assert!(!app.pending_fit);
    }

    #[test]
    fn scroll_never_underflows() {
        let mut app = App::new(PipelineConfig::default(), None);
        assert!(!app.handle_key(KeyCode::Up));
        assert_eq!(app.scroll[0], 0);
        assert!(!app.handle_key(KeyCode::Down));
        assert_eq!(app.scroll[0], 1);
        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn revenue_bar_scales_to_max() {
        assert_eq!(revenue_bar(50.0, 100.0, 10).chars().count(), 5);
        assert_eq!(revenue_bar(100.0, 100.0, 10).chars().count(), 10);
        assert_eq!(revenue_bar(1.0, 0.0, 10), "");
    }

    #[test]
    fn axis_labels() {
        assert_eq!(fmt_axis_compact(950.0), "950");
        assert_eq!(fmt_axis_compact(12_500.0), "12.5k");
        assert_eq!(fmt_axis_compact(1_300_000.0), "1.3M");
        let jan = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
        assert_eq!(fmt_axis_month(date_x(jan)), "Jan");
        assert_eq!(fmt_axis_day(date_x(jan)), "01-01");
    }

    #[test]
    fn products_sorted_for_display() {
        let p = |name: &str, rev: f64| ProductSummary {
            product: name.to_string(),
            order_count: 1,
            revenue_sum: rev,
            revenue_mean: rev,
            quantity_sum: 1,
            quantity_mean: 1.0,
        };
        let sorted = products_by_revenue(&[p("a", 1.0), p("b", 3.0), p("c", 2.0)]);
        let names: Vec<&str> = sorted.iter().map(|p| p.product.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
    }
}
