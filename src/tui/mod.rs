//! Ratatui-based terminal UI.
//!
//! The dashboard shows the reconciled Nino3.4 series for a selectable year
//! range: a temperature line chart, an anomaly bar chart with ±threshold
//! lines, a settings panel for the Start/End year, and a static notes panel.
//!
//! All view state lives in a `DashboardConfig` owned by `App` and is passed
//! into the render helpers.

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
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use tracing::warn;

use crate::app::pipeline::{self, RunOutput};
use crate::data::SourceConfig;
use crate::domain::{DashboardConfig, EnsoPhase, ReconcileConfig, YearRange, decimal_year};
use crate::error::AppError;
use crate::report::RangeView;
use crate::series::overall_bounds;

mod plotters_chart;

use plotters_chart::{EnsoChart, threshold_lines};

const FIELD_START: usize = 0;
const FIELD_END: usize = 1;

/// Fetch once, then start the TUI.
///
/// The first fetch happens before the terminal switches to raw mode so a
/// network or parse failure is reported like any other CLI error.
pub fn run(sources: SourceConfig, config: ReconcileConfig, dashboard: DashboardConfig) -> Result<(), AppError> {
    let run = pipeline::reconcile(&sources, &config)?;

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(sources, config, dashboard, run);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
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

struct App {
    sources: SourceConfig,
    config: ReconcileConfig,
    dashboard: DashboardConfig,
    selected_field: usize,
    status: String,
    run: RunOutput,
}

impl App {
    fn new(sources: SourceConfig, config: ReconcileConfig, dashboard: DashboardConfig, run: RunOutput) -> Self {
        let status = format!(
            "Loaded {} anomaly months ({} with temperature).",
            run.data.anomaly.len(),
            run.data.combined.len()
        );
        Self {
            sources,
            config,
            dashboard,
            selected_field: FIELD_START,
            status,
            run,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
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

    /// Returns `true` when the app should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => self.selected_field = FIELD_START,
            KeyCode::Down => self.selected_field = FIELD_END,
            KeyCode::Left => self.adjust_range(-1),
            KeyCode::Right => self.adjust_range(1),
            KeyCode::PageDown => self.adjust_range(-10),
            KeyCode::PageUp => self.adjust_range(10),
            KeyCode::Char('r') => self.refetch(),
            KeyCode::Char('d') => {
                self.status = match crate::debug::write_debug_bundle(&self.run, &self.dashboard) {
                    Ok(path) => format!("Wrote debug bundle: {}", path.display()),
                    Err(err) => format!("Debug write failed: {err}"),
                };
            }
            _ => {}
        }
        false
    }

    fn adjust_range(&mut self, delta: i32) {
        let Some(bounds) = overall_bounds(&self.run.data.anomaly, &self.run.data.combined) else {
            self.status = "No data to filter.".to_string();
            return;
        };
        let current = self.dashboard.range.map_or(bounds, |r| r.clamp_to(bounds));
        let next = step_range(current, bounds, self.selected_field, delta);
        self.dashboard.range = Some(next);
        self.status = format!("years: {next}");
    }

    /// Re-download both sources; on failure the previous data stays on screen.
    fn refetch(&mut self) {
        match pipeline::reconcile(&self.sources, &self.config) {
            Ok(run) => {
                self.status = format!("Refetched: {} anomaly months.", run.data.anomaly.len());
                self.run = run;
            }
            Err(err) => {
                warn!(error = %err, "refetch failed");
                self.status = format!("Refetch failed: {err}");
            }
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        let view = RangeView::new(&self.run.data, &self.dashboard);
        self.draw_header(frame, chunks[0], view.as_ref());
        self.draw_body(frame, chunks[1], view.as_ref());
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect, view: Option<&RangeView<'_>>) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("enso", Style::default().fg(Color::Cyan)),
            Span::raw(" - Nino3.4 SST anomaly dashboard"),
        ]));

        let range = view.map(|v| v.range.to_string()).unwrap_or_else(|| "-".to_string());
        lines.push(Line::from(Span::styled(
            format!(
                "years: {range} | cutoff: {} | anomaly n={} | combined n={} | threshold ±{:.1}",
                self.config.cutoff_year,
                self.run.data.anomaly.len(),
                self.run.data.combined.len(),
                self.dashboard.threshold,
            ),
            Style::default().fg(Color::Gray),
        )));

        if let Some((row, phase)) = view.and_then(|v| v.latest(self.dashboard.threshold)) {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("latest: {} {:+.2}°C ", row.date.format("%Y-%m"), row.anom),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(
                    phase.display_name(),
                    Style::default().fg(phase_color(phase)).add_modifier(Modifier::BOLD),
                ),
            ]));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect, view: Option<&RangeView<'_>>) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(36)])
            .split(area);
        let charts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(columns[0]);
        let side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0)])
            .split(columns[1]);

        self.draw_temperature(frame, charts[0], view);
        self.draw_anomaly(frame, charts[1], view);
        self.draw_settings(frame, side[0], view);
        draw_notes(frame, side[1], &self.config, &self.dashboard);
    }

    fn draw_temperature(&self, frame: &mut ratatui::Frame<'_>, area: Rect, view: Option<&RangeView<'_>>) {
        let block = Block::default().title("Nino3.4 temperature (°C)").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(view) = view.filter(|v| !v.combined.is_empty()) else {
            draw_waiting(frame, inner, "No operational temperatures in this range.");
            return;
        };

        let line = temperature_points(view);
        let x_bounds = x_bounds(view.range);
        let y_bounds = value_bounds(line.iter().map(|p| p.1));

        let (chart_rect, insets) = chart_layout(inner);
        let widget = EnsoChart {
            line: &line,
            bars: &[],
            reference_lines: &[],
            x_bounds,
            y_bounds,
            x_label: "year",
            y_label: "°C",
            fmt_x: fmt_axis_year,
            fmt_y: fmt_axis_value,
        };
        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, x_bounds, y_bounds, ("year", "°C"));
        }
    }

    fn draw_anomaly(&self, frame: &mut ratatui::Frame<'_>, area: Rect, view: Option<&RangeView<'_>>) {
        let block = Block::default().title("Nino3.4 anomaly (°C)").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(view) = view.filter(|v| !v.anomaly.is_empty()) else {
            draw_waiting(frame, inner, "No anomalies in this range.");
            return;
        };

        let threshold = self.dashboard.threshold;
        let bars = anomaly_bars(view, threshold);
        let references = threshold_lines(threshold);
        let x_bounds = x_bounds(view.range);
        let y_bounds = value_bounds(bars.iter().map(|b| b.1).chain(references.iter().map(|r| r.0)));

        let (chart_rect, insets) = chart_layout(inner);
        let widget = EnsoChart {
            line: &[],
            bars: &bars,
            reference_lines: &references,
            x_bounds,
            y_bounds,
            x_label: "year",
            y_label: "anom °C",
            fmt_x: fmt_axis_year,
            fmt_y: fmt_axis_value,
        };
        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, x_bounds, y_bounds, ("year", "anom"));
        }
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect, view: Option<&RangeView<'_>>) {
        let (start, end) = view
            .map(|v| (v.range.start.to_string(), v.range.end.to_string()))
            .unwrap_or_else(|| ("-".to_string(), "-".to_string()));

        let items = vec![
            ListItem::new(format!("Start year: {start}")),
            ListItem::new(format!("End year:   {end}")),
        ];

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ ±1y  PgUp/PgDn ±10y  r refetch  d debug  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn draw_waiting(frame: &mut ratatui::Frame<'_>, area: Rect, msg: &str) {
    let p = Paragraph::new(msg.to_string())
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default());
    frame.render_widget(p, area);
}

fn draw_notes(frame: &mut ratatui::Frame<'_>, area: Rect, config: &ReconcileConfig, dashboard: &DashboardConfig) {
    let text = notes_text(config.cutoff_year, dashboard.threshold);
    let p = Paragraph::new(text)
        .style(Style::default().fg(Color::Gray))
        .wrap(Wrap { trim: true })
        .block(Block::default().title("Notes").borders(Borders::ALL));
    frame.render_widget(p, area);
}

fn notes_text(cutoff_year: i32, threshold: f64) -> String {
    format!(
        "Anomalies before {cutoff_year} come from the long-run monthly archive; \
         from {cutoff_year} on they come from the operational feed, which also \
         provides the absolute temperature.\n\n\
         Months at or above +{threshold:.1}°C are El Niño (red), at or below \
         -{threshold:.1}°C La Niña (blue), otherwise neutral (grey).\n\n\
         The operational feed reports overlapping three-month seasons; each \
         row is placed on the month given by its position within the year."
    )
}

fn phase_color(phase: EnsoPhase) -> Color {
    match phase {
        EnsoPhase::ElNino => Color::Red,
        EnsoPhase::LaNina => Color::Blue,
        EnsoPhase::Neutral => Color::Gray,
    }
}

/// Move the selected bound of `range` by `delta` years, staying inside
/// `bounds` and never crossing the other bound.
fn step_range(range: YearRange, bounds: YearRange, field: usize, delta: i32) -> YearRange {
    let mut next = range;
    if field == FIELD_START {
        next.start = range.start.saturating_add(delta).clamp(bounds.start, range.end);
    } else {
        next.end = range.end.saturating_add(delta).clamp(range.start, bounds.end);
    }
    next
}

fn temperature_points(view: &RangeView<'_>) -> Vec<(f64, f64)> {
    view.combined
        .iter()
        .map(|r| (decimal_year(r.date), r.temp))
        .collect()
}

fn anomaly_bars(view: &RangeView<'_>, threshold: f64) -> Vec<(f64, f64, EnsoPhase)> {
    view.anomaly
        .iter()
        .map(|r| (decimal_year(r.date), r.anom, EnsoPhase::classify(r.anom, threshold)))
        .collect()
}

/// Both charts share the x axis: the full selected years.
fn x_bounds(range: YearRange) -> [f64; 2] {
    [range.start as f64, range.end as f64 + 1.0]
}

fn value_bounds(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for y in values {
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }

    if !y_min.is_finite() || !y_max.is_finite() {
        y_min = 0.0;
        y_max = 1.0;
    } else if y_max <= y_min {
        y_min -= 0.5;
        y_max += 0.5;
    }

    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);
    [y_min - pad, y_max + pad]
}

fn fmt_axis_year(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_axis_value(v: f64) -> String {
    format!("{v:.1}")
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    labels: (&str, &str),
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = fmt_axis_year(x_val);
        let label_len = label.len() as u16;
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = fmt_axis_value(y_val);
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new(labels.0.to_string())
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new(labels.1.to_string())
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::reconcile_texts;

    const ARCHIVE: &str = "\
2017   0.1  0.2  0.3  0.4  0.5  0.4  0.3  0.2  0.1  0.0 -0.1 -0.2
2018  -0.9 -0.8 -0.6 -0.4 -0.1  0.1  0.2  0.4  0.5  0.8  0.9  0.8
";

    const OPERATIONAL: &str = "\
 SEAS  YR   TOTAL   ANOM
  DJF 2019  27.21   0.74
  JFM 2019  27.45   0.79
";

    fn app() -> App {
        let config = ReconcileConfig::default();
        let run = RunOutput {
            data: reconcile_texts(ARCHIVE, OPERATIONAL, &config).unwrap(),
            sources: SourceConfig::default(),
            config,
        };
        App::new(SourceConfig::default(), config, DashboardConfig::default(), run)
    }

    #[test]
    fn arrows_move_the_selected_bound() {
        let mut app = app();
        assert!(!app.handle_key(KeyCode::Right));
        assert_eq!(app.dashboard.range, Some(YearRange { start: 2018, end: 2019 }));

        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Left);
        assert_eq!(app.dashboard.range, Some(YearRange { start: 2018, end: 2018 }));
    }

    #[test]
    fn page_keys_stay_inside_available_years() {
        let mut app = app();
        app.handle_key(KeyCode::PageUp);
        // Start cannot pass End.
        assert_eq!(app.dashboard.range, Some(YearRange { start: 2019, end: 2019 }));
        app.handle_key(KeyCode::PageDown);
        assert_eq!(app.dashboard.range, Some(YearRange { start: 2017, end: 2019 }));
    }

    #[test]
    fn quit_keys_exit() {
        let mut app = app();
        assert!(app.handle_key(KeyCode::Char('q')));
        assert!(app.handle_key(KeyCode::Esc));
    }

    #[test]
    fn step_range_clamps_both_bounds() {
        let bounds = YearRange { start: 1870, end: 2024 };
        let r = YearRange { start: 1875, end: 2020 };
        assert_eq!(step_range(r, bounds, FIELD_START, -10).start, 1870);
        assert_eq!(step_range(r, bounds, FIELD_END, 10).end, 2024);
        assert_eq!(step_range(r, bounds, FIELD_END, -1).end, 2019);
    }

    #[test]
    fn chart_series_follow_the_selected_range() {
        let mut app = app();
        app.dashboard.range = Some(YearRange { start: 2018, end: 2019 });
        let view = RangeView::new(&app.run.data, &app.dashboard).unwrap();

        let bars = anomaly_bars(&view, 0.5);
        assert_eq!(bars.len(), 14);
        assert_eq!(bars[0].2, EnsoPhase::LaNina);
        assert_eq!(bars[13].2, EnsoPhase::ElNino);

        let line = temperature_points(&view);
        assert_eq!(line.len(), 2);
        assert_eq!(x_bounds(view.range), [2018.0, 2020.0]);
    }

    #[test]
    fn value_bounds_pad_flat_series() {
        let [lo, hi] = value_bounds([1.0, 1.0].into_iter());
        assert!(lo < 0.6 && hi > 1.4);
        let [lo, hi] = value_bounds(std::iter::empty());
        assert!((lo + 0.05).abs() < 1e-12 && (hi - 1.05).abs() < 1e-12);
    }

    #[test]
    fn notes_mention_cutoff_and_threshold() {
        let text = notes_text(2019, 0.5);
        assert!(text.contains("before 2019"));
        assert!(text.contains("+0.5°C"));
    }
}
