//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - temperature: `*` line
//! - anomaly bars: `+` El Niño, `-` La Niña, `|` neutral
//! - reference rows: `=` zero, `.` ±threshold

use crate::domain::{AnomalyRow, CombinedRow, EnsoPhase, decimal_year};

/// Render the temperature line plot.
pub fn render_temperature_plot(rows: &[CombinedRow], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let points: Vec<(f64, f64)> = rows.iter().map(|r| (decimal_year(r.date), r.temp)).collect();
    let Some((x_min, x_max)) = x_range(&points) else {
        return "Temperature: no data\n".to_string();
    };
    let (y_min, y_max) = y_range(points.iter().map(|p| p.1)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    draw_curve(&mut grid, &points, x_min, x_max, y_min, y_max);

    let mut out = format!(
        "Temperature: {x_min:.2}..{x_max:.2} | y=[{y_min:.2}, {y_max:.2}]°C\n"
    );
    push_grid(&mut out, grid);
    out
}

/// Render the anomaly bar plot with zero and ±threshold reference rows.
pub fn render_anomaly_plot(rows: &[AnomalyRow], threshold: f64, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let points: Vec<(f64, f64)> = rows.iter().map(|r| (decimal_year(r.date), r.anom)).collect();
    let Some((x_min, x_max)) = x_range(&points) else {
        return "Anomaly: no data\n".to_string();
    };
    // Always keep both thresholds in view.
    let values = points.iter().map(|p| p.1).chain([threshold, -threshold]);
    let (y_min, y_max) = y_range(values).unwrap_or((-1.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    let zero = map_y(0.0, y_min, y_max, height);
    fill_row(&mut grid, map_y(threshold, y_min, y_max, height), '.');
    fill_row(&mut grid, map_y(-threshold, y_min, y_max, height), '.');
    fill_row(&mut grid, zero, '=');

    for &(x, anom) in &points {
        let col = map_x(x, x_min, x_max, width);
        let top = map_y(anom, y_min, y_max, height);
        let ch = match EnsoPhase::classify(anom, threshold) {
            EnsoPhase::ElNino => '+',
            EnsoPhase::LaNina => '-',
            EnsoPhase::Neutral => '|',
        };
        for row in grid.iter_mut().take(top.max(zero) + 1).skip(top.min(zero)) {
            row[col] = ch;
        }
    }

    let mut out = format!(
        "Anomaly: {x_min:.2}..{x_max:.2} | y=[{y_min:.2}, {y_max:.2}]°C | threshold ±{threshold:.2}\n"
    );
    push_grid(&mut out, grid);
    out
}

fn push_grid(out: &mut String, grid: Vec<Vec<char>>) {
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
}

fn fill_row(grid: &mut [Vec<char>], row: usize, ch: char) {
    if let Some(r) = grid.get_mut(row) {
        r.iter_mut().for_each(|c| *c = ch);
    }
}

fn x_range(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    let first = points.first()?.0;
    let last = points.last()?.0;
    if last > first {
        Some((first, last))
    } else {
        // A single month still gets a (one-month wide) axis.
        Some((first, first + 1.0 / 12.0))
    }
}

fn y_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for y in values {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else if min_y.is_finite() && max_y.is_finite() {
        Some((min_y - 0.5, max_y + 0.5))
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

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], t_min: f64, t_max: f64, y_min: f64, y_max: f64) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(t, y) in curve {
        let x = map_x(t, t_min, t_max, width);
        let yy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, x, yy, '*');
        } else {
            grid[yy][x] = '*';
        }
        prev = Some((x, yy));
    }
}

/// Integer line drawing (Bresenham-ish).
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
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::SourceKind;

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn temperature_golden_snapshot_small() {
        let rows = vec![
            CombinedRow { date: d(2020, 1), temp: 26.0, anom: 0.0 },
            CombinedRow { date: d(2020, 4), temp: 27.0, anom: 0.0 },
            CombinedRow { date: d(2020, 7), temp: 28.0, anom: 0.0 },
        ];

        let txt = render_temperature_plot(&rows, 10, 5);
        let expected = concat!(
            "Temperature: 2020.00..2020.50 | y=[25.90, 28.10]°C\n",
            "        **\n",
            "      **  \n",
            "    **    \n",
            "  **      \n",
            "**        \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn anomaly_bars_use_phase_glyphs() {
        let rows: Vec<AnomalyRow> = [(1, 1.0), (2, 0.2), (3, -1.0)]
            .into_iter()
            .map(|(m, anom)| AnomalyRow {
                date: d(2000, m),
                anom,
                source: SourceKind::Archive,
            })
            .collect();

        let txt = render_anomaly_plot(&rows, 0.5, 11, 11);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 12);
        assert!(lines[0].starts_with("Anomaly: 2000.00..2000.17"));

        let grid = &lines[1..];
        // Zero row sits in the middle, thresholds a quarter of the way out.
        assert_eq!(grid[5].chars().nth(3), Some('='));
        assert!(grid[5].starts_with('+'));
        assert!(grid[5].ends_with('-'));
        assert_eq!(grid[3].chars().nth(3), Some('.'));
        assert_eq!(grid[7].chars().nth(3), Some('.'));
        // Bars: warm up to the top, cold down to the bottom, neutral stays short.
        assert_eq!(grid[0].chars().next(), Some('+'));
        assert_eq!(grid[10].chars().last(), Some('-'));
        assert_eq!(grid[4].chars().nth(5), Some('|'));
        assert_eq!(grid[3].chars().nth(5), Some('.'));
    }

    #[test]
    fn empty_input_is_reported() {
        assert_eq!(render_temperature_plot(&[], 20, 5), "Temperature: no data\n");
        assert_eq!(render_anomaly_plot(&[], 0.5, 20, 5), "Anomaly: no data\n");
    }
}
