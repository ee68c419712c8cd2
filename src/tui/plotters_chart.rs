//! Plotters-powered time-series chart widget for Ratatui.
//!
//! One widget covers both dashboard panels:
//! - temperature: a single line series
//! - anomaly: vertical bars coloured by ENSO phase, plus horizontal reference
//!   lines at zero (amber) and ±threshold (in the phase colours)
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::domain::EnsoPhase;

/// A lightweight, render-only chart description.
///
/// All series and bounds are computed outside the render call.
pub struct EnsoChart<'a> {
    /// Line series (decimal year, value).
    pub line: &'a [(f64, f64)],
    /// Bars drawn from zero to the value (decimal year, value, phase).
    pub bars: &'a [(f64, f64, EnsoPhase)],
    /// Horizontal reference lines spanning the x range, each with its colour.
    pub reference_lines: &'a [(f64, RGBColor)],
    /// X bounds (decimal years).
    pub x_bounds: [f64; 2],
    /// Y bounds (°C).
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: &'a str,
    pub fmt_x: fn(f64) -> String,
    pub fmt_y: fn(f64) -> String,
}

/// Bar colour for a phase: warm red, cold blue, neutral grey.
pub fn phase_color(phase: EnsoPhase) -> RGBColor {
    match phase {
        EnsoPhase::ElNino => RGBColor(255, 80, 80),
        EnsoPhase::LaNina => RGBColor(80, 140, 255),
        EnsoPhase::Neutral => RGBColor(150, 150, 150),
    }
}

/// Zero line plus the El Niño (+threshold) and La Niña (-threshold) lines.
pub fn threshold_lines(threshold: f64) -> [(f64, RGBColor); 3] {
    [
        (0.0, RGBColor(255, 215, 0)),
        (threshold, phase_color(EnsoPhase::ElNino)),
        (-threshold, phase_color(EnsoPhase::LaNina)),
    ]
}

impl<'a> Widget for EnsoChart<'a> {
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
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(self.y_label)
                .x_labels(6)
                .y_labels(5)
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let line_color = RGBColor(0, 255, 255); // cyan

            // Reference lines first so bars and data draw over them.
            chart.draw_series(
                self.reference_lines
                    .iter()
                    .map(|&(y, color)| PathElement::new(vec![(x0, y), (x1, y)], color)),
            )?;

            // Bars as vertical paths. `Rectangle` fills would hide the reference
            // lines entirely at terminal resolution.
            chart.draw_series(
                self.bars
                    .iter()
                    .map(|&(x, y, phase)| PathElement::new(vec![(x, 0.0), (x, y)], phase_color(phase))),
            )?;

            if !self.line.is_empty() {
                chart.draw_series(LineSeries::new(self.line.iter().copied(), &line_color))?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_lines_take_the_phase_colours() {
        let lines = threshold_lines(0.5);
        assert_eq!(lines[0].0, 0.0);
        assert_eq!(lines[1], (0.5, phase_color(EnsoPhase::ElNino)));
        assert_eq!(lines[2], (-0.5, phase_color(EnsoPhase::LaNina)));
        assert_ne!(lines[1].1, lines[2].1);
        assert_ne!(lines[0].1, lines[1].1);
    }
}
