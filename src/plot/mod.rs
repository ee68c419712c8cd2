//! Terminal plots for the non-interactive commands.

pub mod ascii;

pub use ascii::{render_anomaly_plot, render_temperature_plot};
