//! Command-line parsing for the Nino3.4 anomaly dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fetch/parse/reconcile code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::SourcePrecedence;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "enso", version, about = "Nino3.4 SST anomaly reconciliation and dashboard")]
pub struct Cli {
    /// Log filter used when `RUST_LOG` is not set (e.g. `info`, `enso_dash=debug`).
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch both sources, reconcile, print the summary/table/plots and optionally export.
    Show(ShowArgs),
    /// Plot a previously exported snapshot JSON (no network access).
    Plot(PlotArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same reconcile pipeline as `enso show`, but renders results
    /// in a terminal UI using Ratatui.
    Tui(TuiArgs),
}

/// Where to fetch the two sources from and how to split them.
///
/// Unset flags fall back to `ENSO_*` environment variables, then built-in defaults.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Long-run monthly anomaly archive (year + 12 monthly values per row).
    #[arg(long, value_name = "URL")]
    pub archive_url: Option<String>,

    /// Operational feed with season, year, absolute temperature and anomaly.
    #[arg(long, value_name = "URL")]
    pub operational_url: Option<String>,

    /// HTTP timeout per request (seconds).
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// First year taken from the operational feed; earlier years come from the archive.
    #[arg(long)]
    pub cutoff_year: Option<i32>,

    /// Which source wins when both cover the same month.
    #[arg(long, value_enum, default_value_t = SourcePrecedence::ArchiveFirst)]
    pub precedence: SourcePrecedence,
}

/// Inclusive year window to display.
#[derive(Debug, Args, Clone, Default)]
pub struct RangeArgs {
    /// First year to display (defaults to the earliest available).
    #[arg(long, value_name = "YEAR")]
    pub from: Option<i32>,

    /// Last year to display (defaults to the latest available).
    #[arg(long, value_name = "YEAR")]
    pub to: Option<i32>,
}

/// Options for the text report.
#[derive(Debug, Parser, Clone)]
pub struct ShowArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub range: RangeArgs,

    /// Number of most recent months to list in the table.
    #[arg(long, default_value_t = 12)]
    pub rows: usize,

    /// Anomaly magnitude (°C) that marks El Niño / La Niña months.
    #[arg(long, default_value_t = crate::domain::ENSO_THRESHOLD)]
    pub threshold: f64,

    /// Disable the terminal plots.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export the anomaly series to CSV.
    #[arg(long = "export-anomaly", value_name = "CSV")]
    pub export_anomaly: Option<PathBuf>,

    /// Export the combined temperature + anomaly series to CSV.
    #[arg(long = "export-combined", value_name = "CSV")]
    pub export_combined: Option<PathBuf>,

    /// Export both tables plus source metadata to JSON.
    #[arg(long = "export-snapshot", value_name = "JSON")]
    pub export_snapshot: Option<PathBuf>,
}

/// Options for plotting a saved snapshot.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Snapshot JSON file produced by `enso show --export-snapshot`.
    #[arg(long, value_name = "JSON")]
    pub snapshot: PathBuf,

    #[command(flatten)]
    pub range: RangeArgs,

    /// Anomaly magnitude (°C) that marks El Niño / La Niña months.
    #[arg(long, default_value_t = crate::domain::ENSO_THRESHOLD)]
    pub threshold: f64,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

/// Options for the interactive dashboard.
#[derive(Debug, Parser, Clone)]
pub struct TuiArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub range: RangeArgs,

    /// Anomaly magnitude (°C) that marks El Niño / La Niña months.
    #[arg(long, default_value_t = crate::domain::ENSO_THRESHOLD)]
    pub threshold: f64,
}
