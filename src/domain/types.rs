//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - produced by the source parsers and the reconciliation step
//! - filtered and rendered by the CLI and TUI front-ends
//! - exported to CSV/JSON and reloaded later for plotting

use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::series::ReconcileStats;

/// Archive rows dated on or after January 1st of this year are discarded.
///
/// The archive is a static historical snapshot; the operational feed is the
/// authority from this year onward.
pub const DEFAULT_CUTOFF_YEAR: i32 = 2019;

/// Anomaly magnitude (°C) separating El Niño / La Niña from neutral months.
pub const ENSO_THRESHOLD: f64 = 0.5;

/// Years the dashboard opens on when neither `--from` nor `--to` is given.
pub const DASHBOARD_DEFAULT_YEARS: YearRange = YearRange { start: 1990, end: 2020 };

/// Which upstream table an observation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Legacy long-format anomaly archive (year × 12 month grid).
    Archive,
    /// Operational ONI feed (season rows with absolute temperature).
    Operational,
}

impl SourceKind {
    pub fn label(self) -> &'static str {
        match self {
            SourceKind::Archive => "archive",
            SourceKind::Operational => "operational",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Which source wins when both provide an anomaly for the same month.
///
/// The cutoff normally keeps the two sources disjoint, so this only matters
/// when the cutoff is moved or the upstream data changes shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SourcePrecedence {
    #[default]
    ArchiveFirst,
    OperationalFirst,
}

impl SourcePrecedence {
    /// Sources in the order they are allowed to claim a date.
    pub fn order(self) -> [SourceKind; 2] {
        match self {
            SourcePrecedence::ArchiveFirst => [SourceKind::Archive, SourceKind::Operational],
            SourcePrecedence::OperationalFirst => [SourceKind::Operational, SourceKind::Archive],
        }
    }
}

/// ENSO state implied by a single monthly anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnsoPhase {
    ElNino,
    Neutral,
    LaNina,
}

impl EnsoPhase {
    /// Classify an anomaly against a symmetric threshold.
    ///
    /// The threshold itself belongs to the warm/cold phase: `+0.5` is El Niño.
    pub fn classify(anom: f64, threshold: f64) -> Self {
        if anom >= threshold {
            EnsoPhase::ElNino
        } else if anom <= -threshold {
            EnsoPhase::LaNina
        } else {
            EnsoPhase::Neutral
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            EnsoPhase::ElNino => "El Niño",
            EnsoPhase::Neutral => "neutral",
            EnsoPhase::LaNina => "La Niña",
        }
    }
}

/// One month of the archive after the wide → long reshape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArchiveObservation {
    pub date: NaiveDate,
    pub anom: f64,
}

/// One row of the operational feed with its derived month.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationalObservation {
    /// Season label as published (e.g. `DJF`), if the feed has that column.
    pub season: Option<String>,
    pub date: NaiveDate,
    /// Absolute temperature (°C).
    pub temp: f64,
    pub anom: f64,
}

/// A row of the anomaly series (`DATE`, `ANOM`, plus provenance).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRow {
    pub date: NaiveDate,
    pub anom: f64,
    pub source: SourceKind,
}

impl AnomalyRow {
    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

/// A row of the combined temperature + anomaly series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombinedRow {
    pub date: NaiveDate,
    pub temp: f64,
    pub anom: f64,
}

impl CombinedRow {
    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

/// Anomaly-only series: archive before the cutoff, operational feed after.
///
/// Rows are unique by date and strictly ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnomalySeries {
    pub(crate) rows: Vec<AnomalyRow>,
}

impl AnomalySeries {
    pub fn rows(&self) -> &[AnomalyRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Operational-feed series carrying both temperature and anomaly.
///
/// Rows are unique by date and strictly ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombinedSeries {
    pub(crate) rows: Vec<CombinedRow>,
}

impl CombinedSeries {
    pub fn rows(&self) -> &[CombinedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Inclusive range of calendar years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

/// Settings for the reconciliation step itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileConfig {
    pub cutoff_year: i32,
    pub precedence: SourcePrecedence,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            cutoff_year: DEFAULT_CUTOFF_YEAR,
            precedence: SourcePrecedence::ArchiveFirst,
        }
    }
}

/// Presentation settings for one render of the dashboard or the text report.
///
/// This replaces slider widgets held in global state: front-ends own a value
/// of this type and pass it into every render call.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// Years to show; `None` means "everything available".
    pub range: Option<YearRange>,
    pub threshold: f64,
    pub table_rows: usize,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            range: None,
            threshold: ENSO_THRESHOLD,
            table_rows: 12,
            plot: true,
            plot_width: 100,
            plot_height: 20,
        }
    }
}

/// A saved reconciliation (JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub tool: String,
    pub archive_url: String,
    pub operational_url: String,
    pub cutoff_year: i32,
    pub anomaly: AnomalySeries,
    pub combined: CombinedSeries,
    /// Merge bookkeeping of the run that produced the tables; empty for older files.
    #[serde(default)]
    pub stats: ReconcileStats,
}

/// First day of the given month, if the year/month pair is valid.
pub fn month_start(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Date as a fractional year (`2020-07-01` → `2020.5`), used as a plot x-axis.
pub fn decimal_year(date: NaiveDate) -> f64 {
    date.year() as f64 + date.month0() as f64 / 12.0
}
