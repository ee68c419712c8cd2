//! Reporting utilities: range summaries and formatted terminal output.

use crate::domain::{AnomalyRow, CombinedRow, DashboardConfig, EnsoPhase, YearRange};
use crate::series::{PhaseCounts, Reconciled, overall_bounds};

pub mod format;

pub use format::*;

/// Everything the front-ends show for one selected year range.
#[derive(Debug, Clone)]
pub struct RangeView<'a> {
    pub range: YearRange,
    pub anomaly: &'a [AnomalyRow],
    pub combined: &'a [CombinedRow],
    pub phases: PhaseCounts,
    /// Largest and smallest anomaly in the range, with their rows.
    pub warmest: Option<&'a AnomalyRow>,
    pub coldest: Option<&'a AnomalyRow>,
}

impl<'a> RangeView<'a> {
    /// Filter both series to the configured range (or everything, if unset).
    ///
    /// Returns `None` only when both series are empty.
    pub fn new(data: &'a Reconciled, config: &DashboardConfig) -> Option<Self> {
        let bounds = overall_bounds(&data.anomaly, &data.combined)?;
        let range = config.range.map_or(bounds, |r| r.clamp_to(bounds));

        let anomaly = data.anomaly.in_years(range);
        let combined = data.combined.in_years(range);
        let phases = PhaseCounts::from_anomalies(anomaly.iter().map(|r| r.anom), config.threshold);

        let warmest = anomaly
            .iter()
            .max_by(|a, b| a.anom.partial_cmp(&b.anom).unwrap_or(std::cmp::Ordering::Equal));
        let coldest = anomaly
            .iter()
            .min_by(|a, b| a.anom.partial_cmp(&b.anom).unwrap_or(std::cmp::Ordering::Equal));

        Some(Self {
            range,
            anomaly,
            combined,
            phases,
            warmest,
            coldest,
        })
    }

    /// Most recent anomaly in the range and its phase.
    pub fn latest(&self, threshold: f64) -> Option<(&'a AnomalyRow, EnsoPhase)> {
        let row = self.anomaly.last()?;
        Some((row, EnsoPhase::classify(row.anom, threshold)))
    }
}
