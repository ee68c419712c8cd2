//! Read-side helpers over the reconciled series: year filtering, phase
//! classification, and coverage checks.

use chrono::{Datelike, NaiveDate};

use crate::domain::{AnomalyRow, AnomalySeries, CombinedRow, CombinedSeries, EnsoPhase, YearRange};

impl YearRange {
    /// Build a range, swapping the bounds if they were given backwards.
    pub fn new(start: i32, end: i32) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }

    /// Restrict this range to `bounds`; falls back to `bounds` if they don't intersect.
    pub fn clamp_to(self, bounds: YearRange) -> YearRange {
        let start = self.start.clamp(bounds.start, bounds.end);
        let end = self.end.clamp(bounds.start, bounds.end);
        if self.end < bounds.start || self.start > bounds.end {
            bounds
        } else {
            YearRange::new(start, end)
        }
    }
}

impl std::fmt::Display for YearRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}–{}", self.start, self.end)
    }
}

impl AnomalySeries {
    /// Years covered by the first and last rows.
    pub fn year_bounds(&self) -> Option<YearRange> {
        Some(YearRange::new(
            self.rows.first()?.year(),
            self.rows.last()?.year(),
        ))
    }

    /// Rows whose `YEAR` lies inside `range` (inclusive), still sorted by date.
    pub fn in_years(&self, range: YearRange) -> &[AnomalyRow] {
        let lo = self.rows.partition_point(|r| r.year() < range.start);
        let hi = self.rows.partition_point(|r| r.year() <= range.end);
        &self.rows[lo..hi.max(lo)]
    }

    pub fn latest(&self) -> Option<&AnomalyRow> {
        self.rows.last()
    }
}

impl CombinedSeries {
    pub fn year_bounds(&self) -> Option<YearRange> {
        Some(YearRange::new(
            self.rows.first()?.year(),
            self.rows.last()?.year(),
        ))
    }

    /// Rows whose `YEAR` lies inside `range` (inclusive), still sorted by date.
    pub fn in_years(&self, range: YearRange) -> &[CombinedRow] {
        let lo = self.rows.partition_point(|r| r.year() < range.start);
        let hi = self.rows.partition_point(|r| r.year() <= range.end);
        &self.rows[lo..hi.max(lo)]
    }

    pub fn latest(&self) -> Option<&CombinedRow> {
        self.rows.last()
    }
}

/// Smallest range covering both series.
pub fn overall_bounds(anomaly: &AnomalySeries, combined: &CombinedSeries) -> Option<YearRange> {
    match (anomaly.year_bounds(), combined.year_bounds()) {
        (Some(a), Some(c)) => Some(YearRange::new(a.start.min(c.start), a.end.max(c.end))),
        (a, c) => a.or(c),
    }
}

/// Count of months in each ENSO phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseCounts {
    pub el_nino: usize,
    pub neutral: usize,
    pub la_nina: usize,
}

impl PhaseCounts {
    pub fn from_anomalies(values: impl IntoIterator<Item = f64>, threshold: f64) -> Self {
        let mut counts = Self::default();
        for v in values {
            match EnsoPhase::classify(v, threshold) {
                EnsoPhase::ElNino => counts.el_nino += 1,
                EnsoPhase::Neutral => counts.neutral += 1,
                EnsoPhase::LaNina => counts.la_nina += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.el_nino + self.neutral + self.la_nina
    }
}

/// Consecutive dates that are more than one month apart.
///
/// Input must be sorted ascending; each returned pair is `(before, after)`.
pub fn find_gaps(dates: impl IntoIterator<Item = NaiveDate>) -> Vec<(NaiveDate, NaiveDate)> {
    let mut gaps = Vec::new();
    let mut prev: Option<NaiveDate> = None;
    for date in dates {
        if let Some(p) = prev {
            if month_index(date) - month_index(p) > 1 {
                gaps.push((p, date));
            }
        }
        prev = Some(date);
    }
    gaps
}

fn month_index(date: NaiveDate) -> i64 {
    date.year() as i64 * 12 + date.month0() as i64
}
