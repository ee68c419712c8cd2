//! Reconciliation of the archive and operational sources.
//!
//! Produces:
//! - the anomaly series: archive months before the cutoff, operational months
//!   from the cutoff onward, one row per month
//! - the combined series: every operational month with temperature + anomaly
//!
//! Duplicate dates within one source keep the first occurrence in file order.
//! Dates supplied by both sources go to whichever source the configured
//! [`SourcePrecedence`] lists first.

use std::collections::{BTreeMap, HashSet};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::{
    AnomalyRow, AnomalySeries, ArchiveObservation, CombinedRow, CombinedSeries,
    OperationalObservation, ReconcileConfig, SourceKind, SourcePrecedence,
};

/// Bookkeeping for a single reconciliation (reported, never used for decisions).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileStats {
    pub archive_rows: usize,
    /// Archive rows dated before the cutoff.
    pub archive_kept: usize,
    pub operational_rows: usize,
    /// Operational rows dated on or after the cutoff.
    pub operational_kept: usize,
    /// Operational rows dropped from the combined series as repeated dates.
    pub combined_duplicates: usize,
    /// Rows dropped from the anomaly series as repeated dates within one source.
    pub anomaly_duplicates: usize,
    /// Dates both sources supplied; the losing source's value was dropped.
    pub overlaps: Vec<NaiveDate>,
}

/// Both reconciled tables plus run bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub anomaly: AnomalySeries,
    pub combined: CombinedSeries,
    pub stats: ReconcileStats,
}

/// Merge the parsed sources into the anomaly and combined series.
pub fn reconcile(
    archive: &[ArchiveObservation],
    operational: &[OperationalObservation],
    config: &ReconcileConfig,
) -> Reconciled {
    let mut stats = ReconcileStats {
        archive_rows: archive.len(),
        operational_rows: operational.len(),
        ..ReconcileStats::default()
    };

    // Archive: sort (stable, so file order breaks ties) and cut.
    let mut archive_sorted = archive.to_vec();
    archive_sorted.sort_by_key(|o| o.date);
    let archive_rows: Vec<AnomalyRow> = archive_sorted
        .iter()
        .filter(|o| o.date.year() < config.cutoff_year)
        .map(|o| AnomalyRow {
            date: o.date,
            anom: o.anom,
            source: SourceKind::Archive,
        })
        .collect();
    stats.archive_kept = archive_rows.len();

    let operational_rows: Vec<AnomalyRow> = operational
        .iter()
        .filter(|o| o.date.year() >= config.cutoff_year)
        .map(|o| AnomalyRow {
            date: o.date,
            anom: o.anom,
            source: SourceKind::Operational,
        })
        .collect();
    stats.operational_kept = operational_rows.len();

    let combined = combine(operational, &mut stats);

    let anomaly = merge_by_precedence(&archive_rows, &operational_rows, config.precedence, &mut stats);

    if stats.anomaly_duplicates > 0 || stats.combined_duplicates > 0 {
        warn!(
            anomaly = stats.anomaly_duplicates,
            combined = stats.combined_duplicates,
            "dropped repeated dates"
        );
    }
    if !stats.overlaps.is_empty() {
        warn!(
            overlaps = stats.overlaps.len(),
            winner = %config.precedence.order()[0],
            "sources overlap; kept the preferred source"
        );
    }

    debug!(?stats, "reconcile stats");
    info!(
        anomaly_rows = anomaly.len(),
        combined_rows = combined.len(),
        cutoff = config.cutoff_year,
        "reconciled sources"
    );

    Reconciled {
        anomaly,
        combined,
        stats,
    }
}

/// Union of both candidate lists, one row per date.
///
/// Sources claim dates in precedence order; a date already claimed by the
/// preferred source is recorded as an overlap and skipped.
fn merge_by_precedence(
    archive_rows: &[AnomalyRow],
    operational_rows: &[AnomalyRow],
    precedence: SourcePrecedence,
    stats: &mut ReconcileStats,
) -> AnomalySeries {
    let mut by_date: BTreeMap<NaiveDate, AnomalyRow> = BTreeMap::new();
    for feed in precedence.order() {
        let rows = match feed {
            SourceKind::Archive => archive_rows,
            SourceKind::Operational => operational_rows,
        };
        let mut seen = HashSet::new();
        for row in rows {
            if !seen.insert(row.date) {
                stats.anomaly_duplicates += 1;
                continue;
            }
            if by_date.contains_key(&row.date) {
                stats.overlaps.push(row.date);
                continue;
            }
            by_date.insert(row.date, *row);
        }
    }
    stats.overlaps.sort();

    AnomalySeries {
        rows: by_date.into_values().collect(),
    }
}

fn combine(operational: &[OperationalObservation], stats: &mut ReconcileStats) -> CombinedSeries {
    let mut by_date: BTreeMap<NaiveDate, CombinedRow> = BTreeMap::new();
    for o in operational {
        if by_date.contains_key(&o.date) {
            stats.combined_duplicates += 1;
            continue;
        }
        by_date.insert(
            o.date,
            CombinedRow {
                date: o.date,
                temp: o.temp,
                anom: o.anom,
            },
        );
    }
    CombinedSeries {
        rows: by_date.into_values().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn archive_year(year: i32, base: f64) -> Vec<ArchiveObservation> {
        (1..=12)
            .map(|m| ArchiveObservation {
                date: d(year, m),
                anom: base + m as f64 / 100.0,
            })
            .collect()
    }

    fn op(y: i32, m: u32, temp: f64, anom: f64) -> OperationalObservation {
        OperationalObservation {
            season: None,
            date: d(y, m),
            temp,
            anom,
        }
    }

    #[test]
    fn archive_wins_before_cutoff_and_operational_after() {
        // Archive 2015 plus operational 2015-01..12 and 2019-01.
        let archive = archive_year(2015, 0.5);
        let mut operational: Vec<_> = (1..=12).map(|m| op(2015, m, 26.0, -1.0)).collect();
        operational.push(op(2019, 1, 26.7, 0.7));

        let out = reconcile(&archive, &operational, &ReconcileConfig::default());

        let rows = out.anomaly.rows();
        assert_eq!(rows.len(), 13);
        for row in &rows[..12] {
            assert_eq!(row.source, SourceKind::Archive);
            assert!(row.anom > 0.0);
        }
        let jan_2019: Vec<_> = rows.iter().filter(|r| r.date == d(2019, 1)).collect();
        assert_eq!(jan_2019.len(), 1);
        assert_eq!(jan_2019[0].source, SourceKind::Operational);
        assert!((jan_2019[0].anom - 0.7).abs() < 1e-12);

        // Combined keeps every operational month, including 2015.
        assert_eq!(out.combined.len(), 13);
        assert!(out.stats.overlaps.is_empty());
        assert_eq!(out.stats.archive_kept, 12);
        assert_eq!(out.stats.operational_kept, 1);
    }

    #[test]
    fn archive_rows_from_cutoff_are_discarded() {
        let mut archive = archive_year(2018, 0.0);
        archive.extend(archive_year(2019, 3.0));
        let operational = vec![op(2019, 1, 27.0, 0.2)];

        let out = reconcile(&archive, &operational, &ReconcileConfig::default());
        assert_eq!(out.stats.archive_kept, 12);
        assert!(
            out.anomaly
                .rows()
                .iter()
                .all(|r| r.year() < 2019 || r.source == SourceKind::Operational)
        );
        assert_eq!(out.anomaly.len(), 13);
    }

    #[test]
    fn rows_are_sorted_and_unique() {
        // Archive delivered out of order with a repeated month.
        let archive = vec![
            ArchiveObservation { date: d(2001, 3), anom: 0.3 },
            ArchiveObservation { date: d(2001, 1), anom: 0.1 },
            ArchiveObservation { date: d(2001, 2), anom: 0.2 },
            ArchiveObservation { date: d(2001, 1), anom: 9.9 },
        ];
        let operational = vec![
            op(2020, 2, 27.0, 0.2),
            op(2020, 1, 26.0, 0.1),
            op(2020, 2, 99.0, 9.9),
        ];

        let out = reconcile(&archive, &operational, &ReconcileConfig::default());

        let dates: Vec<_> = out.anomaly.rows().iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![d(2001, 1), d(2001, 2), d(2001, 3), d(2020, 1), d(2020, 2)]);
        // First occurrence wins within a source.
        assert!((out.anomaly.rows()[0].anom - 0.1).abs() < 1e-12);
        assert!((out.anomaly.rows()[4].anom - 0.2).abs() < 1e-12);
        assert_eq!(out.stats.anomaly_duplicates, 2);

        let combined = out.combined.rows();
        assert_eq!(combined.len(), 2);
        assert!(combined[0].date < combined[1].date);
        assert!((combined[1].temp - 27.0).abs() < 1e-12);
        assert_eq!(out.stats.combined_duplicates, 1);
    }

    #[test]
    fn precedence_decides_overlapping_dates() {
        let row = |m: u32, anom: f64, source: SourceKind| AnomalyRow {
            date: d(2018, m),
            anom,
            source,
        };
        let archive = vec![row(11, 1.0, SourceKind::Archive), row(12, 1.0, SourceKind::Archive)];
        let operational = vec![row(12, -1.0, SourceKind::Operational)];

        let mut stats = ReconcileStats::default();
        let merged =
            merge_by_precedence(&archive, &operational, SourcePrecedence::ArchiveFirst, &mut stats);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.rows()[1].source, SourceKind::Archive);
        assert_eq!(stats.overlaps, vec![d(2018, 12)]);

        let mut stats = ReconcileStats::default();
        let merged = merge_by_precedence(
            &archive,
            &operational,
            SourcePrecedence::OperationalFirst,
            &mut stats,
        );
        assert_eq!(merged.rows()[1].source, SourceKind::Operational);
        assert!((merged.rows()[1].anom + 1.0).abs() < 1e-12);
        assert_eq!(stats.overlaps, vec![d(2018, 12)]);
    }

    #[test]
    fn cutoff_keeps_sources_disjoint() {
        let archive = archive_year(2018, 0.0);
        let operational: Vec<_> = (1..=12)
            .map(|m| op(2018, m, 26.0, 0.0))
            .chain((1..=3).map(|m| op(2019, m, 26.0, 0.0)))
            .collect();
        let out = reconcile(&archive, &operational, &ReconcileConfig::default());
        assert!(out.stats.overlaps.is_empty());
        assert_eq!(out.anomaly.len(), 15);
        assert_eq!(out.combined.len(), 15);
    }

    #[test]
    fn combined_never_contains_archive_dates() {
        let archive = archive_year(1990, 0.0);
        let operational = vec![op(2020, 1, 26.0, 0.1)];
        let out = reconcile(&archive, &operational, &ReconcileConfig::default());
        assert_eq!(out.combined.len(), 1);
        assert_eq!(out.combined.rows()[0].date, d(2020, 1));
        assert_eq!(out.anomaly.len(), 13);
    }
}
