//! Read/write snapshot JSON files.
//!
//! A snapshot is the portable form of one reconciliation run:
//! - where the two sources were fetched from
//! - the cutoff year used to split them
//! - both reconciled tables, row for row
//! - the merge bookkeeping (rows kept, repeated dates, overlaps)
//!
//! `enso plot --snapshot` re-renders a snapshot without touching the network.
//! The schema is defined by `domain::SnapshotFile`.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::NaiveDate;
use tracing::debug;

use crate::app::pipeline::RunOutput;
use crate::domain::SnapshotFile;
use crate::error::AppError;

/// Write a snapshot JSON file.
pub fn write_snapshot_json(path: &Path, run: &RunOutput) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create snapshot JSON '{}': {e}", path.display())))?;

    let snapshot = SnapshotFile {
        tool: "enso".to_string(),
        archive_url: run.sources.archive_url.clone(),
        operational_url: run.sources.operational_url.clone(),
        cutoff_year: run.config.cutoff_year,
        anomaly: run.data.anomaly.clone(),
        combined: run.data.combined.clone(),
        stats: run.data.stats.clone(),
    };

    serde_json::to_writer_pretty(BufWriter::new(file), &snapshot)
        .map_err(|e| AppError::new(2, format!("Failed to write snapshot JSON: {e}")))?;
    debug!(path = %path.display(), rows = snapshot.anomaly.len(), "wrote snapshot");

    Ok(())
}

/// Read a snapshot JSON file.
pub fn read_snapshot_json(path: &Path) -> Result<SnapshotFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open snapshot JSON '{}': {e}", path.display())))?;
    let snapshot: SnapshotFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid snapshot JSON: {e}")))?;

    // Range filtering relies on both tables being strictly ascending by date.
    check_ascending("anomaly", snapshot.anomaly.rows().iter().map(|r| r.date))?;
    check_ascending("combined", snapshot.combined.rows().iter().map(|r| r.date))?;
    Ok(snapshot)
}

fn check_ascending(table: &str, dates: impl Iterator<Item = NaiveDate>) -> Result<(), AppError> {
    let mut prev: Option<NaiveDate> = None;
    for (idx, date) in dates.enumerate() {
        if let Some(p) = prev {
            if date <= p {
                return Err(AppError::new(
                    3,
                    format!("Snapshot {table} table is not strictly ascending at row {idx}: {date} after {p}"),
                ));
            }
        }
        prev = Some(date);
    }
    Ok(())
}
