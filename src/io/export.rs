//! Export the reconciled tables to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.
//! Column names match the table schema: `DATE`, `YEAR`, `ANOM`, `TEMP`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::{AnomalyRow, CombinedRow};
use crate::error::AppError;

/// Write the anomaly series to a CSV file.
pub fn write_anomaly_csv(path: &Path, rows: &[AnomalyRow]) -> Result<(), AppError> {
    let mut file = create(path)?;
    write_anomaly_rows(&mut file, rows)
        .and_then(|_| file.flush())
        .map_err(|e| AppError::new(2, format!("Failed to write anomaly CSV '{}': {e}", path.display())))
}

/// Write the combined series to a CSV file.
pub fn write_combined_csv(path: &Path, rows: &[CombinedRow]) -> Result<(), AppError> {
    let mut file = create(path)?;
    write_combined_rows(&mut file, rows)
        .and_then(|_| file.flush())
        .map_err(|e| AppError::new(2, format!("Failed to write combined CSV '{}': {e}", path.display())))
}

pub fn write_anomaly_rows(out: &mut impl Write, rows: &[AnomalyRow]) -> std::io::Result<()> {
    writeln!(out, "DATE,YEAR,ANOM,SOURCE")?;
    for r in rows {
        writeln!(out, "{},{},{},{}", r.date, r.year(), r.anom, r.source)?;
    }
    Ok(())
}

pub fn write_combined_rows(out: &mut impl Write, rows: &[CombinedRow]) -> std::io::Result<()> {
    writeln!(out, "DATE,YEAR,TEMP,ANOM")?;
    for r in rows {
        writeln!(out, "{},{},{},{}", r.date, r.year(), r.temp, r.anom)?;
    }
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>, AppError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))
}
