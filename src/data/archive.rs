//! Parser for the long-run anomaly archive.
//!
//! Layout of the published file:
//!
//! ```text
//!   1870  2023                       <- year span header
//! 1870  -1.00 -1.20 ... -0.69        <- year + 12 monthly anomalies
//! ...
//!   -99.99                           <- missing-value sentinel
//!   Nino 3.4 ...                     <- free-text footer
//! ```
//!
//! Each year row is reshaped from wide to long: twelve observations dated on
//! the first of their month.

use tracing::debug;

use crate::domain::{ArchiveObservation, SourceKind, month_start};
use crate::error::PipelineError;

const FEED: SourceKind = SourceKind::Archive;

/// Columns in a data row: the year followed by January..December.
const DATA_COLUMNS: usize = 13;

/// Anything at or below this is a missing-value marker (`-99.9`, `-99.99`, ...).
const MISSING_THRESHOLD: f64 = -99.0;

/// Parse the archive text into long-form observations, in file order.
pub fn parse_archive(text: &str) -> Result<Vec<ArchiveObservation>, PipelineError> {
    let mut out = Vec::new();
    let mut in_data = false;
    let mut missing = 0usize;

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }

        let year = parse_year(tokens[0]);

        if !in_data && tokens.len() == 2 && year.is_some() && parse_year(tokens[1]).is_some() {
            // Year span header.
            continue;
        }

        let Some(year) = year else {
            if in_data {
                // Sentinel line or footer text: the grid is over.
                break;
            }
            continue;
        };

        if tokens.len() != DATA_COLUMNS {
            return Err(PipelineError::parse(
                FEED,
                line,
                format!(
                    "expected {DATA_COLUMNS} columns (year + 12 months), found {}",
                    tokens.len()
                ),
            ));
        }
        in_data = true;

        for (month0, token) in tokens[1..].iter().enumerate() {
            let month = month0 as u32 + 1;
            let anom = token.parse::<f64>().map_err(|e| {
                PipelineError::parse(
                    FEED,
                    line,
                    format!("invalid anomaly '{token}' for {year}-{month:02}: {e}"),
                )
            })?;
            if !anom.is_finite() || anom <= MISSING_THRESHOLD {
                missing += 1;
                continue;
            }
            let date = month_start(year, month).ok_or_else(|| {
                PipelineError::parse(FEED, line, format!("invalid year-month {year}-{month:02}"))
            })?;
            out.push(ArchiveObservation { date, anom });
        }
    }

    if out.is_empty() {
        return Err(PipelineError::Empty { feed: FEED });
    }

    debug!(observations = out.len(), missing, "parsed archive grid");
    Ok(out)
}

/// A bare four-digit year token.
fn parse_year(token: &str) -> Option<i32> {
    if token.len() == 4 && token.bytes().all(|b| b.is_ascii_digit()) {
        token.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    const SAMPLE: &str = "\
  2014  2016
2014  -0.40 -0.50 -0.10  0.20  0.40  0.30  0.10  0.20  0.40  0.60  0.70  0.60
2015   0.50  0.40  0.60  0.80  1.00  1.30  1.50  1.80  2.10  2.30  2.40  0.30
2016   2.50  2.20  1.70  1.10  0.50  0.00 -0.30 -0.50 -99.99 -99.99 -99.99 -99.99
  -99.99
  Nino 3.4 long record
  https://psl.noaa.gov/gcos_wgsp/Timeseries/Nino34/
";

    #[test]
    fn reshapes_grid_to_month_rows() {
        let obs = parse_archive(SAMPLE).unwrap();
        assert_eq!(obs.len(), 12 + 12 + 8);

        assert_eq!(obs[0].date, NaiveDate::from_ymd_opt(2014, 1, 1).unwrap());
        assert!((obs[0].anom + 0.40).abs() < 1e-12);

        let jan_2015 = obs
            .iter()
            .find(|o| o.date == NaiveDate::from_ymd_opt(2015, 1, 1).unwrap())
            .unwrap();
        assert!((jan_2015.anom - 0.5).abs() < 1e-12);

        let dec_2015 = obs
            .iter()
            .find(|o| o.date == NaiveDate::from_ymd_opt(2015, 12, 1).unwrap())
            .unwrap();
        assert!((dec_2015.anom - 0.3).abs() < 1e-12);
    }

    #[test]
    fn missing_months_are_not_emitted() {
        let obs = parse_archive(SAMPLE).unwrap();
        let last = obs.last().unwrap();
        assert_eq!(last.date, NaiveDate::from_ymd_opt(2016, 8, 1).unwrap());
        assert!(obs.iter().all(|o| o.anom > -99.0));
    }

    #[test]
    fn every_date_is_first_of_month() {
        use chrono::Datelike;
        let obs = parse_archive(SAMPLE).unwrap();
        assert!(obs.iter().all(|o| o.date.day() == 1));
    }

    #[test]
    fn short_row_is_a_parse_error() {
        let text = "2014 2015\n2014 0.1 0.2 0.3\n";
        let err = parse_archive(text).unwrap_err();
        match err {
            PipelineError::Parse { feed, line, message } => {
                assert_eq!(feed, SourceKind::Archive);
                assert_eq!(line, 2);
                assert!(message.contains("found 4"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_numeric_value_is_a_parse_error() {
        let text = "2014  0.1 0.2 0.3 0.4 0.5 x.6 0.7 0.8 0.9 1.0 1.1 1.2\n";
        let err = parse_archive(text).unwrap_err();
        assert!(err.to_string().contains("2014-06"), "{err}");
    }

    #[test]
    fn text_without_rows_is_empty() {
        let err = parse_archive("<html>Service unavailable</html>\n").unwrap_err();
        assert!(matches!(err, PipelineError::Empty { feed: SourceKind::Archive }));
    }
}
