//! Parser for the operational ONI feed.
//!
//! The feed is a header row followed by one row per overlapping 3-month
//! season, in order:
//!
//! ```text
//!  SEAS  YR   TOTAL   ANOM
//!   DJF 1950  24.72  -1.53
//!   JFM 1950  25.17  -1.34
//! ```
//!
//! Rows carry no month column. The month is the 1-based position of the row
//! within its year (the first `1950` row is January 1950, and so on).

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{OperationalObservation, SourceKind};
use crate::error::PipelineError;

const FEED: SourceKind = SourceKind::Operational;

const YEAR_COLUMNS: [&str; 2] = ["YR", "YEAR"];
const TEMP_COLUMN: &str = "TOTAL";
const ANOM_COLUMN: &str = "ANOM";
const SEASON_COLUMN: &str = "SEAS";

/// Resolved column positions for the fixed schema.
#[derive(Debug, Clone, Copy)]
struct Columns {
    count: usize,
    year: usize,
    temp: usize,
    anom: usize,
    season: Option<usize>,
}

impl Columns {
    fn from_header(tokens: &[&str], line: usize) -> Result<Self, PipelineError> {
        let missing = |name: &str| {
            PipelineError::parse(
                FEED,
                line,
                format!("missing required column `{name}` in header '{}'", tokens.join(" ")),
            )
        };

        Ok(Self {
            count: tokens.len(),
            year: position(tokens, &YEAR_COLUMNS).ok_or_else(|| missing("YR"))?,
            temp: position(tokens, &[TEMP_COLUMN]).ok_or_else(|| missing(TEMP_COLUMN))?,
            anom: position(tokens, &[ANOM_COLUMN]).ok_or_else(|| missing(ANOM_COLUMN))?,
            season: position(tokens, &[SEASON_COLUMN]),
        })
    }
}

fn position(tokens: &[&str], names: &[&str]) -> Option<usize> {
    tokens
        .iter()
        .position(|t| names.iter().any(|n| t.eq_ignore_ascii_case(n)))
}

/// Parse the feed into dated observations, in file order.
pub fn parse_operational(text: &str) -> Result<Vec<OperationalObservation>, PipelineError> {
    let mut columns: Option<Columns> = None;
    let mut months_seen: HashMap<i32, u32> = HashMap::new();
    let mut out = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }

        let Some(cols) = columns else {
            columns = Some(Columns::from_header(&tokens, line)?);
            continue;
        };

        if tokens.len() != cols.count {
            return Err(PipelineError::parse(
                FEED,
                line,
                format!("expected {} columns, found {}", cols.count, tokens.len()),
            ));
        }

        let year = tokens[cols.year].parse::<i32>().map_err(|e| {
            PipelineError::parse(FEED, line, format!("invalid year '{}': {e}", tokens[cols.year]))
        })?;
        let temp = parse_value(tokens[cols.temp], TEMP_COLUMN, line)?;
        let anom = parse_value(tokens[cols.anom], ANOM_COLUMN, line)?;

        let month = months_seen.entry(year).or_insert(0);
        *month += 1;
        if *month > 12 {
            return Err(PipelineError::parse(
                FEED,
                line,
                format!("year {year} has more than 12 rows"),
            ));
        }

        let date = build_date(year, *month, line)?;
        out.push(OperationalObservation {
            season: cols.season.map(|i| tokens[i].to_string()),
            date,
            temp,
            anom,
        });
    }

    if out.is_empty() {
        return Err(PipelineError::Empty { feed: FEED });
    }

    debug!(
        observations = out.len(),
        years = months_seen.len(),
        "parsed operational feed"
    );
    Ok(out)
}

fn parse_value(token: &str, column: &str, line: usize) -> Result<f64, PipelineError> {
    let v = token.parse::<f64>().map_err(|e| {
        PipelineError::parse(FEED, line, format!("invalid {column} value '{token}': {e}"))
    })?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(PipelineError::parse(
            FEED,
            line,
            format!("non-finite {column} value '{token}'"),
        ))
    }
}

/// Build the first-of-month date from `YYYY` and the running month count.
fn build_date(year: i32, month: u32, line: usize) -> Result<NaiveDate, PipelineError> {
    let text = format!("{year:04}-{month:02}-01");
    NaiveDate::parse_from_str(&text, "%Y-%m-%d").map_err(|e| {
        PipelineError::parse(FEED, line, format!("cannot build a date from '{text}': {e}"))
    })
}
