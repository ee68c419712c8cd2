//! Formatted terminal output: run summary and the recent-months table.
//!
//! We keep formatting code in one place so:
//! - the pipeline code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::app::pipeline::RunOutput;
use crate::domain::{DashboardConfig, EnsoPhase};
use crate::report::RangeView;
use crate::series::find_gaps;

/// Format the full run summary (sources + reconciliation stats + range overview).
pub fn format_run_summary(run: &RunOutput, view: &RangeView<'_>, config: &DashboardConfig) -> String {
    let data = &run.data;
    let stats = &data.stats;
    let mut out = String::new();

    out.push_str("=== enso - Nino3.4 anomaly reconciliation ===\n");
    out.push_str(&format!("Archive:     {}\n", run.sources.archive_url));
    out.push_str(&format!("Operational: {}\n", run.sources.operational_url));
    out.push_str(&format!(
        "Cutoff: archive < {} <= operational | precedence: {:?}\n",
        run.config.cutoff_year, run.config.precedence
    ));

    out.push_str("\nSources:\n");
    out.push_str(&format!(
        "- archive     rows={} kept={}\n",
        stats.archive_rows, stats.archive_kept
    ));
    out.push_str(&format!(
        "- operational rows={} kept={}\n",
        stats.operational_rows, stats.operational_kept
    ));
    if stats.anomaly_duplicates > 0 || stats.combined_duplicates > 0 {
        out.push_str(&format!(
            "- repeated dates dropped: anomaly={} combined={}\n",
            stats.anomaly_duplicates, stats.combined_duplicates
        ));
    }
    if !stats.overlaps.is_empty() {
        out.push_str(&format!(
            "- overlapping dates resolved by precedence: {}\n",
            stats.overlaps.len()
        ));
    }

    out.push_str("\nSeries:\n");
    out.push_str(&format!(
        "- anomaly  n={} | {}\n",
        data.anomaly.len(),
        fmt_span(data.anomaly.rows().first().map(|r| r.date), data.anomaly.latest().map(|r| r.date)),
    ));
    out.push_str(&format!(
        "- combined n={} | {}\n",
        data.combined.len(),
        fmt_span(data.combined.rows().first().map(|r| r.date), data.combined.latest().map(|r| r.date)),
    ));
    let gaps = find_gaps(data.anomaly.rows().iter().map(|r| r.date));
    out.push_str(&format!("- anomaly gaps: {}\n", fmt_gaps(&gaps)));

    out.push_str(&format!("\nRange {}:\n", view.range));
    out.push_str(&format!(
        "- months: {} | El Niño {} | neutral {} | La Niña {} (threshold ±{:.1})\n",
        view.phases.total(),
        view.phases.el_nino,
        view.phases.neutral,
        view.phases.la_nina,
        config.threshold,
    ));
    if let Some(w) = view.warmest {
        out.push_str(&format!("- warmest: {} {:+.2}\n", fmt_month(w.date), w.anom));
    }
    if let Some(c) = view.coldest {
        out.push_str(&format!("- coldest: {} {:+.2}\n", fmt_month(c.date), c.anom));
    }
    if let Some((row, phase)) = view.latest(config.threshold) {
        out.push_str(&format!(
            "- latest:  {} {:+.2} ({})\n",
            fmt_month(row.date),
            row.anom,
            phase.display_name()
        ));
    }

    out
}

/// Format the last `limit` months of the range as a table.
///
/// `TEMP` is blank for months the operational feed does not cover.
pub fn format_recent_table(view: &RangeView<'_>, limit: usize, threshold: f64) -> String {
    let temps: HashMap<NaiveDate, f64> = view.combined.iter().map(|r| (r.date, r.temp)).collect();

    let mut out = String::new();
    out.push_str(
        format!(
            "{:<8} {:>5} {:>7} {:>7} {:<8} {:<11}\n",
            "DATE", "YEAR", "TEMP", "ANOM", "PHASE", "SOURCE"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<8} {:-<5} {:-<7} {:-<7} {:-<8} {:-<11}\n",
            "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    let start = view.anomaly.len().saturating_sub(limit);
    for r in &view.anomaly[start..] {
        let temp = temps
            .get(&r.date)
            .map(|t| format!("{t:.2}"))
            .unwrap_or_default();
        out.push_str(
            format!(
                "{:<8} {:>5} {:>7} {:>7} {:<8} {:<11}\n",
                fmt_month(r.date),
                r.year(),
                temp,
                format!("{:+.2}", r.anom),
                phase_tag(EnsoPhase::classify(r.anom, threshold)),
                r.source.label(),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

fn phase_tag(phase: EnsoPhase) -> &'static str {
    match phase {
        EnsoPhase::ElNino => "warm",
        EnsoPhase::Neutral => "neutral",
        EnsoPhase::LaNina => "cold",
    }
}

fn fmt_month(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

fn fmt_span(first: Option<NaiveDate>, last: Option<NaiveDate>) -> String {
    match (first, last) {
        (Some(a), Some(b)) => format!("{} .. {}", fmt_month(a), fmt_month(b)),
        _ => "-".to_string(),
    }
}

fn fmt_gaps(gaps: &[(NaiveDate, NaiveDate)]) -> String {
    if gaps.is_empty() {
        return "none".to_string();
    }
    let parts: Vec<String> = gaps
        .iter()
        .map(|(a, b)| format!("{}→{}", fmt_month(*a), fmt_month(*b)))
        .collect();
    parts.join(", ")
}
