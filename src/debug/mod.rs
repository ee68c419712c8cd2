//! Debug bundle writer for inspecting a reconciliation run.
//!
//! The bundle is a markdown file under `debug/` describing where the data came
//! from, what the merge kept or dropped, and how the selected range looks.

use std::fmt::Write as _;
use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::app::pipeline::RunOutput;
use crate::domain::{DashboardConfig, EnsoPhase};
use crate::error::AppError;
use crate::report::RangeView;
use crate::series::find_gaps;

/// Write a bundle to `./debug/` and return its path.
pub fn write_debug_bundle(run: &RunOutput, dashboard: &DashboardConfig) -> Result<PathBuf, AppError> {
    write_debug_bundle_in(Path::new("debug"), run, dashboard)
}

pub fn write_debug_bundle_in(dir: &Path, run: &RunOutput, dashboard: &DashboardConfig) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::new(4, format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("enso_debug_cutoff{}_{ts}.md", run.config.cutoff_year));

    let mut file = File::create(&path)
        .map_err(|e| AppError::new(4, format!("Failed to create debug file: {e}")))?;
    file.write_all(render_debug_markdown(run, dashboard).as_bytes())
        .map_err(|e| AppError::new(4, format!("Failed to write debug bundle: {e}")))?;

    Ok(path)
}

/// Markdown body of the bundle (everything except the file name).
pub fn render_debug_markdown(run: &RunOutput, dashboard: &DashboardConfig) -> String {
    let mut out = String::new();
    let stats = &run.data.stats;

    // Writing into a String cannot fail.
    let _ = writeln!(out, "# enso debug bundle");
    let _ = writeln!(out, "- generated: {}", Local::now().to_rfc3339());
    let _ = writeln!(out, "- archive_url: {}", run.sources.archive_url);
    let _ = writeln!(out, "- operational_url: {}", run.sources.operational_url);
    let _ = writeln!(out, "- timeout_secs: {}", run.sources.timeout.as_secs());
    let _ = writeln!(out, "- cutoff_year: {}", run.config.cutoff_year);
    let _ = writeln!(out, "- precedence: {:?}", run.config.precedence);
    let _ = writeln!(out, "- threshold: {:.2}", dashboard.threshold);

    let _ = writeln!(out, "\n## Sources");
    let _ = writeln!(out, "| source | rows | kept |");
    let _ = writeln!(out, "| - | - | - |");
    let _ = writeln!(out, "| archive | {} | {} |", stats.archive_rows, stats.archive_kept);
    let _ = writeln!(out, "| operational | {} | {} |", stats.operational_rows, stats.operational_kept);

    let _ = writeln!(out, "\n## Merge");
    let _ = writeln!(out, "- anomaly rows: {}", run.data.anomaly.len());
    let _ = writeln!(out, "- combined rows: {}", run.data.combined.len());
    let _ = writeln!(out, "- repeated dates dropped (anomaly): {}", stats.anomaly_duplicates);
    let _ = writeln!(out, "- repeated dates dropped (combined): {}", stats.combined_duplicates);
    if stats.overlaps.is_empty() {
        let _ = writeln!(out, "- overlapping dates: none");
    } else {
        let dates: Vec<String> = stats.overlaps.iter().map(|d| d.format("%Y-%m").to_string()).collect();
        let _ = writeln!(out, "- overlapping dates: {}", dates.join(", "));
    }

    let _ = writeln!(out, "\n## Gaps");
    write_gaps(&mut out, "anomaly", find_gaps(run.data.anomaly.rows().iter().map(|r| r.date)));
    write_gaps(&mut out, "combined", find_gaps(run.data.combined.rows().iter().map(|r| r.date)));

    let Some(view) = RangeView::new(&run.data, dashboard) else {
        let _ = writeln!(out, "\n## Range\n- no rows");
        return out;
    };

    let _ = writeln!(out, "\n## Range {}", view.range);
    let _ = writeln!(out, "| phase | months |");
    let _ = writeln!(out, "| - | - |");
    let _ = writeln!(out, "| {} | {} |", EnsoPhase::ElNino.display_name(), view.phases.el_nino);
    let _ = writeln!(out, "| {} | {} |", EnsoPhase::Neutral.display_name(), view.phases.neutral);
    let _ = writeln!(out, "| {} | {} |", EnsoPhase::LaNina.display_name(), view.phases.la_nina);

    let _ = writeln!(out, "\n### Last 24 months");
    let _ = writeln!(out, "| date | anom | phase | source |");
    let _ = writeln!(out, "| - | - | - | - |");
    let start = view.anomaly.len().saturating_sub(24);
    for r in &view.anomaly[start..] {
        let _ = writeln!(
            out,
            "| {} | {:+.2} | {} | {} |",
            r.date.format("%Y-%m"),
            r.anom,
            EnsoPhase::classify(r.anom, dashboard.threshold).display_name(),
            r.source
        );
    }

    out
}

fn write_gaps(out: &mut String, label: &str, gaps: Vec<(chrono::NaiveDate, chrono::NaiveDate)>) {
    if gaps.is_empty() {
        let _ = writeln!(out, "- {label}: none");
        return;
    }
    for (a, b) in gaps {
        let _ = writeln!(out, "- {label}: {} → {}", a.format("%Y-%m"), b.format("%Y-%m"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::reconcile_texts;
    use crate::data::SourceConfig;
    use crate::domain::ReconcileConfig;

    const ARCHIVE: &str = "\
2018  -0.9 -0.8 -0.6 -0.4 -0.1  0.1  0.2  0.4  0.5  0.8  0.9  0.8
";

    const OPERATIONAL: &str = "\
 SEAS  YR   TOTAL   ANOM
  DJF 2019  27.21   0.74
  JFM 2019  27.45   0.79
";

    fn run() -> RunOutput {
        RunOutput {
            data: reconcile_texts(ARCHIVE, OPERATIONAL, &ReconcileConfig::default()).unwrap(),
            sources: SourceConfig::default(),
            config: ReconcileConfig::default(),
        }
    }

    #[test]
    fn markdown_lists_sources_and_phases() {
        let md = render_debug_markdown(&run(), &DashboardConfig::default());
        assert!(md.starts_with("# enso debug bundle\n"));
        assert!(md.contains("| archive | 12 | 12 |"), "{md}");
        assert!(md.contains("| operational | 2 | 2 |"), "{md}");
        assert!(md.contains("- overlapping dates: none"), "{md}");
        assert!(md.contains("- anomaly: none"), "{md}");
        assert!(md.contains("## Range 2018–2019"), "{md}");
        // 2018-09 (0.5) through 2019-02 are warm.
        assert!(md.contains("| El Niño | 6 |"), "{md}");
        assert!(md.contains("| 2019-02 | +0.79 | El Niño | operational |"), "{md}");
    }

    #[test]
    fn bundle_is_written_to_the_given_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_debug_bundle_in(dir.path(), &run(), &DashboardConfig::default()).unwrap();
        assert!(path.starts_with(dir.path()));
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("- cutoff_year: 2019"));
    }
}
