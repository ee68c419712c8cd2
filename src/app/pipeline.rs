//! Shared "reconcile pipeline" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! fetch archive -> fetch operational feed -> parse both -> reconcile
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use tracing::info;

use crate::data::{SourceClient, SourceConfig, parse_archive, parse_operational};
use crate::domain::{ReconcileConfig, SourceKind};
use crate::error::{AppError, PipelineError};
use crate::series::Reconciled;

/// All computed outputs of a single reconciliation run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub data: Reconciled,
    pub sources: SourceConfig,
    pub config: ReconcileConfig,
}

/// Fetch both sources fresh and reconcile them.
///
/// The two requests run one after the other; either failing aborts the run.
pub fn reconcile(sources: &SourceConfig, config: &ReconcileConfig) -> Result<RunOutput, AppError> {
    let client = SourceClient::new(sources.clone())?;
    let archive_text = client.fetch(SourceKind::Archive)?;
    let operational_text = client.fetch(SourceKind::Operational)?;

    let data = reconcile_texts(&archive_text, &operational_text, config)?;
    Ok(RunOutput {
        data,
        sources: sources.clone(),
        config: *config,
    })
}

/// Parse and reconcile already-downloaded source documents.
///
/// Deterministic: identical inputs always produce identical tables.
pub fn reconcile_texts(
    archive_text: &str,
    operational_text: &str,
    config: &ReconcileConfig,
) -> Result<Reconciled, PipelineError> {
    let archive = parse_archive(archive_text)?;
    let operational = parse_operational(operational_text)?;
    info!(
        archive = archive.len(),
        operational = operational.len(),
        "parsed sources"
    );
    Ok(crate::series::reconcile(&archive, &operational, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::client::test_server::{closed_url, serve_once};

    const ARCHIVE: &str = "\
 2017 2018
2017  -0.3 -0.1  0.1  0.3  0.4  0.3  0.1 -0.1 -0.4 -0.6 -0.8 -0.9
2018  -0.9 -0.8 -0.6 -0.4 -0.1  0.1  0.2  0.4  0.5  0.8  0.9  0.8
  -99.99
";

    const OPERATIONAL: &str = "\
 SEAS  YR   TOTAL   ANOM
  DJF 2018  25.85  -0.92
  JFM 2018  26.05  -0.85
  DJF 2019  27.21   0.74
  JFM 2019  27.45   0.79
";

    #[test]
    fn reconciles_fixture_text() {
        let out = reconcile_texts(ARCHIVE, OPERATIONAL, &ReconcileConfig::default()).unwrap();
        assert_eq!(out.anomaly.len(), 24 + 2);
        assert_eq!(out.combined.len(), 4);
        assert_eq!(out.stats.archive_rows, 24);
        assert_eq!(out.stats.operational_rows, 4);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let a = reconcile_texts(ARCHIVE, OPERATIONAL, &ReconcileConfig::default()).unwrap();
        let b = reconcile_texts(ARCHIVE, OPERATIONAL, &ReconcileConfig::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn parse_failure_aborts() {
        let bad = OPERATIONAL.replace("27.45", "n/a");
        let err = reconcile_texts(ARCHIVE, &bad, &ReconcileConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Parse { feed: SourceKind::Operational, .. }));
    }

    fn local_sources(archive_url: String, operational_url: String) -> SourceConfig {
        SourceConfig {
            archive_url,
            operational_url,
            timeout: std::time::Duration::from_secs(5),
            ..SourceConfig::default()
        }
    }

    #[test]
    fn fetches_and_reconciles_both_sources() {
        let sources = local_sources(
            serve_once("200 OK", ARCHIVE),
            serve_once("200 OK", OPERATIONAL),
        );
        let run = reconcile(&sources, &ReconcileConfig::default()).unwrap();
        assert_eq!(run.data.anomaly.len(), 26);
        assert_eq!(run.sources, sources);
    }

    #[test]
    fn unreachable_source_aborts_with_fetch_exit_code() {
        let sources = local_sources(closed_url(), closed_url());
        let err = reconcile(&sources, &ReconcileConfig::default()).unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().contains("archive"), "{err}");
    }

    #[test]
    fn operational_failure_aborts_after_archive_succeeds() {
        let sources = local_sources(
            serve_once("200 OK", ARCHIVE),
            serve_once("503 Service Unavailable", ""),
        );
        let err = reconcile(&sources, &ReconcileConfig::default()).unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().contains("operational"), "{err}");
        assert!(err.to_string().contains("status 503"), "{err}");
    }
}
