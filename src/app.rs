//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves source settings (env + flags)
//! - runs the fetch/reconcile pipeline
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, PlotArgs, RangeArgs, ShowArgs, SourceArgs, TuiArgs};
use crate::data::SourceConfig;
use crate::domain::{DASHBOARD_DEFAULT_YEARS, DashboardConfig, ReconcileConfig, YearRange};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `enso` binary.
pub fn run() -> Result<(), AppError> {
    // We want `enso` and `enso --from 1990` to behave like `enso tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    init_tracing(&cli.log_level);

    match cli.command {
        Command::Show(args) => handle_show(args),
        Command::Plot(args) => handle_plot(args),
        Command::Tui(args) => handle_tui(args),
    }
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    // A second init (e.g. from tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let (sources, config) = source_config_from_args(&args.source)?;
    let dashboard = DashboardConfig {
        range: year_range_from_args(&args.range),
        threshold: args.threshold,
        table_rows: args.rows,
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
    };

    let run = pipeline::reconcile(&sources, &config)?;
    let view = crate::report::RangeView::new(&run.data, &dashboard)
        .ok_or_else(|| AppError::new(3, "Reconciliation produced no rows."))?;

    println!("{}", crate::report::format_run_summary(&run, &view, &dashboard));
    println!(
        "{}",
        crate::report::format_recent_table(&view, dashboard.table_rows, dashboard.threshold)
    );

    if dashboard.plot {
        println!(
            "{}",
            crate::plot::render_temperature_plot(view.combined, dashboard.plot_width, dashboard.plot_height)
        );
        println!(
            "{}",
            crate::plot::render_anomaly_plot(
                view.anomaly,
                dashboard.threshold,
                dashboard.plot_width,
                dashboard.plot_height
            )
        );
    }

    // Exports always carry the full tables, not just the displayed range.
    if let Some(path) = &args.export_anomaly {
        crate::io::write_anomaly_csv(path, run.data.anomaly.rows())?;
    }
    if let Some(path) = &args.export_combined {
        crate::io::write_combined_csv(path, run.data.combined.rows())?;
    }
    if let Some(path) = &args.export_snapshot {
        crate::io::write_snapshot_json(path, &run)?;
    }

    Ok(())
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    let (sources, config) = source_config_from_args(&args.source)?;
    let dashboard = DashboardConfig {
        range: Some(dashboard_range(&args.range)),
        threshold: args.threshold,
        ..DashboardConfig::default()
    };
    crate::tui::run(sources, config, dashboard)
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let snapshot = crate::io::read_snapshot_json(&args.snapshot)?;
    let bounds = crate::series::overall_bounds(&snapshot.anomaly, &snapshot.combined)
        .ok_or_else(|| AppError::new(3, format!("Snapshot '{}' has no rows.", args.snapshot.display())))?;
    let range = year_range_from_args(&args.range).map_or(bounds, |r| r.clamp_to(bounds));

    println!(
        "Snapshot: {} | cutoff {} | years {range}",
        args.snapshot.display(),
        snapshot.cutoff_year
    );
    let stats = &snapshot.stats;
    println!(
        "Sources: archive kept {}/{} | operational kept {}/{} | overlaps {}",
        stats.archive_kept,
        stats.archive_rows,
        stats.operational_kept,
        stats.operational_rows,
        stats.overlaps.len()
    );
    println!(
        "{}",
        crate::plot::render_temperature_plot(snapshot.combined.in_years(range), args.width, args.height)
    );
    println!(
        "{}",
        crate::plot::render_anomaly_plot(snapshot.anomaly.in_years(range), args.threshold, args.width, args.height)
    );
    Ok(())
}

/// Resolve source settings: environment first, then CLI overrides.
pub fn source_config_from_args(args: &SourceArgs) -> Result<(SourceConfig, ReconcileConfig), AppError> {
    let mut sources = SourceConfig::from_env()?;
    apply_source_args(&mut sources, args)?;
    let config = ReconcileConfig {
        cutoff_year: sources.cutoff_year,
        precedence: args.precedence,
    };
    Ok((sources, config))
}

fn apply_source_args(sources: &mut SourceConfig, args: &SourceArgs) -> Result<(), AppError> {
    if let Some(url) = &args.archive_url {
        sources.archive_url = url.clone();
    }
    if let Some(url) = &args.operational_url {
        sources.operational_url = url.clone();
    }
    if let Some(secs) = args.timeout_secs {
        sources.timeout = std::time::Duration::from_secs(secs);
    }
    if let Some(year) = args.cutoff_year {
        sources.cutoff_year = year;
    }
    sources.validate()
}

/// `--from`/`--to` as a year range; a missing side is left open.
pub fn year_range_from_args(args: &RangeArgs) -> Option<YearRange> {
    match (args.from, args.to) {
        (None, None) => None,
        (from, to) => Some(YearRange::new(from.unwrap_or(i32::MIN), to.unwrap_or(i32::MAX))),
    }
}

/// Opening range for the dashboard; clamped to the fetched data when drawn.
fn dashboard_range(args: &RangeArgs) -> YearRange {
    year_range_from_args(args).unwrap_or(DASHBOARD_DEFAULT_YEARS)
}

/// Rewrite argv so `enso` defaults to `enso tui`.
///
/// Rules:
/// - `enso`                      -> `enso tui`
/// - `enso --from 1990 ...`      -> `enso tui --from 1990 ...`
/// - `enso --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "show" | "plot" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
