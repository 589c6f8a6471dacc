use std::path::PathBuf;

use anyhow::{Context, Result};

use bowling_dash::config::{Config, SourceKind};
use bowling_dash::logging;

/// Load the league once and print the derived dashboard as JSON.
///
/// `--csv <path>` overrides the configured source; `--summary` prints only the last session.
fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init_stderr_logging();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut config = Config::from_env();
    if let Some(path) = parse_path_arg(&args, "--csv") {
        config.source = SourceKind::Csv;
        config.csv_path = path;
    }
    let summary_only = args.iter().any(|a| a == "--summary");

    let dashboard = config
        .league_context()
        .load()
        .context("league load failed")?;

    let out = if summary_only {
        serde_json::to_string_pretty(&dashboard.last_session)
    } else {
        serde_json::to_string_pretty(&dashboard)
    }
    .context("serialize dashboard")?;
    println!("{out}");

    let report = &dashboard.report;
    if report.rejected > 0 || report.undated > 0 {
        eprintln!(
            "{} rows: {} accepted, {} rejected, {} undated",
            report.rows_total, report.accepted, report.rejected, report.undated
        );
        for warning in report.warnings.iter().take(8) {
            eprintln!(" - {warning}");
        }
    }
    Ok(())
}

fn parse_path_arg(args: &[String], flag: &str) -> Option<PathBuf> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg
            .strip_prefix(flag)
            .and_then(|rest| rest.strip_prefix('='))
        {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}
