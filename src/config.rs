use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::dashboard::{DEFAULT_HIST_BIN, LeagueContext};
use crate::source::{CsvFileSource, DemoSource, RecordSource, SheetCsvSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Csv,
    Sheet,
    Demo,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub source: SourceKind,
    pub csv_path: PathBuf,
    pub sheet_url: Option<String>,
    pub http_timeout: Duration,
    pub hist_bin: u32,
    pub team_name: String,
    pub export_path: PathBuf,
    pub demo_players: usize,
    pub demo_sessions: usize,
    pub demo_seed: u64,
    pub log_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceKind::Demo,
            csv_path: PathBuf::from("bowling.csv"),
            sheet_url: None,
            http_timeout: Duration::from_secs(10),
            hist_bin: DEFAULT_HIST_BIN,
            team_name: "Duto Duto".to_string(),
            export_path: PathBuf::from("bowling_report.xlsx"),
            demo_players: 5,
            demo_sessions: 6,
            demo_seed: 7,
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl Config {
    /// Read `BOWLING_*` variables. Anything missing or unparseable keeps its default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let sheet_url = opt_env("BOWLING_SHEET_URL");
        let csv_path = opt_env("BOWLING_CSV_PATH").map(PathBuf::from);

        // Without an explicit choice, use whatever is configured, falling back to the demo league.
        let source = match opt_env("BOWLING_SOURCE").map(|s| s.to_lowercase()).as_deref() {
            Some("csv") => SourceKind::Csv,
            Some("sheet") => SourceKind::Sheet,
            Some("demo") => SourceKind::Demo,
            _ if sheet_url.is_some() => SourceKind::Sheet,
            _ if csv_path.is_some() => SourceKind::Csv,
            _ => defaults.source,
        };

        Self {
            source,
            csv_path: csv_path.unwrap_or(defaults.csv_path),
            sheet_url,
            http_timeout: Duration::from_secs(
                parse_env("BOWLING_HTTP_TIMEOUT_SECS")
                    .unwrap_or(defaults.http_timeout.as_secs())
                    .clamp(1, 120),
            ),
            hist_bin: parse_env("BOWLING_HIST_BIN")
                .unwrap_or(defaults.hist_bin)
                .clamp(1, 100),
            team_name: opt_env("BOWLING_TEAM_NAME").unwrap_or(defaults.team_name),
            export_path: opt_env("BOWLING_EXPORT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.export_path),
            demo_players: parse_env("BOWLING_DEMO_PLAYERS")
                .unwrap_or(defaults.demo_players)
                .clamp(1, 12),
            demo_sessions: parse_env("BOWLING_DEMO_SESSIONS")
                .unwrap_or(defaults.demo_sessions)
                .clamp(1, 52),
            demo_seed: parse_env("BOWLING_DEMO_SEED").unwrap_or(defaults.demo_seed),
            log_dir: opt_env("BOWLING_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
        }
    }

    pub fn record_source(&self) -> Box<dyn RecordSource + Send> {
        match (self.source, &self.sheet_url) {
            (SourceKind::Sheet, Some(url)) => {
                Box::new(SheetCsvSource::new(url.clone(), self.http_timeout))
            }
            (SourceKind::Csv, _) => Box::new(CsvFileSource::new(self.csv_path.clone())),
            (kind, _) => {
                if kind == SourceKind::Sheet {
                    warn!("BOWLING_SHEET_URL is not set, using the demo league");
                }
                Box::new(DemoSource {
                    players: self.demo_players,
                    sessions: self.demo_sessions,
                    seed: self.demo_seed,
                })
            }
        }
    }

    pub fn league_context(&self) -> LeagueContext {
        LeagueContext::new(self.record_source()).with_hist_bin(self.hist_bin)
    }
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .and_then(|val| if val.trim().is_empty() { None } else { Some(val.trim().to_string()) })
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    opt_env(key).and_then(|val| val.parse::<T>().ok())
}
