//! Full load: fetch the sheet, ingest it, and derive everything the dashboard draws.

use serde::Serialize;
use tracing::{info, warn};

use crate::aggregates::{
    self, PlayerColor, PlayerGamePoint, PlayerOverview, PositionStats, RoundShare, ScoreBin,
    TeamOverview,
};
use crate::derive::{self, EnrichedRecord};
use crate::error::{LoadError, PipelineError, RecordError};
use crate::record::{self, ColumnMap, GameRecord, Ingested, Table};
use crate::source::RecordSource;
use crate::summary::{self, SessionSummary};

pub const DEFAULT_HIST_BIN: u32 = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    /// `accepted + rejected + blank`.
    pub rows_total: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Empty rows, skipped without a warning.
    pub blank: usize,
    /// Accepted rows whose date could not be placed on the timeline.
    pub undated: usize,
    pub warnings: Vec<RecordError>,
}

impl LoadReport {
    fn from_ingest(rows_total: usize, ingested: &Ingested) -> Self {
        Self {
            rows_total,
            accepted: ingested.records.len(),
            rejected: ingested.rejected(),
            blank: ingested.blank,
            undated: ingested.undated(),
            warnings: ingested.issues.clone(),
        }
    }
}

/// Derived view of one load. Rebuilt from scratch every time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub records: Vec<EnrichedRecord>,
    pub last_session: SessionSummary,
    pub positions: Vec<PositionStats>,
    pub rounds: Vec<RoundShare>,
    pub colors: Vec<PlayerColor>,
    pub team: Option<TeamOverview>,
    pub team_histogram: Vec<ScoreBin>,
    pub hist_bin: u32,
    pub report: LoadReport,
}

impl Dashboard {
    /// Players in first-appearance order.
    pub fn players(&self) -> Vec<&str> {
        self.colors.iter().map(|c| c.player.as_str()).collect()
    }

    pub fn color_of(&self, player: &str) -> Option<&str> {
        self.colors
            .iter()
            .find(|c| c.player == player)
            .map(|c| c.color.as_str())
    }

    pub fn game_records(&self) -> Vec<GameRecord> {
        self.records.iter().map(|r| r.record.clone()).collect()
    }

    pub fn player_overview(&self, player: &str) -> Option<PlayerOverview> {
        aggregates::player_overview(&self.game_records(), player)
    }

    pub fn player_rounds(&self, player: &str) -> Vec<RoundShare> {
        aggregates::round_distribution(&self.game_records(), Some(player))
    }

    pub fn player_histogram(&self, player: &str) -> Vec<ScoreBin> {
        let scores = aggregates::player_scores(&self.game_records(), Some(player));
        aggregates::score_histogram(&scores, self.hist_bin)
    }

    pub fn player_timeline(&self, player: &str) -> Vec<PlayerGamePoint> {
        aggregates::player_timeline(&self.records, player)
    }
}

/// Run every derivation over already-ingested records.
pub fn derive_dashboard(
    records: &[GameRecord],
    report: LoadReport,
    hist_bin: u32,
) -> Result<Dashboard, PipelineError> {
    if records.is_empty() {
        return Err(PipelineError::EmptyDataset);
    }
    let last_session = summary::last_session(records)?;
    let enriched = derive::enrich(records);
    let positions = aggregates::position_series(&enriched);
    let scores = aggregates::player_scores(records, None);

    Ok(Dashboard {
        last_session,
        positions,
        rounds: aggregates::round_distribution(records, None),
        colors: aggregates::assign_colors(records),
        team: aggregates::team_overview(records),
        team_histogram: aggregates::score_histogram(&scores, hist_bin),
        hist_bin,
        records: enriched,
        report,
    })
}

/// Ingest a table and derive the dashboard. Detects the column layout when `columns` is `None`.
pub fn build_dashboard(
    table: &Table,
    columns: Option<&ColumnMap>,
    hist_bin: u32,
) -> Result<Dashboard, PipelineError> {
    if table.is_empty() {
        return Err(PipelineError::EmptyDataset);
    }
    let detected;
    let columns = match columns {
        Some(c) => c,
        None => {
            detected = ColumnMap::detect(&table.headers).unwrap_or_else(|| {
                warn!(headers = ?table.headers, "unknown sheet layout, assuming czech headers");
                ColumnMap::czech()
            });
            &detected
        }
    };

    let ingested = record::ingest(table, columns);
    let report = LoadReport::from_ingest(table.rows.len(), &ingested);
    info!(
        rows = report.rows_total,
        accepted = report.accepted,
        rejected = report.rejected,
        blank = report.blank,
        undated = report.undated,
        "ingested league sheet"
    );
    derive_dashboard(&ingested.records, report, hist_bin)
}

/// Everything one load needs: the injected data source and how to read it.
pub struct LeagueContext {
    pub source: Box<dyn RecordSource + Send>,
    pub columns: Option<ColumnMap>,
    pub hist_bin: u32,
}

impl LeagueContext {
    pub fn new(source: Box<dyn RecordSource + Send>) -> Self {
        Self {
            source,
            columns: None,
            hist_bin: DEFAULT_HIST_BIN,
        }
    }

    pub fn with_columns(mut self, columns: ColumnMap) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn with_hist_bin(mut self, hist_bin: u32) -> Self {
        self.hist_bin = hist_bin.max(1);
        self
    }

    pub fn load(&self) -> Result<Dashboard, LoadError> {
        info!(source = %self.source.describe(), "loading league data");
        let table = self.source.fetch().map_err(LoadError::Source)?;
        let dashboard = build_dashboard(&table, self.columns.as_ref(), self.hist_bin)?;
        Ok(dashboard)
    }
}
