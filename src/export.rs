use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};
use tracing::info;

use crate::dashboard::Dashboard;
use crate::derive::EnrichedRecord;

pub struct ExportReport {
    pub games: usize,
    pub positions: usize,
    pub rounds: usize,
}

/// Write the derived data to an XLSX workbook. A report only, nothing reads it back.
pub fn export_dashboard(path: &Path, dashboard: &Dashboard) -> Result<ExportReport> {
    let mut games_rows = vec![vec![
        "Row".to_string(),
        "Player".to_string(),
        "Venue".to_string(),
        "Date".to_string(),
        "Game".to_string(),
        "Score".to_string(),
        "Strikes".to_string(),
        "Spares".to_string(),
        "Absolute Position".to_string(),
        "Cumulative Avg".to_string(),
        "Rank".to_string(),
    ]];
    games_rows.extend(dashboard.records.iter().map(game_row));

    let session = &dashboard.last_session;
    let mut session_rows = vec![
        vec!["Venue".to_string(), session.venue.clone()],
        vec!["Date".to_string(), session.date.format("%d/%m/%Y").to_string()],
        vec!["Games".to_string(), session.num_games.to_string()],
        vec!["Team Total".to_string(), session.team_total.to_string()],
        vec!["Team Average".to_string(), format!("{:.2}", session.team_average)],
        vec![
            "Top Player".to_string(),
            format!("{} - {}", session.top_scorer.player, session.top_scorer.value),
        ],
        vec![
            "Top Round".to_string(),
            format!("{} - {}", session.top_round.player, session.top_round.value),
        ],
        vec![
            "Top Strikes".to_string(),
            format!("{} - {}", session.top_striker.player, session.top_striker.value),
        ],
        Vec::new(),
        vec![
            "Player".to_string(),
            "Games".to_string(),
            "Total".to_string(),
            "Best".to_string(),
            "Strikes".to_string(),
        ],
    ];
    session_rows.extend(session.players.iter().map(|p| {
        vec![
            p.player.clone(),
            p.games.to_string(),
            p.total_score.to_string(),
            p.best_game.to_string(),
            p.strikes.to_string(),
        ]
    }));

    let mut position_rows = vec![vec![
        "Position".to_string(),
        "Players".to_string(),
        "Mean".to_string(),
        "Min".to_string(),
        "Max".to_string(),
    ]];
    position_rows.extend(dashboard.positions.iter().map(|p| {
        vec![
            p.position.to_string(),
            p.players.to_string(),
            format!("{:.2}", p.mean),
            p.min.to_string(),
            p.max.to_string(),
        ]
    }));

    let mut round_rows = vec![vec![
        "Result".to_string(),
        "Count".to_string(),
        "Percent".to_string(),
    ]];
    round_rows.extend(dashboard.rounds.iter().map(|r| {
        vec![r.label.clone(), r.count.to_string(), format!("{:.2}", r.percent)]
    }));

    let mut workbook = Workbook::new();
    write_sheet(&mut workbook, "Games", &games_rows)?;
    write_sheet(&mut workbook, "Last Session", &session_rows)?;
    write_sheet(&mut workbook, "Positions", &position_rows)?;
    write_sheet(&mut workbook, "Rounds", &round_rows)?;
    workbook
        .save(path)
        .with_context(|| format!("save workbook {}", path.display()))?;

    info!(path = %path.display(), games = dashboard.records.len(), "exported workbook");
    Ok(ExportReport {
        games: dashboard.records.len(),
        positions: dashboard.positions.len(),
        rounds: dashboard.rounds.len(),
    })
}

fn game_row(rec: &EnrichedRecord) -> Vec<String> {
    let r = &rec.record;
    vec![
        r.row.to_string(),
        r.player.clone(),
        r.venue.clone(),
        r.date
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_else(|| r.date_raw.clone()),
        r.game_sequence.to_string(),
        r.final_score.to_string(),
        r.strikes().to_string(),
        r.spares().to_string(),
        opt_to_string(rec.absolute_game_position),
        format!("{:.2}", rec.cumulative_avg_score),
        opt_to_string(rec.rank_within_position),
    ]
}

fn opt_to_string<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_sheet(workbook: &mut Workbook, name: &str, rows: &[Vec<String>]) -> Result<()> {
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(name)
        .with_context(|| format!("name sheet {name}"))?;
    write_rows(worksheet, rows)
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
