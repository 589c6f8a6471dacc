use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::PipelineError;
use crate::record::GameRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSessionLine {
    pub player: String,
    pub games: usize,
    pub total_score: u32,
    pub best_game: u32,
    pub strikes: usize,
}

/// A player name with the value they topped a category with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leader<T> {
    pub player: String,
    pub value: T,
}

/// Everything the "last game" box shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub venue: String,
    pub date: NaiveDate,
    /// Distinct game sequences played that day.
    pub num_games: usize,
    pub num_players: usize,
    /// Sorted by player name.
    pub players: Vec<PlayerSessionLine>,
    pub team_total: u32,
    /// `team_total / (num_games * num_players)`.
    pub team_average: f64,
    pub top_scorer: Leader<u32>,
    pub top_round: Leader<u32>,
    pub top_striker: Leader<usize>,
}

pub fn last_session_date(records: &[GameRecord]) -> Option<NaiveDate> {
    records.iter().filter_map(|r| r.date).max()
}

/// Summarise the most recent date in the data.
///
/// Ties in any "top" category go to the alphabetically first player.
pub fn last_session(records: &[GameRecord]) -> Result<SessionSummary, PipelineError> {
    if records.is_empty() {
        return Err(PipelineError::EmptyDataset);
    }
    let date = last_session_date(records).ok_or(PipelineError::NoValidData)?;
    let session: Vec<&GameRecord> = records.iter().filter(|r| r.date == Some(date)).collect();

    // `session` is non-empty: `date` came from one of its records.
    let venue = session
        .first()
        .map(|r| r.venue.clone())
        .unwrap_or_default();
    let num_games = session
        .iter()
        .map(|r| r.game_sequence)
        .collect::<BTreeSet<_>>()
        .len();

    let mut per_player: BTreeMap<&str, PlayerSessionLine> = BTreeMap::new();
    for rec in &session {
        let line = per_player
            .entry(rec.player.as_str())
            .or_insert_with(|| PlayerSessionLine {
                player: rec.player.clone(),
                games: 0,
                total_score: 0,
                best_game: 0,
                strikes: 0,
            });
        line.games += 1;
        line.total_score = line.total_score.saturating_add(rec.final_score);
        line.best_game = line.best_game.max(rec.final_score);
        line.strikes += rec.strikes();
    }
    let players: Vec<PlayerSessionLine> = per_player.into_values().collect();

    let team_total = players
        .iter()
        .fold(0u32, |acc, p| acc.saturating_add(p.total_score));
    let slots = num_games * players.len();
    let team_average = if slots == 0 {
        0.0
    } else {
        f64::from(team_total) / slots as f64
    };

    let top_scorer = leader(&players, |p| p.total_score);
    let top_round = leader(&players, |p| p.best_game);
    let top_striker = leader(&players, |p| p.strikes);

    Ok(SessionSummary {
        venue,
        date,
        num_games,
        num_players: players.len(),
        players,
        team_total,
        team_average,
        top_scorer,
        top_round,
        top_striker,
    })
}

fn leader<T, F>(players: &[PlayerSessionLine], value: F) -> Leader<T>
where
    T: Ord + Copy + Default,
    F: Fn(&PlayerSessionLine) -> T,
{
    let mut best: Option<&PlayerSessionLine> = None;
    for p in players {
        match best {
            Some(b) if value(p) <= value(b) => {}
            _ => best = Some(p),
        }
    }
    best.map(|p| Leader {
        player: p.player.clone(),
        value: value(p),
    })
    .unwrap_or_else(|| Leader {
        player: String::new(),
        value: T::default(),
    })
}
