use std::collections::BTreeMap;

use serde::Serialize;

use crate::derive::EnrichedRecord;
use crate::record::GameRecord;

/// Plotly's qualitative palette, used so colors match the old web charts.
pub const PALETTE: [&str; 10] = [
    "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A", "#19D3F3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionStats {
    pub position: u32,
    pub players: usize,
    pub mean: f64,
    pub min: u32,
    pub max: u32,
}

/// Mean/min/max score at every absolute game position, ascending.
pub fn position_series(records: &[EnrichedRecord]) -> Vec<PositionStats> {
    let mut grouped: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for rec in records {
        if let Some(pos) = rec.absolute_game_position {
            grouped.entry(pos).or_default().push(rec.record.final_score);
        }
    }
    grouped
        .into_iter()
        .filter_map(|(position, scores)| {
            let min = *scores.iter().min()?;
            let max = *scores.iter().max()?;
            let total: u64 = scores.iter().map(|&s| u64::from(s)).sum();
            Some(PositionStats {
                position,
                players: scores.len(),
                mean: total as f64 / scores.len() as f64,
                min,
                max,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundShare {
    pub label: String,
    pub count: usize,
    pub percent: f64,
}

/// How often each frame label occurs, as a share of all frame observations.
///
/// Pass a player to restrict the tally to their games. Sorted by count, most frequent first.
pub fn round_distribution(records: &[GameRecord], player: Option<&str>) -> Vec<RoundShare> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for rec in records {
        if player.is_some_and(|p| p != rec.player) {
            continue;
        }
        for frame in &rec.frames {
            *counts.entry(frame.label()).or_default() += 1;
        }
    }

    let total: usize = counts.values().sum();
    if total == 0 {
        return Vec::new();
    }
    let mut shares: Vec<RoundShare> = counts
        .into_iter()
        .map(|(label, count)| RoundShare {
            label,
            count,
            percent: count as f64 / total as f64 * 100.0,
        })
        .collect();
    // Stable: equal counts stay in label order.
    shares.sort_by(|a, b| b.count.cmp(&a.count));
    shares
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerColor {
    pub player: String,
    pub color: String,
}

/// Players in first-appearance order, each with `PALETTE[i % len]`.
pub fn assign_colors(records: &[GameRecord]) -> Vec<PlayerColor> {
    players_in_order(records)
        .into_iter()
        .enumerate()
        .map(|(i, player)| PlayerColor {
            player,
            color: PALETTE[i % PALETTE.len()].to_string(),
        })
        .collect()
}

pub fn players_in_order(records: &[GameRecord]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for rec in records {
        if !seen.iter().any(|p| *p == rec.player) {
            seen.push(rec.player.clone());
        }
    }
    seen
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamOverview {
    pub best_player: String,
    pub best_score: u32,
    pub worst_player: String,
    pub worst_score: u32,
    pub average: f64,
}

/// Best and worst single game over the whole history. The earliest row wins ties.
pub fn team_overview(records: &[GameRecord]) -> Option<TeamOverview> {
    let first = records.first()?;
    let mut best = first;
    let mut worst = first;
    let mut total = 0u64;
    for rec in records {
        if rec.final_score > best.final_score {
            best = rec;
        }
        if rec.final_score < worst.final_score {
            worst = rec;
        }
        total += u64::from(rec.final_score);
    }
    Some(TeamOverview {
        best_player: best.player.clone(),
        best_score: best.final_score,
        worst_player: worst.player.clone(),
        worst_score: worst.final_score,
        average: (total as f64 / records.len() as f64).round_ties_even(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerOverview {
    pub player: String,
    pub games: usize,
    pub best: u32,
    pub worst: u32,
    pub average: f64,
}

pub fn player_overview(records: &[GameRecord], player: &str) -> Option<PlayerOverview> {
    let scores: Vec<u32> = records
        .iter()
        .filter(|r| r.player == player)
        .map(|r| r.final_score)
        .collect();
    let best = *scores.iter().max()?;
    let worst = *scores.iter().min()?;
    let total: u64 = scores.iter().map(|&s| u64::from(s)).sum();
    Some(PlayerOverview {
        player: player.to_string(),
        games: scores.len(),
        best,
        worst,
        average: (total as f64 / scores.len() as f64).round_ties_even(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreBin {
    pub start: u32,
    pub end: u32,
    pub count: usize,
}

impl ScoreBin {
    pub fn label(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

/// Most bins a histogram will produce; wider spans get wider bins.
pub const MAX_BINS: u32 = 1000;

/// Fixed-width bins from the lowest score up to and including the highest one.
pub fn score_histogram(scores: &[u32], bin_size: u32) -> Vec<ScoreBin> {
    let (Some(&lo), Some(&hi)) = (scores.iter().min(), scores.iter().max()) else {
        return Vec::new();
    };
    let bin_size = bin_size.max(1).max((hi - lo) / MAX_BINS + 1);
    let mut bins: Vec<ScoreBin> = (lo..=hi)
        .step_by(bin_size as usize)
        .map(|start| ScoreBin {
            start,
            end: start.saturating_add(bin_size - 1),
            count: 0,
        })
        .collect();
    for &score in scores {
        let idx = ((score - lo) / bin_size) as usize;
        if let Some(bin) = bins.get_mut(idx) {
            bin.count += 1;
        }
    }
    bins
}

pub fn player_scores(records: &[GameRecord], player: Option<&str>) -> Vec<u32> {
    records
        .iter()
        .filter(|r| player.is_none_or(|p| p == r.player))
        .map(|r| r.final_score)
        .collect()
}

/// Per-game chart point for one player, keyed by absolute position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerGamePoint {
    pub position: u32,
    pub score: u32,
    pub cumulative_avg: f64,
    pub rank: Option<u32>,
    pub strikes: usize,
    pub spares: usize,
}

/// One player's dated games in timeline order.
pub fn player_timeline(records: &[EnrichedRecord], player: &str) -> Vec<PlayerGamePoint> {
    let mut points: Vec<PlayerGamePoint> = records
        .iter()
        .filter(|r| r.record.player == player)
        .filter_map(|r| {
            Some(PlayerGamePoint {
                position: r.absolute_game_position?,
                score: r.record.final_score,
                cumulative_avg: r.cumulative_avg_score,
                rank: r.rank_within_position,
                strikes: r.record.strikes(),
                spares: r.record.spares(),
            })
        })
        .collect();
    points.sort_by_key(|p| p.position);
    points
}
