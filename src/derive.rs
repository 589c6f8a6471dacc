use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::record::GameRecord;

/// A record plus the fields derived from the whole dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: GameRecord,
    /// Continuous game index across all dates. `None` for undated records.
    pub absolute_game_position: Option<u32>,
    /// Player's running mean score up to and including this game.
    pub cumulative_avg_score: f64,
    /// Competition rank among records at the same absolute position. `None` for undated records.
    pub rank_within_position: Option<u32>,
}

/// Offset of each valid date in the league timeline.
///
/// Dates are walked in ascending order; each one starts where the previous one ended, i.e. after
/// the highest game sequence played that day. Sequences with holes leave gaps in positions.
pub fn date_offsets(records: &[GameRecord]) -> BTreeMap<NaiveDate, u32> {
    let mut games_per_date: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    for rec in records {
        let Some(date) = rec.date else { continue };
        let max = games_per_date.entry(date).or_insert(0);
        *max = (*max).max(rec.game_sequence);
    }

    let mut offsets = BTreeMap::new();
    let mut running = 0u32;
    for (date, games) in games_per_date {
        offsets.insert(date, running);
        running = running.saturating_add(games);
    }
    offsets
}

pub fn absolute_positions(records: &[GameRecord]) -> Vec<Option<u32>> {
    let offsets = date_offsets(records);
    records
        .iter()
        .map(|rec| {
            rec.date
                .and_then(|d| offsets.get(&d))
                .map(|offset| offset.saturating_add(rec.game_sequence))
        })
        .collect()
}

/// Expanding mean per player, chronological (date, then game sequence).
///
/// Undated records follow all dated ones; equal keys keep input order.
pub fn cumulative_averages(records: &[GameRecord]) -> Vec<f64> {
    let mut by_player: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, rec) in records.iter().enumerate() {
        by_player.entry(rec.player.as_str()).or_default().push(idx);
    }

    let mut out = vec![0.0; records.len()];
    for (_, mut indices) in by_player {
        // sort_by_key is stable
        indices.sort_by_key(|&i| {
            let rec = &records[i];
            (rec.date.is_none(), rec.date, rec.game_sequence)
        });
        let mut total = 0u64;
        for (n, idx) in indices.into_iter().enumerate() {
            total += u64::from(records[idx].final_score);
            out[idx] = total as f64 / (n + 1) as f64;
        }
    }
    out
}

/// Standard competition ranking ("min" ties) of scores within each position, highest first.
pub fn ranks_within_position(
    records: &[GameRecord],
    positions: &[Option<u32>],
) -> Vec<Option<u32>> {
    let mut scores_at: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for (rec, pos) in records.iter().zip(positions) {
        if let Some(pos) = pos {
            scores_at.entry(*pos).or_default().push(rec.final_score);
        }
    }

    records
        .iter()
        .zip(positions)
        .map(|(rec, pos)| {
            let scores = scores_at.get(pos.as_ref()?)?;
            let higher = scores.iter().filter(|&&s| s > rec.final_score).count();
            Some(higher as u32 + 1)
        })
        .collect()
}

pub fn enrich(records: &[GameRecord]) -> Vec<EnrichedRecord> {
    let positions = absolute_positions(records);
    let averages = cumulative_averages(records);
    let ranks = ranks_within_position(records, &positions);

    records
        .iter()
        .zip(positions)
        .zip(averages)
        .zip(ranks)
        .map(|(((rec, pos), avg), rank)| EnrichedRecord {
            record: rec.clone(),
            absolute_game_position: pos,
            cumulative_avg_score: avg,
            rank_within_position: rank,
        })
        .collect()
}

pub fn distinct_dates(records: &[GameRecord]) -> BTreeSet<NaiveDate> {
    records.iter().filter_map(|r| r.date).collect()
}
