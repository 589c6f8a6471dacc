use std::fmt;
use std::io::Read;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::RecordError;

/// In-memory tabular input: one header row plus string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// 1-based rows whose bytes were not valid UTF-8. Their cells hold a lossy decoding.
    pub undecodable: Vec<usize>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            headers,
            rows,
            undecodable: Vec::new(),
        }
    }

    /// Read a CSV export. A row with broken encoding is kept for ingest to reject, it does not
    /// fail the whole table.
    pub fn from_csv_reader<R: Read>(rdr: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(rdr);
        let headers = reader
            .byte_headers()
            .context("read csv header row")?
            .iter()
            .map(|h| String::from_utf8_lossy(h).into_owned())
            .collect();
        let mut table = Self::new(headers, Vec::new());
        for (idx, result) in reader.byte_records().enumerate() {
            let record = result.with_context(|| format!("read csv row {}", idx + 1))?;
            let strict: Result<Vec<String>, _> = record
                .iter()
                .map(|f| std::str::from_utf8(f).map(str::to_string))
                .collect();
            let cells = match strict {
                Ok(cells) => cells,
                Err(_) => {
                    table.undecodable.push(idx + 1);
                    record
                        .iter()
                        .map(|f| String::from_utf8_lossy(f).into_owned())
                        .collect()
                }
            };
            table.rows.push(cells);
        }
        Ok(table)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Which header names carry which field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub player: String,
    pub venue: String,
    pub date: String,
    pub game_sequence: String,
    pub final_score: String,
    /// Substring marking a per-frame column.
    pub frame_marker: String,
    /// Headers containing this are score columns, never frame columns.
    pub frame_exclude: String,
}

impl ColumnMap {
    pub fn czech() -> Self {
        Self {
            player: "Hráč".to_string(),
            venue: "Podnik".to_string(),
            date: "Den".to_string(),
            game_sequence: "Pořadové č. hry".to_string(),
            final_score: "Skóre 10. kolo".to_string(),
            frame_marker: "kolo".to_string(),
            frame_exclude: "Skóre".to_string(),
        }
    }

    pub fn english() -> Self {
        Self {
            player: "Player".to_string(),
            venue: "Venue".to_string(),
            date: "Date".to_string(),
            game_sequence: "Game".to_string(),
            final_score: "Score".to_string(),
            frame_marker: "Frame".to_string(),
            frame_exclude: "Score".to_string(),
        }
    }

    /// Pick the layout whose player and score columns are present.
    pub fn detect(headers: &[String]) -> Option<Self> {
        [Self::czech(), Self::english()].into_iter().find(|map| {
            map.index_of(headers, &map.player).is_some()
                && map.index_of(headers, &map.final_score).is_some()
        })
    }

    fn index_of(&self, headers: &[String], name: &str) -> Option<usize> {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    }

    fn frame_columns(&self, headers: &[String]) -> Vec<usize> {
        headers
            .iter()
            .enumerate()
            .filter(|(_, h)| {
                let h = h.trim();
                h.contains(self.frame_marker.as_str())
                    && !h.contains(self.frame_exclude.as_str())
                    && !h.eq_ignore_ascii_case(&self.final_score)
            })
            .map(|(idx, _)| idx)
            .collect()
    }
}

/// Outcome label of a single frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FrameResult {
    Strike,
    Spare,
    Pins(u8),
    Other(String),
}

impl FrameResult {
    /// Blank cells are not frame observations.
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }
        if s.eq_ignore_ascii_case("strike") || s.eq_ignore_ascii_case("x") {
            return Some(FrameResult::Strike);
        }
        if s.eq_ignore_ascii_case("spare") || s == "/" {
            return Some(FrameResult::Spare);
        }
        if s == "-" {
            return Some(FrameResult::Pins(0));
        }
        if let Ok(n) = s.parse::<u8>()
            && n <= 10
        {
            return Some(FrameResult::Pins(n));
        }
        Some(FrameResult::Other(s.to_string()))
    }

    pub fn label(&self) -> String {
        match self {
            FrameResult::Strike => "Strike".to_string(),
            FrameResult::Spare => "Spare".to_string(),
            FrameResult::Pins(n) => n.to_string(),
            FrameResult::Other(s) => s.clone(),
        }
    }
}

impl fmt::Display for FrameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// One player's game on one date, as read from the sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameRecord {
    /// 1-based data row in the source table.
    pub row: usize,
    pub player: String,
    pub venue: String,
    /// `None` when the source text could not be parsed.
    pub date: Option<NaiveDate>,
    pub date_raw: String,
    pub game_sequence: u32,
    pub frames: Vec<FrameResult>,
    pub final_score: u32,
}

impl GameRecord {
    pub fn count_frames(&self, wanted: &FrameResult) -> usize {
        self.frames.iter().filter(|f| *f == wanted).count()
    }

    pub fn strikes(&self) -> usize {
        self.count_frames(&FrameResult::Strike)
    }

    pub fn spares(&self) -> usize {
        self.count_frames(&FrameResult::Spare)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Ingested {
    pub records: Vec<GameRecord>,
    pub issues: Vec<RecordError>,
    /// Rows with no content at all. Skipped without an issue.
    pub blank: usize,
}

impl Ingested {
    pub fn rejected(&self) -> usize {
        self.issues.iter().filter(|e| e.is_rejection()).count()
    }

    pub fn undated(&self) -> usize {
        self.records.iter().filter(|r| r.date.is_none()).count()
    }
}

/// A perfect game.
pub const MAX_SCORE: u32 = 300;

/// Upper bound on game numbers within one date.
pub const MAX_GAMES_PER_DATE: u32 = 100;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d", "%Y.%m.%d",
];

const DATETIME_SUFFIXES: &[&str] = &["%H:%M:%S", "%H:%M"];

/// Parse a sheet date, day-first. Whitespace is ignored so `5. 11. 2024` reads like `5.11.2024`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(&compact, fmt) {
            return Some(d);
        }
    }

    // Date followed by a time of day; the last whitespace-separated token is the time.
    let spaced = raw.split_whitespace().collect::<Vec<_>>();
    if let Some((time, date_parts)) = spaced.split_last() {
        let date: String = date_parts.concat();
        for fmt in DATE_FORMATS {
            for suffix in DATETIME_SUFFIXES {
                let pattern = format!("{fmt} {suffix}");
                if let Ok(dt) = NaiveDateTime::parse_from_str(&format!("{date} {time}"), &pattern) {
                    return Some(dt.date());
                }
            }
        }
    }
    None
}

fn parse_count(raw: &str) -> Option<u32> {
    let s = raw.trim();
    if let Ok(n) = s.parse::<u32>() {
        return Some(n);
    }
    // Spreadsheet exports sometimes render integers as `180.0`.
    let f = s.replace(',', ".").parse::<f64>().ok()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 {
        Some(f as u32)
    } else {
        None
    }
}

/// Turn table rows into records. Bad rows are skipped and reported, never fatal.
pub fn ingest(table: &Table, columns: &ColumnMap) -> Ingested {
    let headers = &table.headers;
    let col_player = columns.index_of(headers, &columns.player);
    let col_venue = columns.index_of(headers, &columns.venue);
    let col_date = columns.index_of(headers, &columns.date);
    let col_game = columns.index_of(headers, &columns.game_sequence);
    let col_score = columns.index_of(headers, &columns.final_score);
    let frame_cols = columns.frame_columns(headers);
    debug!(frames = frame_cols.len(), rows = table.rows.len(), "ingesting table");

    let mut out = Ingested::default();
    for (idx, cells) in table.rows.iter().enumerate() {
        let row = idx + 1;
        let cell = |col: Option<usize>| col.and_then(|c| cells.get(c)).map(|s| s.trim());

        if cells.iter().all(|c| c.trim().is_empty()) {
            out.blank += 1;
            continue;
        }
        if table.undecodable.contains(&row) {
            reject(&mut out, row, "row", "not valid UTF-8");
            continue;
        }

        let player = match cell(col_player) {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => {
                reject(&mut out, row, "player", "missing value");
                continue;
            }
        };
        let final_score = match cell(col_score).map(|s| (s, parse_count(s))) {
            Some((_, Some(score))) if score <= MAX_SCORE => score,
            Some((_, Some(score))) => {
                reject(&mut out, row, "final_score", &format!("{score} is above {MAX_SCORE}"));
                continue;
            }
            Some((raw, None)) if !raw.is_empty() => {
                reject(&mut out, row, "final_score", &format!("not an integer: {raw:?}"));
                continue;
            }
            _ => {
                reject(&mut out, row, "final_score", "missing value");
                continue;
            }
        };
        let game_sequence = match cell(col_game).map(|s| (s, parse_count(s))) {
            Some((_, Some(seq))) if (1..=MAX_GAMES_PER_DATE).contains(&seq) => seq,
            Some((raw, _)) if !raw.is_empty() => {
                reject(
                    &mut out,
                    row,
                    "game_sequence",
                    &format!("not in 1..={MAX_GAMES_PER_DATE}: {raw:?}"),
                );
                continue;
            }
            _ => {
                reject(&mut out, row, "game_sequence", "missing value");
                continue;
            }
        };

        let date_raw = cell(col_date).unwrap_or_default().to_string();
        let date = parse_date(&date_raw);
        if date.is_none() {
            debug!(row, raw = %date_raw, "date left unplaced");
            out.issues.push(RecordError::UnparseableDate {
                row,
                raw: date_raw.clone(),
            });
        }

        let frames = frame_cols
            .iter()
            .filter_map(|&c| cells.get(c))
            .filter_map(|raw| FrameResult::parse(raw))
            .collect();

        out.records.push(GameRecord {
            row,
            player,
            venue: cell(col_venue).unwrap_or_default().to_string(),
            date,
            date_raw,
            game_sequence,
            frames,
            final_score,
        });
    }
    out
}

fn reject(out: &mut Ingested, row: usize, field: &'static str, reason: &str) {
    let err = RecordError::MalformedRecord {
        row,
        field,
        reason: reason.to_string(),
    };
    warn!("skipping row: {err}");
    out.issues.push(err);
}
