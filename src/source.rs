use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::{Duration as ChronoDuration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use tracing::info;

use crate::record::Table;

/// Anything that can hand over the league sheet as a table.
pub trait RecordSource {
    fn describe(&self) -> String;
    fn fetch(&self) -> Result<Table>;
}

impl<S: RecordSource + ?Sized> RecordSource for Box<S> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn fetch(&self) -> Result<Table> {
        (**self).fetch()
    }
}

#[derive(Debug, Clone)]
pub struct CsvFileSource {
    pub path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for CsvFileSource {
    fn describe(&self) -> String {
        format!("csv file {}", self.path.display())
    }

    fn fetch(&self) -> Result<Table> {
        let file = File::open(&self.path)
            .with_context(|| format!("open {}", self.path.display()))?;
        Table::from_csv_reader(file).with_context(|| format!("parse {}", self.path.display()))
    }
}

/// A Google sheet published as CSV (`.../export?format=csv`).
#[derive(Debug, Clone)]
pub struct SheetCsvSource {
    pub url: String,
    pub timeout: Duration,
}

impl SheetCsvSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }

    fn client(&self) -> Result<Client> {
        Client::builder()
            .timeout(self.timeout)
            .build()
            .context("failed to build http client")
    }
}

impl RecordSource for SheetCsvSource {
    fn describe(&self) -> String {
        format!("sheet {}", self.url)
    }

    fn fetch(&self) -> Result<Table> {
        let resp = self
            .client()?
            .get(&self.url)
            .header(USER_AGENT, "bowling_dash/0.1")
            .send()
            .context("request failed")?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("sheet request returned http {status}"));
        }
        let body = resp.text().context("read sheet body")?;
        info!(bytes = body.len(), "fetched sheet");
        Table::from_csv_reader(body.as_bytes()).context("parse sheet csv")
    }
}

/// Synthetic league in the Czech sheet layout, reproducible from `seed`.
#[derive(Debug, Clone)]
pub struct DemoSource {
    pub players: usize,
    pub sessions: usize,
    pub seed: u64,
}

const DEMO_NAMES: &[&str] = &[
    "Adam", "Bára", "Cyril", "Dana", "Emil", "Františka", "Gustav", "Hana", "Ivo", "Jana", "Karel",
    "Lucie",
];

const DEMO_VENUES: &[&str] = &["Bowling Kotva", "Strike Bar", "Bowling Letná"];

impl Default for DemoSource {
    fn default() -> Self {
        Self {
            players: 5,
            sessions: 6,
            seed: 7,
        }
    }
}

impl RecordSource for DemoSource {
    fn describe(&self) -> String {
        format!(
            "demo league ({} players, {} sessions, seed {})",
            self.players, self.sessions, self.seed
        )
    }

    fn fetch(&self) -> Result<Table> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut headers = vec![
            "Hráč".to_string(),
            "Podnik".to_string(),
            "Den".to_string(),
            "Pořadové č. hry".to_string(),
        ];
        headers.extend((1..=10).map(|i| format!("{i}. kolo")));
        headers.push("Skóre 10. kolo".to_string());

        let start = NaiveDate::from_ymd_opt(2024, 9, 6).ok_or_else(|| anyhow!("bad demo start"))?;
        let players = self.players.clamp(1, DEMO_NAMES.len());
        let skills: Vec<f64> = (0..players).map(|_| rng.gen_range(0.15..0.45)).collect();

        let mut rows = Vec::new();
        for session in 0..self.sessions {
            let date = start + ChronoDuration::weeks(session as i64 * 2);
            let venue = DEMO_VENUES[session % DEMO_VENUES.len()];
            let games = rng.gen_range(2..=4u32);
            for game in 1..=games {
                for (p, skill) in skills.iter().enumerate() {
                    let (frames, score) = demo_game(&mut rng, *skill);
                    let mut row = vec![
                        DEMO_NAMES[p].to_string(),
                        venue.to_string(),
                        date.format("%d.%m.%Y").to_string(),
                        game.to_string(),
                    ];
                    row.extend(frames);
                    row.push(score.to_string());
                    rows.push(row);
                }
            }
        }
        Ok(Table::new(headers, rows))
    }
}

/// Frame labels plus a plausible total. Bonuses are approximated, not scored pin by pin.
fn demo_game(rng: &mut StdRng, skill: f64) -> (Vec<String>, u32) {
    let mut frames = Vec::with_capacity(10);
    let mut score = 0u32;
    for _ in 0..10 {
        let roll: f64 = rng.r#gen();
        if roll < skill {
            frames.push("Strike".to_string());
            score += rng.gen_range(18..=30);
        } else if roll < skill * 2.2 {
            frames.push("Spare".to_string());
            score += rng.gen_range(12..=19);
        } else {
            let pins = rng.gen_range(3..=9u32);
            frames.push(pins.to_string());
            score += pins;
        }
    }
    (frames, score.min(300))
}
