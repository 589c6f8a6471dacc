use std::path::PathBuf;

use chrono::NaiveDate;

use bowling_dash::dashboard::{Dashboard, LeagueContext};
use bowling_dash::source::CsvFileSource;

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn load_league() -> Dashboard {
    LeagueContext::new(Box::new(CsvFileSource::new(fixture_path("league_cz.csv"))))
        .load()
        .expect("fixture league should load")
}

fn find<'a>(
    dashboard: &'a Dashboard,
    player: &str,
    day: u32,
    game: u32,
) -> &'a bowling_dash::derive::EnrichedRecord {
    let date = NaiveDate::from_ymd_opt(2024, 11, day);
    dashboard
        .records
        .iter()
        .find(|r| {
            r.record.player == player && r.record.date == date && r.record.game_sequence == game
        })
        .expect("record should exist")
}

#[test]
fn mixed_date_formats_land_on_the_same_day() {
    let dashboard = load_league();
    let nov19 = NaiveDate::from_ymd_opt(2024, 11, 19);
    let count = dashboard
        .records
        .iter()
        .filter(|r| r.record.date == nov19)
        .count();
    assert_eq!(count, 6);
    assert_eq!(dashboard.report.rows_total, 11);
    assert_eq!(dashboard.report.accepted, 11);
    assert_eq!(dashboard.report.rejected, 0);
    assert_eq!(dashboard.report.undated, 1);
}

#[test]
fn absolute_positions_continue_across_dates() {
    let dashboard = load_league();
    assert_eq!(find(&dashboard, "Adam", 5, 1).absolute_game_position, Some(1));
    assert_eq!(find(&dashboard, "Bára", 5, 2).absolute_game_position, Some(2));
    assert_eq!(find(&dashboard, "Cyril", 19, 1).absolute_game_position, Some(3));
    assert_eq!(find(&dashboard, "Adam", 19, 2).absolute_game_position, Some(4));

    let undated = dashboard
        .records
        .iter()
        .find(|r| r.record.date.is_none())
        .expect("undated row is kept");
    assert_eq!(undated.record.player, "Cyril");
    assert_eq!(undated.absolute_game_position, None);
    assert_eq!(undated.rank_within_position, None);
}

#[test]
fn ranks_share_the_minimum_on_ties() {
    let dashboard = load_league();
    assert_eq!(find(&dashboard, "Adam", 19, 1).rank_within_position, Some(1));
    assert_eq!(find(&dashboard, "Bára", 19, 1).rank_within_position, Some(1));
    assert_eq!(find(&dashboard, "Cyril", 19, 1).rank_within_position, Some(3));

    assert_eq!(find(&dashboard, "Adam", 19, 2).rank_within_position, Some(1));
    assert_eq!(find(&dashboard, "Cyril", 19, 2).rank_within_position, Some(2));
    assert_eq!(find(&dashboard, "Bára", 19, 2).rank_within_position, Some(3));
}

#[test]
fn cumulative_average_runs_per_player_across_dates() {
    let dashboard = load_league();
    let adam: Vec<f64> = [(5, 1), (5, 2), (19, 1), (19, 2)]
        .iter()
        .map(|&(day, game)| find(&dashboard, "Adam", day, game).cumulative_avg_score)
        .collect();
    assert_eq!(adam[0], 150.0);
    assert_eq!(adam[1], 155.0);
    assert!((adam[2] - 490.0 / 3.0).abs() < 1e-9);
    assert_eq!(adam[3], 172.5);

    // Cyril's undated game comes after his dated ones.
    let undated = dashboard
        .records
        .iter()
        .find(|r| r.record.date.is_none())
        .expect("undated row is kept");
    assert!((undated.cumulative_avg_score - 430.0 / 3.0).abs() < 1e-9);
}

#[test]
fn last_session_summary_matches_the_latest_date() {
    let dashboard = load_league();
    let s = &dashboard.last_session;
    assert_eq!(s.date, NaiveDate::from_ymd_opt(2024, 11, 19).unwrap());
    assert_eq!(s.venue, "Strike Bar");
    assert_eq!(s.num_games, 2);
    assert_eq!(s.num_players, 3);
    assert_eq!(s.team_total, 980);
    assert!((s.team_average - 980.0 / 6.0).abs() < 1e-9);
    assert_eq!(s.top_scorer.player, "Adam");
    assert_eq!(s.top_scorer.value, 380);
    assert_eq!(s.top_round.player, "Adam");
    assert_eq!(s.top_round.value, 200);
    assert_eq!(s.top_striker.player, "Adam");
    assert_eq!(s.top_striker.value, 7);

    let strikes: Vec<(&str, usize)> = s
        .players
        .iter()
        .map(|p| (p.player.as_str(), p.strikes))
        .collect();
    assert_eq!(strikes, vec![("Adam", 7), ("Bára", 3), ("Cyril", 2)]);
}

#[test]
fn position_series_has_mean_min_max() {
    let dashboard = load_league();
    let positions: Vec<u32> = dashboard.positions.iter().map(|p| p.position).collect();
    assert_eq!(positions, vec![1, 2, 3, 4]);

    let third = &dashboard.positions[2];
    assert_eq!(third.players, 3);
    assert_eq!(third.min, 120);
    assert_eq!(third.max, 180);
    assert_eq!(third.mean, 160.0);
}

#[test]
fn round_distribution_counts_every_frame() {
    let dashboard = load_league();
    let total: usize = dashboard.rounds.iter().map(|r| r.count).sum();
    assert_eq!(total, 110);

    let pct: f64 = dashboard.rounds.iter().map(|r| r.percent).sum();
    assert!((pct - 100.0).abs() < 1e-9);

    let strike = dashboard
        .rounds
        .iter()
        .find(|r| r.label == "Strike")
        .expect("strikes are present");
    assert_eq!(strike.count, 21);
    let spare = dashboard
        .rounds
        .iter()
        .find(|r| r.label == "Spare")
        .expect("spares are present");
    assert_eq!(spare.count, 22);
    let order: Vec<&str> = dashboard.rounds.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(order, vec!["8", "9", "Spare", "Strike", "7", "6", "5"]);
}

#[test]
fn player_distribution_only_counts_that_player() {
    let dashboard = load_league();
    let cyril = dashboard.player_rounds("Cyril");
    let total: usize = cyril.iter().map(|r| r.count).sum();
    assert_eq!(total, 30);
    let strikes = cyril
        .iter()
        .find(|r| r.label == "Strike")
        .map(|r| r.count);
    assert_eq!(strikes, Some(3));
}

#[test]
fn colors_follow_first_appearance() {
    let dashboard = load_league();
    assert_eq!(dashboard.players(), vec!["Adam", "Bára", "Cyril"]);
    assert_eq!(dashboard.color_of("Adam"), Some("#636EFA"));
    assert_eq!(dashboard.color_of("Cyril"), Some("#00CC96"));
    assert_eq!(dashboard.color_of("Nobody"), None);
}

#[test]
fn overviews_and_player_series() {
    let dashboard = load_league();
    let team = dashboard.team.as_ref().expect("team overview");
    assert_eq!((team.best_player.as_str(), team.best_score), ("Adam", 200));
    assert_eq!((team.worst_player.as_str(), team.worst_score), ("Cyril", 120));
    assert_eq!(team.average, 162.0);

    let bara = dashboard.player_overview("Bára").expect("Bára played");
    assert_eq!((bara.best, bara.worst, bara.games), (180, 140, 4));
    assert_eq!(bara.average, 165.0);

    let timeline = dashboard.player_timeline("Cyril");
    let positions: Vec<u32> = timeline.iter().map(|p| p.position).collect();
    assert_eq!(positions, vec![3, 4]);
    assert_eq!(timeline[1].strikes, 2);
    assert_eq!(timeline[1].spares, 2);

    let hist = dashboard.player_histogram("Adam");
    assert_eq!(hist.first().map(|b| b.label()), Some("150-159".to_string()));
    assert_eq!(hist.iter().map(|b| b.count).sum::<usize>(), 4);
}

#[test]
fn reloading_is_byte_identical() {
    let first = serde_json::to_string(&load_league()).expect("serialize");
    let second = serde_json::to_string(&load_league()).expect("serialize");
    assert_eq!(first, second);
}
