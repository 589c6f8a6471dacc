use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use bowling_dash::dashboard::{LeagueContext, build_dashboard};
use bowling_dash::error::RecordError;
use bowling_dash::record::{ColumnMap, FrameResult, Table, ingest, parse_date};
use bowling_dash::source::{CsvFileSource, DemoSource, RecordSource};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture should be readable")
}

fn fixture_table(name: &str) -> Table {
    Table::from_csv_reader(read_fixture(name).as_bytes()).expect("fixture should parse")
}

#[test]
fn malformed_rows_are_skipped_not_fatal() {
    let table = fixture_table("league_en_malformed.csv");
    let ingested = ingest(&table, &ColumnMap::english());

    assert_eq!(ingested.records.len(), 3);
    assert_eq!(ingested.rejected(), 3);
    assert_eq!(ingested.undated(), 0);

    let rejected: Vec<(usize, &str)> = ingested
        .issues
        .iter()
        .filter_map(|e| match e {
            RecordError::MalformedRecord { row, field, .. } => Some((*row, *field)),
            RecordError::UnparseableDate { .. } => None,
        })
        .collect();
    assert_eq!(
        rejected,
        vec![(2, "player"), (3, "final_score"), (4, "game_sequence")]
    );
}

#[test]
fn shorthand_frame_marks_and_blank_cells() {
    let table = fixture_table("league_en_malformed.csv");
    let ingested = ingest(&table, &ColumnMap::english());

    let filip = &ingested.records[1];
    assert_eq!(filip.player, "Filip");
    assert_eq!(filip.row, 5);
    assert_eq!(
        filip.frames,
        vec![FrameResult::Strike, FrameResult::Spare, FrameResult::Pins(0)]
    );
    assert_eq!(filip.final_score, 141);

    let eva_second = &ingested.records[2];
    assert_eq!(eva_second.game_sequence, 2);
    assert_eq!(eva_second.frames.len(), 2);
}

#[test]
fn english_layout_is_detected() {
    let table = fixture_table("league_en_malformed.csv");
    assert_eq!(ColumnMap::detect(&table.headers), Some(ColumnMap::english()));

    let dashboard = build_dashboard(&table, None, 10).expect("dashboard");
    assert_eq!(dashboard.report.rows_total, 6);
    assert_eq!(dashboard.report.accepted, 3);
    assert_eq!(dashboard.report.rejected, 3);
    assert_eq!(dashboard.last_session.top_scorer.player, "Eva");
    assert_eq!(dashboard.last_session.top_scorer.value, 261);

    let strike = dashboard.rounds.iter().find(|r| r.label == "Strike").map(|r| r.count);
    assert_eq!(strike, Some(2));
    assert_eq!(dashboard.rounds.iter().map(|r| r.count).sum::<usize>(), 8);
}

#[test]
fn czech_layout_is_detected() {
    let table = fixture_table("league_cz.csv");
    assert_eq!(ColumnMap::detect(&table.headers), Some(ColumnMap::czech()));
    assert_eq!(ColumnMap::detect(&["Name".to_string(), "Points".to_string()]), None);
}

#[test]
fn unparseable_date_keeps_the_row() {
    let table = fixture_table("league_cz.csv");
    let ingested = ingest(&table, &ColumnMap::czech());
    assert_eq!(ingested.records.len(), 11);
    assert_eq!(ingested.rejected(), 0);
    assert_eq!(
        ingested.issues,
        vec![RecordError::UnparseableDate {
            row: 11,
            raw: "někdy v listopadu".to_string(),
        }]
    );
}

#[test]
fn day_first_dates_in_several_spellings() {
    let expected = NaiveDate::from_ymd_opt(2024, 11, 5);
    for raw in ["2024-11-05", "5.11.2024", "5. 11. 2024", "05/11/2024", " 05.11.2024 "] {
        assert_eq!(parse_date(raw), expected, "{raw}");
    }
    assert_eq!(parse_date("not a date"), None);
    assert_eq!(parse_date(""), None);
    assert_eq!(parse_date("31.02.2024"), None);
}

#[test]
fn blank_rows_are_ignored() {
    let table = Table::from_csv_reader(
        "Player,Venue,Date,Game,Frame 1,Score\n,,,,,\nEva,Alley 9,2025-01-10,1,9,90\n".as_bytes(),
    )
    .expect("csv");
    let ingested = ingest(&table, &ColumnMap::english());
    assert_eq!(ingested.records.len(), 1);
    assert_eq!(ingested.blank, 1);
    assert!(ingested.issues.is_empty());

    let dashboard = build_dashboard(&table, None, 10).expect("dashboard");
    let report = &dashboard.report;
    assert_eq!(report.blank, 1);
    assert_eq!(report.rows_total, report.accepted + report.rejected + report.blank);
}

#[test]
fn scores_and_game_numbers_out_of_range_are_rejected() {
    let table = Table::from_csv_reader(
        "Player,Venue,Date,Game,Score\n\
         Eva,Alley 9,2025-01-10,1,300\n\
         Eva,Alley 9,2025-01-10,2,301\n\
         Eva,Alley 9,2025-01-10,3,3000000000\n\
         Ivo,Alley 9,2025-01-10,4294967295,120\n\
         Ivo,Alley 9,2025-01-10,101,120\n\
         Ivo,Alley 9,2025-01-10,100,120\n"
            .as_bytes(),
    )
    .expect("csv");
    let ingested = ingest(&table, &ColumnMap::english());

    let kept: Vec<(u32, u32)> = ingested
        .records
        .iter()
        .map(|r| (r.game_sequence, r.final_score))
        .collect();
    assert_eq!(kept, vec![(1, 300), (100, 120)]);

    let rejected: Vec<(usize, &str)> = ingested
        .issues
        .iter()
        .filter_map(|e| match e {
            RecordError::MalformedRecord { row, field, .. } => Some((*row, *field)),
            RecordError::UnparseableDate { .. } => None,
        })
        .collect();
    assert_eq!(
        rejected,
        vec![
            (2, "final_score"),
            (3, "final_score"),
            (4, "game_sequence"),
            (5, "game_sequence"),
        ]
    );

    // Nothing left over for the summary or positions to overflow on.
    let dashboard = build_dashboard(&table, None, 10).expect("dashboard");
    assert_eq!(dashboard.last_session.team_total, 420);
}

#[test]
fn badly_encoded_row_is_rejected_alone() {
    let mut bytes = b"Player,Venue,Date,Game,Score\nEva,Alley 9,2025-01-10,1,133\n".to_vec();
    // "Bára" as cp1250
    bytes.extend_from_slice(b"B\xe1ra,Alley 9,2025-01-10,1,150\n");
    bytes.extend_from_slice(b"Ivo,Alley 9,2025-01-10,1,120\n");

    let table = Table::from_csv_reader(bytes.as_slice()).expect("table still reads");
    assert_eq!(table.rows.len(), 3);
    assert_eq!(table.undecodable, vec![2]);

    let dashboard = build_dashboard(&table, None, 10).expect("dashboard");
    assert_eq!(dashboard.report.accepted, 2);
    assert_eq!(dashboard.report.rejected, 1);
    assert_eq!(dashboard.players(), vec!["Eva", "Ivo"]);
    assert!(matches!(
        dashboard.report.warnings.as_slice(),
        [RecordError::MalformedRecord { row: 2, field: "row", .. }]
    ));
}

#[test]
fn header_only_sheet_is_empty() {
    let table = Table::from_csv_reader("Player,Venue,Date,Game,Score\n".as_bytes()).expect("csv");
    assert!(build_dashboard(&table, None, 10).is_err());
}

#[test]
fn missing_csv_file_reports_a_source_error() {
    let ctx = LeagueContext::new(Box::new(CsvFileSource::new("does/not/exist.csv")));
    let err = ctx.load().expect_err("missing file must fail");
    assert!(err.to_string().starts_with("data source failed"));
}

#[test]
fn demo_league_is_reproducible() {
    let source = DemoSource {
        players: 4,
        sessions: 3,
        seed: 42,
    };
    let first = source.fetch().expect("demo table");
    let second = source.fetch().expect("demo table");
    assert_eq!(first, second);

    let dashboard = build_dashboard(&first, None, 10).expect("demo dashboard");
    assert_eq!(dashboard.players().len(), 4);
    assert_eq!(dashboard.report.rejected, 0);
    assert_eq!(dashboard.report.undated, 0);
    assert_eq!(
        dashboard.last_session.date,
        NaiveDate::from_ymd_opt(2024, 10, 4).expect("date")
    );
    assert!(dashboard.records.iter().all(|r| r.record.frames.len() == 10));
}
