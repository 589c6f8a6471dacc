use bowling_dash::dashboard::{Dashboard, build_dashboard};
use bowling_dash::source::{DemoSource, RecordSource};
use bowling_dash::state::{AppState, Delta, FilterTab, apply_delta};

fn demo_dashboard(players: usize) -> Dashboard {
    let table = DemoSource {
        players,
        sessions: 2,
        seed: 3,
    }
    .fetch()
    .expect("demo table");
    build_dashboard(&table, None, 10).expect("demo dashboard")
}

#[test]
fn tab_toggles_between_team_and_player() {
    let mut state = AppState::new();
    assert_eq!(state.tab, FilterTab::Team);
    state.toggle_tab();
    assert_eq!(state.tab, FilterTab::Player);
    state.toggle_tab();
    assert_eq!(state.tab, FilterTab::Team);
}

#[test]
fn selection_wraps_both_ways() {
    let mut state = AppState::new();
    state.select_next();
    assert_eq!(state.selected_player, None);

    apply_delta(&mut state, Delta::SetDashboard(Box::new(demo_dashboard(3))));
    state.select_prev();
    assert_eq!(state.selected_player, Some(2));
    state.select_next();
    assert_eq!(state.selected_player, Some(0));
    state.select_next();
    assert_eq!(state.selected_player_name(), Some("Bára"));
}

#[test]
fn reload_keeps_the_selected_player_by_name() {
    let mut state = AppState::new();
    apply_delta(&mut state, Delta::SetDashboard(Box::new(demo_dashboard(3))));
    state.select_next();
    state.select_next();
    state.select_next();
    assert_eq!(state.selected_player_name(), Some("Cyril"));

    apply_delta(&mut state, Delta::SetDashboard(Box::new(demo_dashboard(5))));
    assert_eq!(state.selected_player_name(), Some("Cyril"));

    apply_delta(&mut state, Delta::SetDashboard(Box::new(demo_dashboard(2))));
    assert_eq!(state.selected_player, None);
}

#[test]
fn load_lifecycle_updates_flags_and_log() {
    let mut state = AppState::new();
    assert!(state.loading);

    apply_delta(&mut state, Delta::SetDashboard(Box::new(demo_dashboard(2))));
    assert!(!state.loading);
    assert!(state.dashboard.is_some());
    assert!(
        state
            .logs
            .back()
            .is_some_and(|l| l.starts_with("[INFO] Loaded"))
    );

    apply_delta(&mut state, Delta::LoadStarted);
    assert!(state.loading);
    apply_delta(&mut state, Delta::LoadFailed("sheet unreachable".to_string()));
    assert!(!state.loading);
    assert!(state.dashboard.is_none());
    assert_eq!(state.load_error.as_deref(), Some("sheet unreachable"));
}

#[test]
fn export_results_land_in_export_state() {
    let mut state = AppState::new();
    assert_eq!(state.export.status(), None);
    assert!(state.export.begin());
    assert!(!state.export.begin());
    assert_eq!(state.export.status(), Some("Exporting..."));
    apply_delta(
        &mut state,
        Delta::ExportFinished {
            path: "out.xlsx".to_string(),
            games: 12,
        },
    );
    assert!(!state.export.active);
    assert_eq!(state.export.path.as_deref(), Some("out.xlsx"));
    assert_eq!(state.export.message, "Exported 12 games");
    assert_eq!(state.export.status(), Some("Exported 12 games"));
    assert!(state.export.begin());

    apply_delta(&mut state, Delta::ExportFailed("disk full".to_string()));
    assert_eq!(state.export.message, "disk full");
}

#[test]
fn log_is_capped() {
    let mut state = AppState::new();
    for i in 0..250 {
        apply_delta(&mut state, Delta::Log(format!("line {i}")));
    }
    assert_eq!(state.logs.len(), 200);
    assert_eq!(state.logs.front().map(String::as_str), Some("line 50"));
}
