use std::collections::VecDeque;

use crate::dashboard::Dashboard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterTab {
    Team,
    Player,
}

#[derive(Debug, Clone)]
pub struct ExportState {
    pub active: bool,
    pub path: Option<String>,
    pub message: String,
}

impl ExportState {
    pub fn new() -> Self {
        Self {
            active: false,
            path: None,
            message: String::new(),
        }
    }

    /// Mark an export as running. Returns `false` if one is already in flight.
    pub fn begin(&mut self) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        self.message.clear();
        true
    }

    /// Footer text: progress while running, then the last result.
    pub fn status(&self) -> Option<&str> {
        if self.active {
            Some("Exporting...")
        } else if self.message.is_empty() {
            None
        } else {
            Some(self.message.as_str())
        }
    }
}

impl Default for ExportState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub tab: FilterTab,
    pub team_name: String,
    pub dashboard: Option<Dashboard>,
    pub load_error: Option<String>,
    pub loading: bool,
    /// Index into `dashboard.players()`; `None` until a player is picked.
    pub selected_player: Option<usize>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub export: ExportState,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            tab: FilterTab::Team,
            team_name: String::new(),
            dashboard: None,
            load_error: None,
            loading: true,
            selected_player: None,
            logs: VecDeque::with_capacity(200),
            help_overlay: false,
            export: ExportState::new(),
        }
    }

    pub fn push_log(&mut self, line: impl Into<String>) {
        if self.logs.len() >= 200 {
            self.logs.pop_front();
        }
        self.logs.push_back(line.into());
    }

    pub fn toggle_tab(&mut self) {
        self.tab = match self.tab {
            FilterTab::Team => FilterTab::Player,
            FilterTab::Player => FilterTab::Team,
        };
    }

    fn player_count(&self) -> usize {
        self.dashboard
            .as_ref()
            .map(|d| d.colors.len())
            .unwrap_or(0)
    }

    pub fn select_next(&mut self) {
        let total = self.player_count();
        if total == 0 {
            self.selected_player = None;
            return;
        }
        self.selected_player = Some(match self.selected_player {
            Some(idx) => (idx + 1) % total,
            None => 0,
        });
    }

    pub fn select_prev(&mut self) {
        let total = self.player_count();
        if total == 0 {
            self.selected_player = None;
            return;
        }
        self.selected_player = Some(match self.selected_player {
            Some(0) | None => total - 1,
            Some(idx) => idx - 1,
        });
    }

    pub fn selected_player_name(&self) -> Option<&str> {
        let dashboard = self.dashboard.as_ref()?;
        let idx = self.selected_player?;
        dashboard.colors.get(idx).map(|c| c.player.as_str())
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    LoadStarted,
    SetDashboard(Box<Dashboard>),
    LoadFailed(String),
    ExportFinished { path: String, games: usize },
    ExportFailed(String),
    Log(String),
}

#[derive(Debug, Clone)]
pub enum LoaderCommand {
    Reload,
    Export { path: String },
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::LoadStarted => {
            state.loading = true;
        }
        Delta::SetDashboard(dashboard) => {
            // Keep the same player selected across reloads when they still exist.
            let previous = state.selected_player_name().map(str::to_string);
            state.selected_player = previous
                .and_then(|name| dashboard.colors.iter().position(|c| c.player == name));
            let report = &dashboard.report;
            state.push_log(format!(
                "[INFO] Loaded {} games ({} rejected, {} undated)",
                report.accepted, report.rejected, report.undated
            ));
            state.dashboard = Some(*dashboard);
            state.load_error = None;
            state.loading = false;
        }
        Delta::LoadFailed(message) => {
            state.push_log(format!("[WARN] Load failed: {message}"));
            state.dashboard = None;
            state.selected_player = None;
            state.load_error = Some(message);
            state.loading = false;
        }
        Delta::ExportFinished { path, games } => {
            state.push_log(format!("[INFO] Exported {games} games to {path}"));
            state.export.active = false;
            state.export.message = format!("Exported {games} games");
            state.export.path = Some(path);
        }
        Delta::ExportFailed(message) => {
            state.push_log(format!("[WARN] Export failed: {message}"));
            state.export.active = false;
            state.export.message = message;
        }
        Delta::Log(line) => state.push_log(line),
    }
}
