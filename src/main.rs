use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph,
};

use bowling_dash::aggregates::{RoundShare, ScoreBin};
use bowling_dash::config::Config;
use bowling_dash::dashboard::Dashboard;
use bowling_dash::loader;
use bowling_dash::logging;
use bowling_dash::state::{AppState, Delta, FilterTab, LoaderCommand, apply_delta};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<LoaderCommand>,
    export_path: String,
}

impl App {
    fn new(cmd_tx: mpsc::Sender<LoaderCommand>, config: &Config) -> Self {
        let mut state = AppState::new();
        state.team_name = config.team_name.clone();
        Self {
            state,
            should_quit: false,
            cmd_tx,
            export_path: config.export_path.display().to_string(),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab | KeyCode::Char('t') => self.state.toggle_tab(),
            KeyCode::Char('j') | KeyCode::Down => {
                self.state.tab = FilterTab::Player;
                self.state.select_next();
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.tab = FilterTab::Player;
                self.state.select_prev();
            }
            KeyCode::Char('r') => self.send(LoaderCommand::Reload, "Reload"),
            KeyCode::Char('e') => {
                if !self.state.export.begin() {
                    return;
                }
                self.send(
                    LoaderCommand::Export {
                        path: self.export_path.clone(),
                    },
                    "Export",
                );
            }
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }

    fn send(&mut self, cmd: LoaderCommand, what: &str) {
        if self.cmd_tx.send(cmd).is_err() {
            self.state.push_log(format!("[WARN] {what} request failed"));
        } else {
            self.state.push_log(format!("[INFO] {what} request sent"));
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = Config::from_env();
    let _log_guard = logging::init_file_logging(&config.log_dir);

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let _loader = loader::spawn_loader(config.league_context(), tx, cmd_rx);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(cmd_tx, &config);
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, &app.state))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(state))
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match &state.dashboard {
        Some(dashboard) => {
            render_last_session(frame, chunks[1], dashboard);
            render_overview(frame, chunks[2], state, dashboard);
            match state.tab {
                FilterTab::Team => render_team_graphs(frame, chunks[3], dashboard),
                FilterTab::Player => render_player_graphs(frame, chunks[3], state, dashboard),
            }
        }
        None => {
            let area = Rect {
                height: chunks[1].height + chunks[2].height + chunks[3].height,
                ..chunks[1]
            };
            render_empty(frame, area, state);
        }
    }

    let footer = Paragraph::new(footer_text(state)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[4]);

    if state.help_overlay {
        render_help_overlay(frame, frame.size(), state);
    }
}

fn header_text(state: &AppState) -> String {
    let tab = match state.tab {
        FilterTab::Team => "[Team] Player",
        FilterTab::Player => "Team [Player]",
    };
    let status = if state.loading { " | loading..." } else { "" };
    format!("  BOWLING | {} | Filter: {}{}", state.team_name, tab, status)
}

fn footer_text(state: &AppState) -> String {
    let last_log = state.logs.back().map(String::as_str).unwrap_or("");
    let export = state
        .export
        .status()
        .map(|s| format!(" | {s}"))
        .unwrap_or_default();
    format!("Tab Filter | j/k Player | r Reload | e Export | ? Help | q Quit{export} | {last_log}")
}

fn render_empty(frame: &mut Frame, area: Rect, state: &AppState) {
    let (text, style) = match &state.load_error {
        Some(err) => (
            format!("No dashboard available.\n\n{err}\n\nPress r to retry."),
            Style::default().fg(Color::Red),
        ),
        None => (
            "Loading league data...".to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    };
    let paragraph = Paragraph::new(text)
        .style(style)
        .block(Block::default().title("Bowling").borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

fn render_last_session(frame: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let s = &dashboard.last_session;
    let line1 = format!(
        "Venue: {}   Date: {}   Number of rounds: {}",
        s.venue,
        s.date.format("%d/%m/%Y"),
        s.num_games
    );
    let line2 = format!(
        "Top player: {} - {} points   Top round: {} - {} points   Average team score: {:.2}   Top strikes: {} - {} strikes",
        s.top_scorer.player,
        s.top_scorer.value,
        s.top_round.player,
        s.top_round.value,
        s.team_average,
        s.top_striker.player,
        s.top_striker.value
    );
    let paragraph = Paragraph::new(format!("{line1}\n{line2}"))
        .block(Block::default().title("Last Game Data").borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

fn render_overview(frame: &mut Frame, area: Rect, state: &AppState, dashboard: &Dashboard) {
    let text = match (state.tab, state.selected_player_name()) {
        (FilterTab::Player, Some(player)) => match dashboard.player_overview(player) {
            Some(o) => {
                let running = dashboard
                    .player_timeline(player)
                    .last()
                    .map(|p| format!("{:.1}", p.cumulative_avg))
                    .unwrap_or_else(|| "-".to_string());
                format!(
                    "Selected Player: {}   Best round: {}   Worst round: {}   Average score: {}   Running average: {}",
                    o.player, o.best, o.worst, o.average, running
                )
            }
            None => format!("Selected Player: {player}   no games"),
        },
        (FilterTab::Player, None) => "Select a player with j/k".to_string(),
        (FilterTab::Team, _) => match &dashboard.team {
            Some(t) => format!(
                "Team Overview: {}   Top team score: {} - {} points   Worst team score: {} - {} points   Average team score: {}",
                state.team_name,
                t.best_player,
                t.best_score,
                t.worst_player,
                t.worst_score,
                t.average
            ),
            None => format!("Team Overview: {}", state.team_name),
        },
    };
    let paragraph = Paragraph::new(text).block(Block::default().borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

fn grid(area: Rect) -> [Rect; 4] {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);
    [top[0], top[1], bottom[0], bottom[1]]
}

fn render_team_graphs(frame: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let cells = grid(area);

    let per_player: Vec<(String, Color, Vec<(f64, f64)>)> = dashboard
        .colors
        .iter()
        .map(|c| {
            let points = dashboard
                .player_timeline(&c.player)
                .iter()
                .map(|p| (f64::from(p.position), f64::from(p.score)))
                .collect();
            (c.player.clone(), hex_color(&c.color), points)
        })
        .collect();
    render_line_chart(
        frame,
        cells[0],
        "Scores by Absolute Game Order",
        ("Game", "Score"),
        &per_player,
    );

    render_histogram(frame, cells[1], "Scores Distribution", &dashboard.team_histogram);

    let avg: Vec<(f64, f64)> = dashboard
        .positions
        .iter()
        .map(|p| (f64::from(p.position), p.mean))
        .collect();
    let min: Vec<(f64, f64)> = dashboard
        .positions
        .iter()
        .map(|p| (f64::from(p.position), f64::from(p.min)))
        .collect();
    let max: Vec<(f64, f64)> = dashboard
        .positions
        .iter()
        .map(|p| (f64::from(p.position), f64::from(p.max)))
        .collect();
    render_line_chart(
        frame,
        cells[2],
        "Average with Min-Max Range",
        ("Game", "Score"),
        &[
            ("Average".to_string(), Color::Blue, avg),
            ("Min".to_string(), Color::DarkGray, min),
            ("Max".to_string(), Color::Gray, max),
        ],
    );

    render_rounds(frame, cells[3], "Distribution of Round Results", &dashboard.rounds);
}

fn render_player_graphs(frame: &mut Frame, area: Rect, state: &AppState, dashboard: &Dashboard) {
    let Some(player) = state.selected_player_name() else {
        let empty = Paragraph::new("Select a player with j/k")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    };
    let cells = grid(area);
    let timeline = dashboard.player_timeline(player);
    let color = dashboard.color_of(player).map(hex_color).unwrap_or(Color::White);

    let strikes: Vec<(f64, f64)> = timeline
        .iter()
        .map(|p| (f64::from(p.position), p.strikes as f64))
        .collect();
    let spares: Vec<(f64, f64)> = timeline
        .iter()
        .map(|p| (f64::from(p.position), p.spares as f64))
        .collect();
    render_line_chart(
        frame,
        cells[0],
        &format!("Strikes and Spares - {player}"),
        ("Game", "Count"),
        &[
            ("Strikes".to_string(), Color::Green, strikes),
            ("Spares".to_string(), Color::Yellow, spares),
        ],
    );

    render_histogram(
        frame,
        cells[1],
        &format!("Scores Distribution - {player}"),
        &dashboard.player_histogram(player),
    );

    let ranks: Vec<(f64, f64)> = timeline
        .iter()
        .filter_map(|p| Some((f64::from(p.position), f64::from(p.rank?))))
        .collect();
    render_line_chart(
        frame,
        cells[2],
        &format!("Position Over Time - {player} (1 = best)"),
        ("Game", "Rank"),
        &[("Rank".to_string(), color, ranks)],
    );

    render_rounds(
        frame,
        cells[3],
        &format!("Round Results - {player}"),
        &dashboard.player_rounds(player),
    );
}

fn render_line_chart(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    axis_titles: (&str, &str),
    series: &[(String, Color, Vec<(f64, f64)>)],
) {
    let all = series.iter().flat_map(|(_, _, pts)| pts.iter());
    let Some((x_bounds, y_bounds)) = chart_bounds(all) else {
        render_no_data(frame, area, title);
        return;
    };

    let datasets: Vec<Dataset> = series
        .iter()
        .map(|(name, color, points)| {
            Dataset::default()
                .name(name.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(*color))
                .data(points)
        })
        .collect();

    let chart = Chart::new(datasets)
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .title(axis_titles.0.to_string())
                .bounds(x_bounds)
                .labels(axis_labels(x_bounds)),
        )
        .y_axis(
            Axis::default()
                .title(axis_titles.1.to_string())
                .bounds(y_bounds)
                .labels(axis_labels(y_bounds)),
        );
    frame.render_widget(chart, area);
}

fn chart_bounds<'a>(points: impl Iterator<Item = &'a (f64, f64)>) -> Option<([f64; 2], [f64; 2])> {
    let mut bounds: Option<([f64; 2], [f64; 2])> = None;
    for &(x, y) in points {
        let b = bounds.get_or_insert(([x, x], [y, y]));
        b.0[0] = b.0[0].min(x);
        b.0[1] = b.0[1].max(x);
        b.1[0] = b.1[0].min(y);
        b.1[1] = b.1[1].max(y);
    }
    bounds.map(|(mut x, mut y)| {
        if x[0] == x[1] {
            x[1] += 1.0;
        }
        if y[0] == y[1] {
            y[1] += 1.0;
        }
        (x, y)
    })
}

fn axis_labels(bounds: [f64; 2]) -> Vec<Span<'static>> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    [bounds[0], mid, bounds[1]]
        .iter()
        .map(|v| Span::raw(format!("{v:.0}")))
        .collect()
}

fn render_histogram(frame: &mut Frame, area: Rect, title: &str, bins: &[ScoreBin]) {
    if bins.is_empty() {
        render_no_data(frame, area, title);
        return;
    }
    let bars: Vec<Bar> = bins
        .iter()
        .map(|bin| {
            Bar::default()
                .value(bin.count as u64)
                .label(Line::from(bin.start.to_string()))
                .style(Style::default().fg(Color::Blue))
        })
        .collect();
    let chart = BarChart::default()
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width(area, bins.len()))
        .bar_gap(1);
    frame.render_widget(chart, area);
}

fn render_rounds(frame: &mut Frame, area: Rect, title: &str, rounds: &[RoundShare]) {
    if rounds.is_empty() {
        render_no_data(frame, area, title);
        return;
    }
    let bars: Vec<Bar> = rounds
        .iter()
        .map(|r| {
            Bar::default()
                .value(r.percent.round() as u64)
                .text_value(format!("{:.0}%", r.percent))
                .label(Line::from(r.label.clone()))
                .style(Style::default().fg(round_color(&r.label)))
        })
        .collect();
    let chart = BarChart::default()
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width(area, rounds.len()))
        .bar_gap(1)
        .max(100);
    frame.render_widget(chart, area);
}

fn bar_width(area: Rect, count: usize) -> u16 {
    let inner = area.width.saturating_sub(2) as usize;
    let per_bar = inner / count.max(1);
    per_bar.saturating_sub(1).clamp(1, 8) as u16
}

fn round_color(label: &str) -> Color {
    match label {
        "Strike" => Color::Green,
        "Spare" => Color::Yellow,
        _ => Color::Cyan,
    }
}

fn render_no_data(frame: &mut Frame, area: Rect, title: &str) {
    let empty = Paragraph::new("No data")
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().title(title.to_string()).borders(Borders::ALL));
    frame.render_widget(empty, area);
}

fn hex_color(hex: &str) -> Color {
    let digits = hex.trim_start_matches('#');
    if digits.len() != 6 {
        return Color::White;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
    match (channel(0..2), channel(2..4), channel(4..6)) {
        (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
        _ => Color::White,
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect, state: &AppState) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let mut lines = vec![
        "Bowling Dashboard - Help".to_string(),
        String::new(),
        "  Tab / t      Toggle Team / Player".to_string(),
        "  j/k or ↓/↑   Select player".to_string(),
        "  r            Reload data".to_string(),
        "  e            Export XLSX report".to_string(),
        "  ?            Toggle help".to_string(),
        "  q            Quit".to_string(),
        String::new(),
        "Recent log:".to_string(),
    ];
    lines.extend(state.logs.iter().rev().take(8).map(|l| format!("  {l}")));

    let help = Paragraph::new(lines.join("\n"))
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
