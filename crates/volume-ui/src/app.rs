//! Application state and TUI event loop.
//!
//! [`App`] owns the theme, the open view, the sidebar cursor, the selected
//! month and the last [`DashboardSnapshot`]. Reports are rebuilt from the
//! snapshot on every frame, so a refresh or a month change is reflected
//! immediately.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use unicode_width::UnicodeWidthStr;

use volume_core::models::MetricSpec;
use volume_core::normalize::Normalizer;
use volume_core::time_utils::shift_month;
use volume_data::analysis::{entities, entity_report, month_columns, summarize_entities};
use volume_runtime::orchestrator::{DashboardSnapshot, RefreshHandle};

use crate::components::Header;
use crate::table_view;
use crate::themes::Theme;

/// Sidebar entry that opens the home view.
pub const HOME_LABEL: &str = "Home";

// ── View / Action ─────────────────────────────────────────────────────────────

/// Which view the main pane renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// Every company against every metric.
    Home,
    /// Volume and labor tables of one company.
    Entity(String),
}

/// What the event loop must do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    Refresh,
}

// ── App ───────────────────────────────────────────────────────────────────────

/// Report parameters fixed for the lifetime of the app.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub metrics: Vec<MetricSpec>,
    pub labor_categories: Vec<String>,
    pub normalizer: Normalizer,
}

/// Root application state.
pub struct App {
    pub theme: Theme,
    pub view: View,
    /// Cursor in the sidebar; 0 is [`HOME_LABEL`], `i` is entity `i - 1`.
    pub selected: usize,
    pub year: i32,
    pub month: u32,
    pub should_quit: bool,
    /// Most recent snapshot, `None` until the first refresh completes.
    pub snapshot: Option<DashboardSnapshot>,
    report: ReportConfig,
}

impl App {
    pub fn new(theme_name: &str, year: i32, month: u32, report: ReportConfig) -> Self {
        Self {
            theme: Theme::from_name(theme_name),
            view: View::Home,
            selected: 0,
            year,
            month,
            should_quit: false,
            snapshot: None,
            report,
        }
    }

    /// Start on the given company instead of the home view.
    pub fn with_entity(mut self, entity: Option<String>) -> Self {
        if let Some(name) = entity.filter(|e| !e.trim().is_empty()) {
            self.view = View::Entity(name.trim().to_string());
        }
        self
    }

    // ── Public event loop ─────────────────────────────────────────────────────

    /// Run the dashboard, receiving snapshots from `rx`.
    ///
    /// Polls the terminal with a 250 ms timeout and drains the channel with
    /// `try_recv` between polls. Exits on `q`, `Ctrl+C`, or when the
    /// refresh loop goes away.
    pub async fn run(
        mut self,
        mut rx: mpsc::Receiver<DashboardSnapshot>,
        refresh: &RefreshHandle,
    ) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let tick_rate = Duration::from_millis(250);

        let result = loop {
            if let Err(e) = terminal.draw(|frame| self.render(frame)) {
                break Err(e);
            }

            match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        match self.handle_key(key) {
                            Action::Quit => break Ok(()),
                            Action::Refresh => refresh.request_refresh(),
                            Action::None => {}
                        }
                    }
                    Ok(_) => {}
                    Err(e) => break Err(e),
                },
                Ok(false) => {}
                Err(e) => break Err(e),
            }

            loop {
                match rx.try_recv() {
                    Ok(snapshot) => self.update_snapshot(snapshot),
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        self.should_quit = true;
                        break;
                    }
                }
            }

            if self.should_quit {
                break Ok(());
            }
        };

        // Restore terminal state unconditionally.
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    // ── State transitions ─────────────────────────────────────────────────────

    /// Apply one key press.
    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                Action::Quit
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
                Action::Quit
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                Action::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let last = self.sidebar_items().len().saturating_sub(1);
                self.selected = (self.selected + 1).min(last);
                Action::None
            }
            KeyCode::Enter => {
                self.open_selected();
                Action::None
            }
            KeyCode::Esc | KeyCode::Char('h') => {
                self.view = View::Home;
                self.selected = 0;
                Action::None
            }
            KeyCode::Left | KeyCode::Char('[') => {
                self.change_month(-1);
                Action::None
            }
            KeyCode::Right | KeyCode::Char(']') => {
                self.change_month(1);
                Action::None
            }
            KeyCode::Char('r') => Action::Refresh,
            _ => Action::None,
        }
    }

    /// Store a new snapshot and keep the cursor on a valid entry.
    pub fn update_snapshot(&mut self, snapshot: DashboardSnapshot) {
        if let Some(err) = &snapshot.last_error {
            tracing::debug!(error = %err, stale = snapshot.is_stale(), "snapshot carries an error");
        }
        self.snapshot = Some(snapshot);

        let items = self.sidebar_items();
        if let View::Entity(name) = &self.view {
            if let Some(pos) = items.iter().position(|i| i == name) {
                self.selected = pos;
            }
        }
        self.selected = self.selected.min(items.len().saturating_sub(1));
    }

    /// Sidebar entries: [`HOME_LABEL`] followed by the companies of the
    /// current table.
    pub fn sidebar_items(&self) -> Vec<String> {
        let mut items = vec![HOME_LABEL.to_string()];
        if let Some(table) = self.snapshot.as_ref().and_then(|s| s.table.as_ref()) {
            items.extend(entities(table));
        }
        items
    }

    fn open_selected(&mut self) {
        self.view = match self.selected {
            0 => View::Home,
            i => match self.sidebar_items().into_iter().nth(i) {
                Some(entity) => View::Entity(entity),
                None => return,
            },
        };
    }

    fn change_month(&mut self, delta: i32) {
        let (year, month) = shift_month(self.year, self.month, delta);
        self.year = year;
        self.month = month;
        tracing::debug!(year, month, "report month changed");
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0)])
            .split(area);

        self.render_header(frame, chunks[0]);

        let items = self.sidebar_items();
        let sidebar_width = items
            .iter()
            .map(|i| UnicodeWidthStr::width(i.as_str()))
            .max()
            .unwrap_or(0)
            .saturating_add(6)
            .clamp(14, 32);
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(u16::try_from(sidebar_width).unwrap_or(14)),
                Constraint::Min(0),
            ])
            .split(chunks[1]);

        self.render_sidebar(frame, body[0], &items);
        self.render_main(frame, body[1]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let (source, fetched_at, error) = match &self.snapshot {
            Some(s) => (s.source.as_str(), s.fetched_at, s.last_error.as_deref()),
            None => ("-", None, None),
        };
        let lines = Header::new(self.year, self.month, source, &self.theme)
            .fetched_at(fetched_at)
            .error(error)
            .to_lines();
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_sidebar(&self, frame: &mut Frame, area: Rect, items: &[String]) {
        let open = match &self.view {
            View::Home => HOME_LABEL,
            View::Entity(name) => name.as_str(),
        };
        let lines: Vec<Line> = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let marker = if item == open { "▸ " } else { "  " };
                let style = if i == self.selected {
                    self.theme.cursor
                } else {
                    self.theme.body
                };
                Line::from(Span::styled(format!("{marker}{item}"), style))
            })
            .collect();

        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(self.theme.border)
                    .title(" Companies "),
            ),
            area,
        );
    }

    fn render_main(&self, frame: &mut Frame, area: Rect) {
        let snapshot = match &self.snapshot {
            Some(s) => s,
            None => {
                table_view::render_no_data(frame, area, "Loading sheet data...", &self.theme);
                return;
            }
        };
        let table = match &snapshot.table {
            Some(t) => t,
            None => {
                let message = snapshot
                    .last_error
                    .as_deref()
                    .map(|e| format!("No data: {e}"))
                    .unwrap_or_else(|| "No data".to_string());
                table_view::render_no_data(frame, area, &message, &self.theme);
                return;
            }
        };

        let columns = month_columns(&table.columns, self.year, self.month);
        if columns.is_empty() {
            let message = format!("No day-columns for {:04}-{:02}", self.year, self.month);
            table_view::render_no_data(frame, area, &message, &self.theme);
            return;
        }

        match &self.view {
            View::Home => {
                let summary = summarize_entities(
                    table,
                    &columns,
                    &self.report.metrics,
                    self.report.normalizer,
                );
                table_view::render_home_table(
                    frame,
                    area,
                    &summary,
                    self.selected.checked_sub(1),
                    &self.theme,
                );
            }
            View::Entity(name) => {
                let report = entity_report(
                    table,
                    name,
                    &columns,
                    &self.report.labor_categories,
                    self.report.normalizer,
                );
                let halves = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                    .split(area);
                table_view::render_summary_table(
                    frame,
                    halves[0],
                    &format!("{} · volume", report.entity),
                    &report.volume,
                    &self.theme,
                );
                table_view::render_summary_table(
                    frame,
                    halves[1],
                    &format!("{} · labor", report.entity),
                    &report.labor,
                    &self.theme,
                );
            }
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
