//! Application core: event loop, pane focus, action dispatch, and the
//! wiring between the core's controller and the panes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use throbber_widgets_tui::ThrobberState;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use daylog_config::Config;
use daylog_core::{
    Calendar, Collaborators, FilterPipeline, FilterSyncController, MemoryFilterState, Notice,
    RecordStore, VirtualList, VisibilityFeed,
};

use crate::action::{Action, Focus, Preset};
use crate::component::Component;
use crate::data_bridge::{ActionStatus, spawn_data_bridge};
use crate::event::{Event, EventReader};
use crate::panes::calendar::{PREFERRED_HEIGHT, PREFERRED_WIDTH};
use crate::panes::{CalendarPane, ListPane};
use crate::theme;
use crate::tui::Tui;
use crate::widgets::filter_summary::summary_lines;
use crate::widgets::status_bar::{StatusLine, render_status_bar};

/// Screen regions, recomputed from the terminal size for both drawing
/// and mouse hit-testing.
#[derive(Debug, Clone, Copy)]
struct AppLayout {
    calendar: Rect,
    filter: Rect,
    list: Rect,
    status: Rect,
}

impl AppLayout {
    fn new(area: Rect) -> Self {
        let [content, status] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);
        let [left, list] =
            Layout::horizontal([Constraint::Length(PREFERRED_WIDTH), Constraint::Min(20)])
                .areas(content);
        let [calendar, filter] =
            Layout::vertical([Constraint::Length(PREFERRED_HEIGHT), Constraint::Min(0)])
                .areas(left);
        Self {
            calendar,
            filter,
            list,
            status,
        }
    }
}

/// Timing knobs the loop runs on.
#[derive(Debug, Clone, Copy)]
pub struct Rates {
    pub tick: Duration,
    pub paint: Duration,
    pub notification_ttl: Duration,
}

impl Rates {
    pub fn from_config(config: &Config) -> Self {
        Self {
            tick: config.ui.tick_rate(),
            paint: config.ui.render_rate(),
            notification_ttl: config.ui.notification_ttl(),
        }
    }
}

pub struct App {
    focus: Focus,
    calendar: CalendarPane,
    list: ListPane,
    controller: FilterSyncController,
    store: Arc<RecordStore>,
    today: NaiveDate,
    rates: Rates,
    running: bool,
    help_visible: bool,
    terminal_size: (u16, u16),
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    data_cancel: CancellationToken,
    notification: Option<(Notice, Instant)>,
    working: bool,
    progress: Option<u8>,
    throbber: ThrobberState,
}

impl App {
    /// Build the core object graph around `store`. Call from inside the
    /// runtime so the filter pipeline can use its blocking worker.
    pub fn new(store: Arc<RecordStore>, config: &Config, today: NaiveDate) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        let calendar =
            Calendar::new(Arc::clone(&store), config.calendar_config(), today).into_shared();
        let feed = VisibilityFeed::new();
        let controller = FilterSyncController::new(
            Arc::clone(&store),
            Arc::clone(&calendar),
            FilterPipeline::new(config.pipeline_config()),
            Collaborators {
                filter_state: MemoryFilterState::new(),
                visibility: feed.clone(),
                status: Arc::new(ActionStatus::new(action_tx.clone())),
            },
        );

        let mut calendar = CalendarPane::new(calendar);
        calendar.set_focused(true);
        let list = ListPane::new(VirtualList::new(config.list_config(), feed));

        Self {
            focus: Focus::Calendar,
            calendar,
            list,
            controller,
            store,
            today,
            rates: Rates::from_config(config),
            running: true,
            help_visible: false,
            terminal_size: (0, 0),
            action_tx,
            action_rx,
            data_cancel: CancellationToken::new(),
            notification: None,
            working: false,
            progress: None,
            throbber: ThrobberState::default(),
        }
    }

    fn init_panes(&mut self) -> Result<()> {
        self.calendar.init(self.action_tx.clone())?;
        self.list.init(self.action_tx.clone())?;
        Ok(())
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.terminal_size = tui.size().unwrap_or((80, 24));
        self.init_panes()?;

        tokio::spawn(spawn_data_bridge(
            Arc::clone(&self.store),
            self.action_tx.clone(),
            self.data_cancel.clone(),
        ));

        let mut events = EventReader::new(self.rates.tick, self.rates.paint);
        info!(controller = ?self.controller, "event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Mouse(mouse) => {
                    if let Some(action) = self.handle_mouse_event(mouse)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Paint => self.action_tx.send(Action::Paint)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;
                if matches!(action, Action::Paint) {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        self.data_cancel.cancel();
        self.controller.detach();
        events.stop();
        info!("event loop ended");
        Ok(())
    }

    fn focused_pane(&mut self) -> &mut dyn Component {
        match self.focus {
            Focus::Calendar => &mut self.calendar,
            Focus::List => &mut self.list,
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.help_visible {
            return Ok(matches!(key.code, KeyCode::Esc | KeyCode::Char('?'))
                .then_some(Action::ToggleHelp));
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c')) | (_, KeyCode::Char('q')) => {
                return Ok(Some(Action::Quit));
            }
            (_, KeyCode::Char('?')) => return Ok(Some(Action::ToggleHelp)),
            (_, KeyCode::Tab | KeyCode::BackTab) => return Ok(Some(Action::FocusNext)),
            (_, KeyCode::Char('7')) => return Ok(Some(Action::ApplyPreset(Preset::LastSevenDays))),
            (_, KeyCode::Char('m')) => return Ok(Some(Action::ApplyPreset(Preset::ThisMonth))),
            (_, KeyCode::Char('R')) => return Ok(Some(Action::RetrySections)),
            _ => {}
        }

        if self.calendar.handle_calendar_key(key) {
            return Ok(None);
        }
        self.focused_pane().handle_key_event(key)
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        let layout = AppLayout::new(self.screen_area());
        let position = (mouse.column, mouse.row).into();
        if layout.calendar.contains(position) {
            self.set_focus(Focus::Calendar);
            return self.calendar.handle_mouse_event(mouse, layout.calendar);
        }
        if layout.list.contains(position) {
            self.set_focus(Focus::List);
            return self.list.handle_mouse_event(mouse, layout.list);
        }
        Ok(None)
    }

    fn screen_area(&self) -> Rect {
        Rect::new(0, 0, self.terminal_size.0, self.terminal_size.1)
    }

    fn set_focus(&mut self, focus: Focus) {
        if focus == self.focus {
            return;
        }
        self.focused_pane().set_focused(false);
        self.focus = focus;
        self.focused_pane().set_focused(true);
        debug!(?focus, "focus changed");
    }

    fn apply_preset(&self, preset: Preset) {
        let range = preset.range(self.today);
        info!(%preset, %range, "preset filter");
        // Written to the filter state directly, like any outside change.
        self.controller
            .filter_state()
            .set_custom_range(range.start(), range.end());
    }

    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,
            Action::Resize(w, h) => self.terminal_size = (*w, *h),
            Action::Tick => {
                if self.working {
                    self.throbber.calc_next();
                }
                if self
                    .notification
                    .as_ref()
                    .is_some_and(|(_, shown)| shown.elapsed() > self.rates.notification_ttl)
                {
                    self.notification = None;
                }
            }
            Action::Notify(notice) => {
                self.notification = Some((notice.clone(), Instant::now()));
            }
            Action::Working(working) => {
                self.working = *working;
                if !working {
                    self.progress = None;
                }
            }
            Action::Progress(percent) => self.progress = Some(*percent),
            Action::FocusNext => self.set_focus(self.focus.next()),
            Action::ToggleHelp => self.help_visible = !self.help_visible,
            Action::ApplyPreset(preset) => self.apply_preset(*preset),
            Action::RecordsUpdated(records) => {
                debug!(count = records.len(), "records updated");
                self.controller.refresh();
            }
            Action::Paint | Action::RetrySections => {}
        }

        for follow_up in [self.calendar.update(action)?, self.list.update(action)?]
            .into_iter()
            .flatten()
        {
            self.action_tx.send(follow_up)?;
        }
        Ok(())
    }

    // ── Rendering ───────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let layout = AppLayout::new(frame.area());

        self.calendar.render(frame, layout.calendar);
        self.render_filter_summary(frame, layout.filter);
        self.list.render(frame, layout.list);

        let status = StatusLine {
            working: self.working,
            progress: self.progress,
            focus: self.focus,
            day_description: self.calendar.focused_description(),
        };
        render_status_bar(frame, layout.status, &status, &self.throbber);

        if let Some((notice, _)) = &self.notification {
            Self::render_notification(frame, frame.area(), notice);
        }
        if self.help_visible {
            Self::render_help_overlay(frame, frame.area());
        }
    }

    fn render_filter_summary(&self, frame: &mut Frame, area: Rect) {
        if area.height < 3 {
            return;
        }
        let block = Block::default()
            .title(Span::styled(" Filter ", theme::title_style()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());
        let lines = summary_lines(
            self.controller.filter_state().get_current_range(),
            self.list.statistics(),
        );
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    /// Toast in the bottom-right corner, above the status bar.
    fn render_notification(frame: &mut Frame, area: Rect, notice: &Notice) {
        let message_width = u16::try_from(notice.message.chars().count()).unwrap_or(u16::MAX);
        let width = message_width
            .saturating_add(6)
            .clamp(20, 64)
            .min(area.width);
        let height = 3u16.min(area.height);
        let x = area.width.saturating_sub(width + 1);
        let y = area.height.saturating_sub(height + 1);
        let toast = Rect::new(area.x + x, area.y + y, width, height);

        let (color, icon) = theme::notice(notice.level);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(color))
            .style(Style::default().bg(theme::BG_DARK));
        let line = Line::from(vec![
            Span::styled(format!(" {icon} "), Style::default().fg(color)),
            Span::styled(notice.message.as_str(), Style::default().fg(theme::DIM_WHITE)),
        ]);
        frame.render_widget(Clear, toast);
        frame.render_widget(Paragraph::new(line).block(block), toast);
    }

    fn render_help_overlay(frame: &mut Frame, area: Rect) {
        let width = 56u16.min(area.width.saturating_sub(4));
        let height = 22u16.min(area.height.saturating_sub(2));
        let x = area.width.saturating_sub(width) / 2;
        let y = area.height.saturating_sub(height) / 2;
        let help_area = Rect::new(area.x + x, area.y + y, width, height);

        let block = Block::default()
            .title(" Keyboard Shortcuts ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(Style::default().bg(theme::BG_DARK));

        let section = |title: &'static str| {
            Line::from(Span::styled(format!("  {title}"), Style::default().fg(theme::NEON_CYAN)))
        };
        let entry = |keys: &'static str, what: &'static str| {
            Line::from(vec![
                Span::styled(format!("  {keys:<12}"), theme::key_hint_key()),
                Span::styled(what, theme::key_hint()),
            ])
        };

        let text = vec![
            section("Calendar"),
            entry("←→↑↓ hjkl", "Move the cursor"),
            entry("Enter Space", "Select day (again to clear)"),
            entry("r", "Range mode: pick two ends"),
            entry("Esc", "Cancel range"),
            entry("[ ]", "Previous / next month"),
            entry("t", "Today"),
            entry("c", "Clear the date filter"),
            Line::from(""),
            section("Entries"),
            entry("j/k ↑/↓", "Scroll"),
            entry("Ctrl+d/u", "Page down / up"),
            entry("g/G", "Top / bottom"),
            entry("n/N", "Next / previous match"),
            entry("Enter e", "Expand entry"),
            Line::from(""),
            section("Global"),
            entry("7 / m", "Last 7 days / this month"),
            entry("Tab", "Switch pane"),
            entry("R", "Retry a failed pane"),
            entry("q", "Quit"),
        ];

        frame.render_widget(Clear, help_area);
        frame.render_widget(Paragraph::new(text).block(block), help_area);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use ratatui::{Terminal, backend::TestBackend};

    use daylog_core::{DateRange, Record, SelectionState};

    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn app() -> App {
        let store = Arc::new(RecordStore::with_records(vec![
            Record::new("2025-01-02", "early", "a"),
            Record::new("2025-01-20", "recent", "b"),
            Record::new("2025-01-24", "latest", "c"),
        ]));
        let mut app = App::new(store, &Config::default(), d(25));
        app.terminal_size = (120, 32);
        let snapshot = app.store.snapshot();
        app.process_action(&Action::RecordsUpdated(snapshot)).unwrap();
        app
    }

    /// Run queued actions and paint until `done` holds or attempts run out.
    async fn settle(app: &mut App, done: impl Fn(&App) -> bool) {
        for _ in 0..200 {
            while let Ok(action) = app.action_rx.try_recv() {
                app.process_action(&action).unwrap();
            }
            app.process_action(&Action::Paint).unwrap();
            if done(app) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("app did not settle");
    }

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 32)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(ratatui::buffer::Cell::symbol)
            .collect()
    }

    #[tokio::test]
    async fn test_preset_filters_list_and_highlights_calendar() {
        let mut app = app();
        app.process_action(&Action::ApplyPreset(Preset::LastSevenDays))
            .unwrap();

        settle(&mut app, |app| app.list.statistics().is_some()).await;

        let stats = app.list.statistics().unwrap();
        assert_eq!((stats.visible_entries, stats.total_entries), (2, 3));
        let calendar = app.controller.calendar().lock().unwrap().selection();
        assert_eq!(calendar, SelectionState::Range(DateRange::new(d(19), d(25))));
        assert_eq!(
            app.controller.filter_state().get_current_range(),
            Some(DateRange::new(d(19), d(25)))
        );
        assert!(screen(&app).contains("2 of 3"));
    }

    #[tokio::test]
    async fn test_new_records_are_filtered_by_the_active_preset() {
        let mut app = app();
        app.process_action(&Action::ApplyPreset(Preset::LastSevenDays))
            .unwrap();
        settle(&mut app, |app| app.list.statistics().is_some()).await;

        app.store.upsert(Record::new("2024-06-01", "old", "x"));
        app.store.upsert(Record::new("2025-01-22", "new", "y"));
        let snapshot = app.store.snapshot();
        app.process_action(&Action::RecordsUpdated(snapshot)).unwrap();
        settle(&mut app, |app| {
            app.list.statistics().is_some_and(|stats| stats.total_entries == 5)
        })
        .await;

        let stats = app.list.statistics().unwrap();
        assert_eq!((stats.visible_entries, stats.total_entries), (3, 5));
        assert_eq!(
            app.controller.filter_state().get_current_range(),
            Some(DateRange::new(d(19), d(25)))
        );
        assert!(screen(&app).contains("3 of 5"));
    }

    #[tokio::test]
    async fn test_calendar_selection_reaches_the_list() {
        let mut app = app();
        app.calendar.handle_key_event(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)).unwrap();

        settle(&mut app, |app| app.list.statistics().is_some()).await;
        assert_eq!(app.list.statistics().unwrap().visible_entries, 0);
        assert_eq!(
            app.controller.filter_state().get_current_range(),
            Some(DateRange::single(d(25)))
        );

        app.handle_key_event(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE))
            .unwrap();
        settle(&mut app, |app| app.list.statistics().is_none()).await;
        assert_eq!(app.controller.filter_state().get_current_range(), None);
    }

    #[tokio::test]
    async fn test_global_keys() {
        let mut app = app();
        let key = |code| KeyEvent::new(code, KeyModifiers::NONE);

        assert!(matches!(app.handle_key_event(key(KeyCode::Char('q'))).unwrap(), Some(Action::Quit)));
        assert!(matches!(app.handle_key_event(key(KeyCode::Tab)).unwrap(), Some(Action::FocusNext)));

        app.process_action(&Action::FocusNext).unwrap();
        assert_eq!(app.focus, Focus::List);
        assert!(app.list.focused());
        assert!(!app.calendar.focused());

        app.process_action(&Action::ToggleHelp).unwrap();
        // Help swallows everything but its own close keys.
        assert!(app.handle_key_event(key(KeyCode::Char('q'))).unwrap().is_none());
        assert!(screen(&app).contains("Keyboard Shortcuts"));
    }

    #[tokio::test]
    async fn test_notification_expires_on_tick() {
        let mut app = app();
        app.rates.notification_ttl = Duration::ZERO;
        app.process_action(&Action::Notify(Notice::info("Date filter cleared")))
            .unwrap();
        assert!(screen(&app).contains("Date filter cleared"));

        tokio::time::sleep(Duration::from_millis(2)).await;
        app.process_action(&Action::Tick).unwrap();
        assert!(app.notification.is_none());
    }
}
