//! Calendar pane: month grid with record markers, keyboard cursor, and
//! mouse selection.
//!
//! The pane is a thin view over the shared [`Calendar`]: every selection
//! goes through the calendar's state machine, and the filter hook the
//! sync controller installed takes it from there.

use std::sync::{Arc, PoisonError};

use chrono::{Datelike, NaiveDate};
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};

use daylog_core::calendar::{GRID_CELLS, GRID_WEEKS, weekday_labels};
use daylog_core::{Calendar, CoreError, Day, ErrorBoundary, SelectionState, SharedCalendar};

use crate::action::Action;
use crate::component::Component;
use crate::panes::render_fallback;
use crate::theme;

/// Cell width in columns, including padding.
const CELL_WIDTH: u16 = 5;
/// Outer size of the pane at its preferred layout: weekday row plus six
/// two-line weeks, inside a border.
pub const PREFERRED_WIDTH: u16 = CELL_WIDTH * 7 + 2;
pub const PREFERRED_HEIGHT: u16 = 1 + 2 * 6 + 2;

/// Everything one frame of the grid needs, captured under the lock.
#[derive(Debug)]
struct CalendarView {
    title: String,
    labels: [&'static str; 7],
    days: Vec<Day>,
    cursor: NaiveDate,
    selection: SelectionState,
    range_mode: bool,
    max_markers: usize,
    focused_description: Option<String>,
}

fn build_view(calendar: &mut Calendar) -> Result<CalendarView, CoreError> {
    let days = calendar.days();
    if days.len() != GRID_CELLS {
        return Err(CoreError::render(
            "calendar",
            format!("grid has {} cells", days.len()),
        ));
    }
    let cursor = calendar.cursor();
    let focused_description = days
        .iter()
        .find(|d| d.date == cursor)
        .map(Day::accessible_description);
    Ok(CalendarView {
        title: calendar.month().format("%B %Y").to_string(),
        labels: weekday_labels(calendar.config()),
        days,
        cursor,
        selection: calendar.selection(),
        range_mode: calendar.range_mode(),
        max_markers: calendar.config().max_markers,
        focused_description,
    })
}

/// Where the grid cells sit inside the pane.
#[derive(Debug, Clone, Copy)]
struct GridGeometry {
    inner: Rect,
    cell_width: u16,
    row_height: u16,
}

impl GridGeometry {
    fn new(area: Rect) -> Self {
        let inner = Block::default().borders(Borders::ALL).inner(area);
        let weeks = u16::try_from(GRID_WEEKS).unwrap_or(6);
        Self {
            inner,
            cell_width: (inner.width / 7).max(1),
            row_height: if inner.height > weeks * 2 { 2 } else { 1 },
        }
    }

    fn cell_rect(&self, index: usize) -> Rect {
        let col = u16::try_from(index % 7).unwrap_or(0);
        let row = u16::try_from(index / 7).unwrap_or(0);
        Rect::new(
            self.inner.x + col * self.cell_width,
            self.inner.y + 1 + row * self.row_height,
            self.cell_width,
            self.row_height,
        )
        .intersection(self.inner)
    }

    /// Grid index under a terminal position, if it hits a cell.
    fn index_at(&self, column: u16, row: u16) -> Option<usize> {
        let grid_top = self.inner.y + 1;
        if column < self.inner.x || row < grid_top {
            return None;
        }
        let col = usize::from((column - self.inner.x) / self.cell_width);
        let week = usize::from((row - grid_top) / self.row_height);
        (col < 7 && week < GRID_WEEKS).then_some(week * 7 + col)
    }
}

pub struct CalendarPane {
    calendar: SharedCalendar,
    boundary: ErrorBoundary,
    view: Option<CalendarView>,
    focused: bool,
}

impl CalendarPane {
    pub fn new(calendar: SharedCalendar) -> Self {
        let recover = Arc::clone(&calendar);
        let boundary = ErrorBoundary::new("calendar").with_recovery(move || {
            recover
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .go_to_today();
            true
        });
        let mut pane = Self {
            calendar,
            boundary,
            view: None,
            focused: false,
        };
        pane.refresh();
        pane
    }

    fn with_calendar<T>(&self, f: impl FnOnce(&mut Calendar) -> T) -> T {
        let mut calendar = self.calendar.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut calendar)
    }

    fn refresh(&mut self) {
        let calendar = &self.calendar;
        self.view = self.boundary.run(|| {
            let mut calendar = calendar.lock().unwrap_or_else(PoisonError::into_inner);
            build_view(&mut calendar)
        });
    }

    /// Spoken-style description of the day under the cursor.
    pub fn focused_description(&self) -> Option<&str> {
        self.view.as_ref()?.focused_description.as_deref()
    }

    pub fn is_failed(&self) -> bool {
        self.boundary.is_failed()
    }

    /// Month, range, and clear keys. They work whichever pane has focus.
    /// Returns whether the key was used.
    pub fn handle_calendar_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return false;
        }
        match key.code {
            KeyCode::Char('[') => {
                self.with_calendar(Calendar::previous_month);
            }
            KeyCode::Char(']') => {
                self.with_calendar(Calendar::next_month);
            }
            KeyCode::Char('t') => self.with_calendar(Calendar::go_to_today),
            KeyCode::Char('r') => {
                self.with_calendar(Calendar::toggle_range_mode);
            }
            KeyCode::Char('c') => self.with_calendar(Calendar::clear_selection),
            _ => return false,
        }
        true
    }

    fn render_grid(&self, frame: &mut Frame, geometry: GridGeometry, view: &CalendarView) {
        let inner = geometry.inner;
        let labels: Vec<Span> = view
            .labels
            .iter()
            .map(|label| {
                Span::styled(
                    format!("{label:^width$}", width = usize::from(geometry.cell_width)),
                    theme::table_header(),
                )
            })
            .collect();
        frame.render_widget(
            Paragraph::new(Line::from(labels)),
            Rect::new(inner.x, inner.y, inner.width, 1),
        );

        for (index, day) in view.days.iter().enumerate() {
            let area = geometry.cell_rect(index);
            if area.is_empty() {
                continue;
            }
            let mut lines = vec![Line::from(Span::styled(
                format!("{:>2}", day.date.day()),
                self.day_style(view, day),
            ))];
            if geometry.row_height > 1 {
                lines.push(markers(day, view.max_markers));
            }
            frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
        }
    }

    fn day_style(&self, view: &CalendarView, day: &Day) -> Style {
        let mut style = theme::day_number(day.is_current_month, day.is_today);
        if view.selection == SelectionState::RangeInProgress(day.date) {
            style = style.patch(theme::day_range_anchor());
        } else if day.is_selected {
            style = style.patch(theme::day_selected());
        }
        if self.focused && day.date == view.cursor {
            style = style.patch(theme::day_cursor());
        }
        style
    }
}

/// Activity marks for one cell: one dot per record up to the cap, then `+`.
fn markers(day: &Day, max_markers: usize) -> Line<'static> {
    let shown = day.marker_count(max_markers);
    let mut text = "•".repeat(shown);
    if day.summary.count > shown {
        text.push('+');
    }
    Line::from(Span::styled(text, theme::activity(day.summary.level)))
}

impl Component for CalendarPane {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.with_calendar(|c| c.move_cursor(-1)),
            KeyCode::Right | KeyCode::Char('l') => self.with_calendar(|c| c.move_cursor(1)),
            KeyCode::Up | KeyCode::Char('k') => self.with_calendar(|c| c.move_cursor(-7)),
            KeyCode::Down | KeyCode::Char('j') => self.with_calendar(|c| c.move_cursor(7)),
            // Primary and secondary activation select the same way.
            KeyCode::Enter | KeyCode::Char(' ') => self.with_calendar(Calendar::activate_cursor),
            KeyCode::Esc => self.with_calendar(|c| c.set_range_mode(false)),
            _ => {}
        }
        Ok(None)
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent, area: Rect) -> Result<Option<Action>> {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let geometry = GridGeometry::new(area);
                if let Some(index) = geometry.index_at(mouse.column, mouse.row) {
                    self.with_calendar(|c| {
                        if let Some(date) = c.date_at(index) {
                            c.select_day(date);
                        }
                    });
                }
            }
            MouseEventKind::ScrollUp => {
                self.with_calendar(Calendar::previous_month);
            }
            MouseEventKind::ScrollDown => {
                self.with_calendar(Calendar::next_month);
            }
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::Paint => self.refresh(),
            Action::RetrySections => {
                self.boundary.retry();
                self.refresh();
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let Some(view) = &self.view else {
            render_fallback(frame, area, &self.boundary, self.focused);
            return;
        };

        let mut title = vec![Span::styled(format!(" {} ", view.title), theme::title_style())];
        if view.range_mode {
            title.push(Span::styled(" RANGE ", theme::day_range_anchor()));
        }
        let block = Block::default()
            .title(Line::from(title))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border(self.focused));
        frame.render_widget(block, area);

        self.render_grid(frame, GridGeometry::new(area), view);
    }

    fn focused(&self) -> bool {
        self.focused
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &'static str {
        "calendar"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use ratatui::{Terminal, backend::TestBackend};

    use daylog_core::{CalendarConfig, Record, RecordStore};

    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn pane() -> (CalendarPane, SharedCalendar) {
        let store = Arc::new(RecordStore::with_records(vec![
            Record::new("2025-01-15", "a", ""),
            Record::new("2025-01-15", "b", ""),
        ]));
        let calendar = Calendar::new(store, CalendarConfig::default(), d(15)).into_shared();
        let mut pane = CalendarPane::new(Arc::clone(&calendar));
        pane.set_focused(true);
        (pane, calendar)
    }

    fn screen(pane: &CalendarPane) -> String {
        let mut terminal =
            Terminal::new(TestBackend::new(PREFERRED_WIDTH, PREFERRED_HEIGHT)).unwrap();
        terminal
            .draw(|frame| pane.render(frame, frame.area()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(ratatui::buffer::Cell::symbol)
            .collect()
    }

    #[test]
    fn test_renders_month_title_and_markers() {
        let (pane, _) = pane();
        let text = screen(&pane);
        assert!(text.contains("January 2025"));
        assert!(text.contains("Su"));
        assert!(text.contains("••"));
    }

    #[test]
    fn test_enter_selects_cursor_day() {
        let (mut pane, calendar) = pane();
        pane.handle_key_event(key(KeyCode::Right)).unwrap();
        pane.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert_eq!(
            calendar.lock().unwrap().selection(),
            SelectionState::SingleDay(d(16))
        );

        // Space is the same activation, so it toggles the day off again.
        pane.handle_key_event(key(KeyCode::Char(' '))).unwrap();
        assert!(calendar.lock().unwrap().selection().is_none());
    }

    #[test]
    fn test_calendar_keys_drive_range_mode_and_months() {
        let (mut pane, calendar) = pane();
        assert!(pane.handle_calendar_key(key(KeyCode::Char('r'))));
        pane.handle_key_event(key(KeyCode::Enter)).unwrap();
        pane.handle_key_event(key(KeyCode::Down)).unwrap();
        pane.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert_eq!(
            calendar.lock().unwrap().selection(),
            SelectionState::from_range(daylog_core::DateRange::new(d(15), d(22)))
        );

        assert!(pane.handle_calendar_key(key(KeyCode::Char(']'))));
        assert_eq!(calendar.lock().unwrap().month().month(), 2);
        assert!(pane.handle_calendar_key(key(KeyCode::Char('t'))));
        assert_eq!(calendar.lock().unwrap().month().month(), 1);
        assert!(!pane.handle_calendar_key(key(KeyCode::Char('x'))));
    }

    #[test]
    fn test_focused_description_follows_cursor() {
        let (mut pane, _) = pane();
        assert_eq!(
            pane.focused_description(),
            Some("Wednesday, January 15, 2025, today, 2 entries")
        );
        pane.handle_key_event(key(KeyCode::Left)).unwrap();
        pane.update(&Action::Paint).unwrap();
        assert_eq!(
            pane.focused_description(),
            Some("Tuesday, January 14, 2025, no entries")
        );
    }

    #[test]
    fn test_click_hits_the_right_cell() {
        let (mut pane, calendar) = pane();
        let area = Rect::new(0, 0, PREFERRED_WIDTH, PREFERRED_HEIGHT);
        let geometry = GridGeometry::new(area);
        // January 2025 starts on a Wednesday: index 3 is the 1st.
        let cell = geometry.cell_rect(3);
        pane.handle_mouse_event(
            MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column: cell.x + 1,
                row: cell.y,
                modifiers: KeyModifiers::NONE,
            },
            area,
        )
        .unwrap();
        assert_eq!(
            calendar.lock().unwrap().selection(),
            SelectionState::SingleDay(d(1))
        );
        assert_eq!(geometry.index_at(0, 0), None);
    }
}
