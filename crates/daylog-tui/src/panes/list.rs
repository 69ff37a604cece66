//! Entry list pane: draws the mounted window of the [`VirtualList`] and
//! the detail panel for an expanded row.
//!
//! Scrolling only stages work on the list model; the paint tick applies
//! it and rebuilds the view, so a burst of scroll events costs one
//! re-materialization.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};
use tracing::trace;

use daylog_core::model::format_day_long;
use daylog_core::{CoreError, ErrorBoundary, FilterStatistics, Record, VirtualList, node_or_placeholder};

use crate::action::Action;
use crate::component::Component;
use crate::panes::render_fallback;
use crate::theme;

const DATE_WIDTH: usize = 13;
const WHEEL_ROWS: i64 = 3;

#[derive(Debug)]
struct RowLine {
    index: usize,
    date: String,
    title: String,
    body: String,
    truncated: bool,
    expanded: bool,
}

#[derive(Debug)]
struct ListView {
    rows: Vec<RowLine>,
    empty: Option<&'static str>,
    detail: Option<Arc<Record>>,
    counts: String,
    window: String,
}

fn build_view(list: &VirtualList, selected: Option<usize>) -> Result<ListView, CoreError> {
    let total = list.total_records();
    let preview = list.config().preview_chars;

    let mut rows = Vec::with_capacity(list.mounted().len());
    for row in list.mounted() {
        if row.index >= total {
            return Err(CoreError::render(
                "entry list",
                format!("row {} is outside {total} entries", row.index),
            ));
        }
        if row.hidden {
            continue;
        }
        rows.push(RowLine {
            index: row.index,
            date: row.date_label(),
            title: row.record.title.clone(),
            body: row.body(preview).replace('\n', " "),
            truncated: row.is_truncated(preview),
            expanded: row.expanded,
        });
    }

    let detail = selected
        .and_then(|index| list.record(index))
        .filter(|record| list.is_expanded(&record.id))
        .cloned();

    let counts = match list.applied().statistics {
        Some(stats) => format!("{}/{}", stats.visible_entries, stats.total_entries),
        None => total.to_string(),
    };
    let first = list.start_index();
    let last = first + list.mounted().len();
    let window = if total == 0 {
        String::new()
    } else {
        format!("{}–{last} of {total}", first + 1)
    };

    Ok(ListView {
        rows,
        empty: list.empty_message(),
        detail,
        counts,
        window,
    })
}

/// Row list on the left, detail panel on the right when a row is expanded.
fn split(area: Rect, has_detail: bool) -> (Rect, Option<Rect>) {
    if has_detail {
        let [rows, detail] =
            Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)]).areas(area);
        (rows, Some(detail))
    } else {
        (area, None)
    }
}

pub struct ListPane {
    list: VirtualList,
    boundary: ErrorBoundary,
    view: Option<ListView>,
    selected: Option<usize>,
    focused: bool,
}

impl ListPane {
    pub fn new(list: VirtualList) -> Self {
        let mut pane = Self {
            list,
            boundary: ErrorBoundary::new("entry list"),
            view: None,
            selected: None,
            focused: false,
        };
        pane.refresh();
        pane
    }

    /// Statistics of the filter the list currently shows.
    pub fn statistics(&self) -> Option<FilterStatistics> {
        self.list.applied().statistics
    }

    pub fn is_failed(&self) -> bool {
        self.boundary.is_failed()
    }

    fn refresh(&mut self) {
        let list = &self.list;
        let selected = self.selected;
        self.view = self.boundary.run(|| build_view(list, selected));
    }

    fn paint(&mut self) {
        let tick = self.list.on_paint_tick();
        if tick.rematerialized || tick.visibility_updates > 0 {
            trace!(?tick, "list paint");
            self.settle_window();
        }
        self.refresh();
    }

    /// Keep the selection on a drawn row, and bring the first match into
    /// view when a filter hides the whole window.
    fn settle_window(&mut self) {
        let mounted_visible: Vec<usize> = self
            .list
            .mounted()
            .iter()
            .filter(|row| !row.hidden)
            .map(|row| row.index)
            .collect();

        if mounted_visible.is_empty() {
            if let Some(first) = self.first_visible() {
                self.list.scroll_to_index(first);
                self.selected = Some(first);
            } else {
                self.selected = None;
            }
            return;
        }

        if !self
            .selected
            .is_some_and(|index| mounted_visible.contains(&index))
        {
            self.selected = mounted_visible.first().copied();
        }
    }

    fn first_visible(&self) -> Option<usize> {
        if self.list.total_records() > 0 && !self.list.is_hidden(0) {
            Some(0)
        } else {
            self.list.next_visible_from(0)
        }
    }

    fn scroll_rows(&mut self, delta: i64) {
        let row_height = u64::from(self.list.config().row_height.max(1));
        let step = delta.unsigned_abs().saturating_mul(row_height);
        let current = self.list.scroll_offset();
        let target = if delta >= 0 {
            current.saturating_add(step)
        } else {
            current.saturating_sub(step)
        };
        self.list.on_scroll(target);
    }

    fn page(&self) -> i64 {
        i64::try_from(self.list.config().visible_rows).unwrap_or(i64::MAX)
    }

    /// Select `index` and scroll it into the mounted window.
    fn select(&mut self, index: usize) {
        self.selected = Some(index);
        let rows = self.list.config().visible_rows;
        let start = self.list.start_index();
        if index < start {
            self.list.scroll_to_index(index);
        } else if index >= start + rows {
            self.list.scroll_to_index(index + 1 - rows);
        }
    }

    fn jump_next(&mut self) {
        let next = match self.selected {
            Some(index) => self.list.next_visible_from(index),
            None => self.first_visible(),
        };
        if let Some(index) = next {
            self.select(index);
        }
    }

    fn jump_prev(&mut self) {
        if let Some(index) = self
            .selected
            .and_then(|index| self.list.prev_visible_from(index))
        {
            self.select(index);
        }
    }

    fn toggle_selected(&mut self) {
        let Some(id) = self
            .selected
            .and_then(|index| self.list.record(index))
            .map(|record| record.id.clone())
        else {
            return;
        };
        self.list.toggle_expanded(&id);
        self.refresh();
    }

    fn render_rows(&self, frame: &mut Frame, area: Rect, view: &ListView) {
        let block = Block::default()
            .title(Span::styled(format!(" Entries {} ", view.counts), theme::title_style()))
            .title_bottom(Line::from(Span::styled(format!(" {} ", view.window), theme::key_hint())).right_aligned())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border(self.focused));

        if let Some(message) = view.empty {
            let text = vec![Line::from(""), Line::from(Span::styled(message, theme::key_hint()))];
            frame.render_widget(
                Paragraph::new(text).alignment(Alignment::Center).block(block),
                area,
            );
            return;
        }

        let lines: Vec<Line> = view
            .rows
            .iter()
            .map(|row| {
                let selected = self.selected == Some(row.index);
                let marker = match (row.expanded, row.truncated) {
                    (true, _) => "▾ ",
                    (false, true) => "▸ ",
                    (false, false) => "  ",
                };
                let line = Line::from(vec![
                    Span::styled(marker, theme::key_hint()),
                    Span::styled(format!("{:<DATE_WIDTH$}", row.date), theme::table_header().remove_modifier(Modifier::UNDERLINED)),
                    Span::styled(format!("{} ", row.title), Style::default().fg(theme::NEON_CYAN)),
                    Span::styled(row.body.clone(), theme::table_row()),
                ]);
                if selected && self.focused {
                    line.style(theme::table_selected())
                } else {
                    line
                }
            })
            .collect();
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_detail(frame: &mut Frame, area: Rect, record: &Record) {
        let block = Block::default()
            .title(Span::styled(format!(" {} ", record.title), theme::title_style()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());

        let date = record
            .day()
            .map_or_else(|| record.date.clone(), format_day_long);
        let mut text = vec![
            Line::from(Span::styled(date, theme::key_hint_key())),
            Line::from(Span::styled(format!("{} words", record.word_count), theme::key_hint())),
        ];
        for (name, value) in &record.metrics {
            text.push(Line::from(vec![
                Span::styled(format!("{name}: "), theme::key_hint()),
                Span::styled(value.to_string(), theme::table_row()),
            ]));
        }
        text.push(Line::from(""));
        text.extend(
            record
                .content
                .lines()
                .map(|line| Line::from(Span::styled(line.to_owned(), theme::table_row()))),
        );
        frame.render_widget(
            Paragraph::new(text).wrap(Wrap { trim: false }).block(block),
            area,
        );
    }
}

impl Component for ListPane {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match (key.modifiers, key.code) {
            (_, KeyCode::Down | KeyCode::Char('j')) => self.scroll_rows(1),
            (_, KeyCode::Up | KeyCode::Char('k')) => self.scroll_rows(-1),
            (KeyModifiers::CONTROL, KeyCode::Char('d')) | (_, KeyCode::PageDown) => {
                self.scroll_rows(self.page());
            }
            (KeyModifiers::CONTROL, KeyCode::Char('u')) | (_, KeyCode::PageUp) => {
                self.scroll_rows(-self.page());
            }
            (_, KeyCode::Home | KeyCode::Char('g')) => {
                self.list.on_scroll(0);
            }
            (_, KeyCode::End | KeyCode::Char('G')) => {
                self.list.on_scroll(u64::MAX);
            }
            (_, KeyCode::Char('n')) => self.jump_next(),
            (_, KeyCode::Char('N' | 'p')) => self.jump_prev(),
            (_, KeyCode::Enter | KeyCode::Char('e' | ' ')) => self.toggle_selected(),
            _ => {}
        }
        Ok(None)
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent, area: Rect) -> Result<Option<Action>> {
        match mouse.kind {
            MouseEventKind::ScrollDown => self.scroll_rows(WHEEL_ROWS),
            MouseEventKind::ScrollUp => self.scroll_rows(-WHEEL_ROWS),
            MouseEventKind::Down(MouseButton::Left) => {
                let Some(view) = &self.view else {
                    return Ok(None);
                };
                let (rows_area, _) = split(area, view.detail.is_some());
                let inner = Block::default().borders(Borders::ALL).inner(rows_area);
                if mouse.row >= inner.y && mouse.column >= inner.x {
                    let line = usize::from(mouse.row - inner.y);
                    if let Some(index) = view.rows.get(line).map(|row| row.index) {
                        self.selected = Some(index);
                        self.refresh();
                    }
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::RecordsUpdated(records) => {
                self.list.full_render(Arc::clone(records));
                self.selected = None;
                self.settle_window();
                self.refresh();
            }
            Action::Paint => self.paint(),
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
        let (rows_area, detail_area) = split(area, view.detail.is_some());
        self.render_rows(frame, rows_area, view);
        if let Some(record) = &view.detail {
            // An empty placeholder area draws nothing.
            let detail_area = node_or_placeholder(detail_area, "detail panel");
            Self::render_detail(frame, detail_area, record);
        }
    }

    fn focused(&self) -> bool {
        self.focused
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &'static str {
        "entry list"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use ratatui::{Terminal, backend::TestBackend};

    use daylog_core::{ListConfig, VisibilityFeed, VisibilityResult, VisibilitySink};

    use super::*;

    fn records(n: usize) -> Arc<Vec<Arc<Record>>> {
        Arc::new(
            (0..n)
                .map(|i| {
                    Arc::new(
                        Record::new("2025-01-02", format!("entry {i}"), "body text").with_id(format!("r{i}")),
                    )
                })
                .collect(),
        )
    }

    fn pane_with(n: usize) -> (ListPane, Arc<VisibilityFeed>) {
        let feed = VisibilityFeed::new();
        let mut pane = ListPane::new(VirtualList::new(ListConfig::default(), Arc::clone(&feed)));
        pane.set_focused(true);
        pane.update(&Action::RecordsUpdated(records(n))).unwrap();
        (pane, feed)
    }

    fn hide_all_but(feed: &VisibilityFeed, n: usize, keep: &[usize]) {
        let map: Vec<VisibilityResult> = (0..n)
            .map(|i| VisibilityResult {
                id: format!("r{i}"),
                visible: keep.contains(&i),
            })
            .collect();
        feed.apply_visibility(
            map.into(),
            FilterStatistics {
                total_entries: n,
                visible_entries: keep.len(),
                unparsable_entries: 0,
            },
        );
    }

    fn screen(pane: &ListPane) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 16)).unwrap();
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
    fn test_only_the_window_is_drawn() {
        let (pane, _) = pane_with(10_000);
        let view = pane.view.as_ref().unwrap();
        assert_eq!(view.rows.len(), 12);
        assert_eq!(view.window, "1–12 of 10000");
        assert_eq!(pane.selected, Some(0));
        let text = screen(&pane);
        assert!(text.contains("Entries 10000"));
        assert!(text.contains("entry 11"));
        assert!(!text.contains("entry 12 "));
    }

    #[test]
    fn test_filter_hides_rows_on_paint() {
        let (mut pane, feed) = pane_with(20);
        hide_all_but(&feed, 20, &[1, 3]);
        // Nothing changes until the paint tick.
        assert_eq!(pane.view.as_ref().unwrap().rows.len(), 12);

        pane.update(&Action::Paint).unwrap();
        let view = pane.view.as_ref().unwrap();
        assert_eq!(view.rows.iter().map(|r| r.index).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(view.counts, "2/20");
        assert_eq!(pane.selected, Some(1));
    }

    #[test]
    fn test_window_follows_first_match_when_all_mounted_rows_hide() {
        let (mut pane, feed) = pane_with(100);
        hide_all_but(&feed, 100, &[50]);
        pane.update(&Action::Paint).unwrap();
        // Scroll was staged by the first paint and applied by the next.
        pane.update(&Action::Paint).unwrap();
        let view = pane.view.as_ref().unwrap();
        assert_eq!(view.rows.iter().map(|r| r.index).collect::<Vec<_>>(), vec![50]);
        assert_eq!(pane.selected, Some(50));
    }

    #[test]
    fn test_empty_messages() {
        let (pane, _) = pane_with(0);
        assert!(screen(&pane).contains("No entries yet."));

        let (mut pane, feed) = pane_with(5);
        hide_all_but(&feed, 5, &[]);
        pane.update(&Action::Paint).unwrap();
        assert!(screen(&pane).contains("No entries in the selected dates."));
        assert_eq!(pane.selected, None);
    }

    #[test]
    fn test_next_visible_jumps_over_hidden_rows() {
        let (mut pane, feed) = pane_with(40);
        hide_all_but(&feed, 40, &[0, 30, 35]);
        pane.update(&Action::Paint).unwrap();
        assert_eq!(pane.selected, Some(0));

        pane.handle_key_event(KeyEvent::new(KeyCode::Char('n'), KeyModifiers::NONE))
            .unwrap();
        assert_eq!(pane.selected, Some(30));
        pane.update(&Action::Paint).unwrap();
        assert_eq!(pane.list.start_index(), 19);

        pane.handle_key_event(KeyEvent::new(KeyCode::Char('N'), KeyModifiers::SHIFT))
            .unwrap();
        assert_eq!(pane.selected, Some(0));
    }

    #[test]
    fn test_expanded_row_opens_detail() {
        let (mut pane, _) = pane_with(3);
        pane.handle_key_event(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))
            .unwrap();
        let detail = pane.view.as_ref().unwrap().detail.as_ref().unwrap();
        assert_eq!(detail.id, "r0");
        assert!(screen(&pane).contains("Thursday, January 2, 2025"));

        // Expand state survives a re-materialization.
        pane.update(&Action::RecordsUpdated(records(3))).unwrap();
        assert!(pane.view.as_ref().unwrap().rows[0].expanded);
    }

    #[test]
    fn test_wheel_scroll_is_applied_on_paint() {
        let (mut pane, _) = pane_with(100);
        let area = Rect::new(0, 0, 100, 16);
        let wheel = MouseEvent {
            kind: MouseEventKind::ScrollDown,
            column: 5,
            row: 5,
            modifiers: KeyModifiers::NONE,
        };
        pane.handle_mouse_event(wheel, area).unwrap();
        pane.handle_mouse_event(wheel, area).unwrap();
        assert_eq!(pane.list.start_index(), 0);
        pane.update(&Action::Paint).unwrap();
        assert_eq!(pane.list.start_index(), 6);
        assert_eq!(pane.selected, Some(6));
    }
}
