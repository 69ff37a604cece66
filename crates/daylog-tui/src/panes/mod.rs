//! Panes: the calendar and the record list, each behind its own error
//! boundary.

pub mod calendar;
pub mod list;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};

use daylog_core::{BoundaryState, ErrorBoundary};

use crate::theme;

pub use calendar::CalendarPane;
pub use list::ListPane;

/// Fallback shown in place of a failed pane.
pub(crate) fn render_fallback(frame: &mut Frame, area: Rect, boundary: &ErrorBoundary, focused: bool) {
    let message = match boundary.state() {
        BoundaryState::Failed { message } => message.as_str(),
        BoundaryState::Healthy => "",
    };
    let block = Block::default()
        .title(Span::styled(format!(" {} ", boundary.section()), theme::title_style()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border(focused).fg(theme::ERROR_RED));
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(format!("  {message}"), theme::table_row())),
        Line::from(""),
        Line::from(vec![
            Span::styled("  R ", theme::key_hint_key()),
            Span::styled("retry", theme::key_hint()),
        ]),
    ];
    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }).block(block), area);
}
