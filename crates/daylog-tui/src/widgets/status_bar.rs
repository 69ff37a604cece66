//! Bottom status bar: working indicator, focused-day description, and key
//! hints.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use throbber_widgets_tui::{Throbber, ThrobberState};

use crate::action::Focus;
use crate::theme;

const THROBBER_WIDTH: u16 = 18;

#[derive(Debug, Clone, Copy, Default)]
pub struct StatusLine<'a> {
    pub working: bool,
    pub progress: Option<u8>,
    pub focus: Focus,
    /// Accessible description of the calendar cell under the cursor.
    pub day_description: Option<&'a str>,
}

impl StatusLine<'_> {
    pub fn working_label(&self) -> String {
        match self.progress {
            Some(percent) => format!("Filtering {percent}%"),
            None => "Filtering".into(),
        }
    }

    pub fn hints(&self) -> Line<'static> {
        let pane = match self.focus {
            Focus::Calendar => "←→↑↓ move  ⏎ select",
            Focus::List => "j/k scroll  n/N next match  ⏎ expand",
        };
        Line::from(vec![
            Span::styled(format!("{pane}  "), theme::key_hint()),
            Span::styled("Tab", theme::key_hint_key()),
            Span::styled(" pane  ", theme::key_hint()),
            Span::styled("?", theme::key_hint_key()),
            Span::styled(" help  ", theme::key_hint()),
            Span::styled("q", theme::key_hint_key()),
            Span::styled(" quit ", theme::key_hint()),
        ])
    }
}

pub fn render_status_bar(frame: &mut Frame, area: Rect, status: &StatusLine<'_>, throbber: &ThrobberState) {
    let hints = status.hints();
    let hints_width = u16::try_from(hints.width()).unwrap_or(u16::MAX);
    let indicator_width = if status.working { THROBBER_WIDTH } else { 0 };
    let [indicator, description, hint_area] = Layout::horizontal([
        Constraint::Length(indicator_width),
        Constraint::Min(0),
        Constraint::Length(hints_width),
    ])
    .areas(area);

    if status.working {
        let widget = Throbber::default()
            .label(status.working_label())
            .style(Style::default().fg(theme::NEON_CYAN))
            .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
        frame.render_stateful_widget(widget, indicator, &mut throbber.clone());
    }

    if let Some(text) = status.day_description {
        frame.render_widget(
            Paragraph::new(Span::styled(format!(" {text}"), theme::table_row())),
            description,
        );
    }

    frame.render_widget(Paragraph::new(hints).alignment(Alignment::Right), hint_area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_working_label_includes_progress() {
        let mut status = StatusLine {
            working: true,
            ..StatusLine::default()
        };
        assert_eq!(status.working_label(), "Filtering");
        status.progress = Some(40);
        assert_eq!(status.working_label(), "Filtering 40%");
    }

    #[test]
    fn test_hints_follow_focus() {
        let status = StatusLine {
            focus: Focus::List,
            ..StatusLine::default()
        };
        assert!(status.hints().to_string().starts_with("j/k scroll"));
    }
}
