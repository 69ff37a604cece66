//! Filter summary: the active range, match counts, and preset keys.

use ratatui::text::{Line, Span};

use daylog_core::{DateRange, FilterStatistics};

use crate::theme;

pub fn summary_lines(range: Option<DateRange>, statistics: Option<FilterStatistics>) -> Vec<Line<'static>> {
    let range_line = match range {
        Some(range) => Line::from(vec![
            Span::styled(" Range  ", theme::key_hint()),
            Span::styled(range.to_string(), theme::key_hint_key()),
        ]),
        None => Line::from(vec![
            Span::styled(" Range  ", theme::key_hint()),
            Span::styled("all dates", theme::table_row()),
        ]),
    };

    let mut lines = vec![range_line];
    if let Some(stats) = statistics {
        lines.push(Line::from(vec![
            Span::styled(" Shown  ", theme::key_hint()),
            Span::styled(
                format!("{} of {}", stats.visible_entries, stats.total_entries),
                theme::table_row(),
            ),
        ]));
        if stats.unparsable_entries > 0 {
            lines.push(Line::from(Span::styled(
                format!(" {} without a readable date", stats.unparsable_entries),
                theme::key_hint(),
            )));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(" 7 ", theme::key_hint_key()),
        Span::styled("last 7 days  ", theme::key_hint()),
        Span::styled("m ", theme::key_hint_key()),
        Span::styled("this month", theme::key_hint()),
    ]));
    lines.push(Line::from(vec![
        Span::styled(" r ", theme::key_hint_key()),
        Span::styled("range        ", theme::key_hint()),
        Span::styled("c ", theme::key_hint_key()),
        Span::styled("clear", theme::key_hint()),
    ]));
    lines
}
