//! Palette and semantic styles.

use ratatui::style::{Color, Modifier, Style};

use daylog_core::{ActivityLevel, NoticeLevel};

// ── Core Palette ──────────────────────────────────────────────────────

pub const ELECTRIC_PURPLE: Color = Color::Rgb(225, 53, 255); // #e135ff
pub const NEON_CYAN: Color = Color::Rgb(128, 255, 234); // #80ffea
pub const CORAL: Color = Color::Rgb(255, 106, 193); // #ff6ac1
pub const ELECTRIC_YELLOW: Color = Color::Rgb(241, 250, 140); // #f1fa8c
pub const SUCCESS_GREEN: Color = Color::Rgb(80, 250, 123); // #50fa7b
pub const ERROR_RED: Color = Color::Rgb(255, 99, 99); // #ff6363

// ── Extended Palette ──────────────────────────────────────────────────

pub const DIM_WHITE: Color = Color::Rgb(189, 193, 207); // #bdc1cf
pub const BORDER_GRAY: Color = Color::Rgb(98, 114, 164); // #6272a4
pub const BG_HIGHLIGHT: Color = Color::Rgb(40, 42, 54); // #282a36
pub const BG_DARK: Color = Color::Rgb(30, 31, 41); // #1e1f29
pub const RANGE_FILL: Color = Color::Rgb(60, 30, 75); // selected span background

// ── Semantic Styles ───────────────────────────────────────────────────

pub fn title_style() -> Style {
    Style::default().fg(NEON_CYAN).add_modifier(Modifier::BOLD)
}

pub fn border_focused() -> Style {
    Style::default().fg(ELECTRIC_PURPLE)
}

pub fn border_default() -> Style {
    Style::default().fg(BORDER_GRAY)
}

pub fn border(focused: bool) -> Style {
    if focused {
        border_focused()
    } else {
        border_default()
    }
}

pub fn table_header() -> Style {
    Style::default()
        .fg(NEON_CYAN)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
}

pub fn table_row() -> Style {
    Style::default().fg(DIM_WHITE)
}

pub fn table_selected() -> Style {
    Style::default()
        .fg(ELECTRIC_PURPLE)
        .bg(BG_HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

pub fn key_hint() -> Style {
    Style::default().fg(BORDER_GRAY)
}

pub fn key_hint_key() -> Style {
    Style::default().fg(NEON_CYAN).add_modifier(Modifier::BOLD)
}

// ── Calendar cells ────────────────────────────────────────────────────

/// Day number style. Padding days from adjacent months are dimmed.
pub fn day_number(in_month: bool, is_today: bool) -> Style {
    let base = if in_month {
        Style::default().fg(DIM_WHITE)
    } else {
        Style::default().fg(BORDER_GRAY).add_modifier(Modifier::DIM)
    };
    if is_today {
        base.fg(ELECTRIC_YELLOW).add_modifier(Modifier::BOLD)
    } else {
        base
    }
}

pub fn day_selected() -> Style {
    Style::default().bg(RANGE_FILL).add_modifier(Modifier::BOLD)
}

/// The pending endpoint while a range is being picked.
pub fn day_range_anchor() -> Style {
    Style::default()
        .fg(BG_DARK)
        .bg(CORAL)
        .add_modifier(Modifier::BOLD)
}

pub fn day_cursor() -> Style {
    Style::default().add_modifier(Modifier::REVERSED)
}

pub fn activity(level: ActivityLevel) -> Style {
    let color = match level {
        ActivityLevel::None => BORDER_GRAY,
        ActivityLevel::Low => NEON_CYAN,
        ActivityLevel::Medium => SUCCESS_GREEN,
        ActivityLevel::High => ELECTRIC_PURPLE,
    };
    Style::default().fg(color)
}

// ── Notices ───────────────────────────────────────────────────────────

pub fn notice(level: NoticeLevel) -> (Color, &'static str) {
    match level {
        NoticeLevel::Success => (SUCCESS_GREEN, "✓"),
        NoticeLevel::Error => (ERROR_RED, "✗"),
        NoticeLevel::Warning => (ELECTRIC_YELLOW, "!"),
        NoticeLevel::Info => (NEON_CYAN, "·"),
    }
}
