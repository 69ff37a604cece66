//! All UI actions. Actions are the sole mechanism for app-level state
//! mutation; the core's own state (calendar, filter) changes through the
//! controller and shows up on the next paint.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;

use daylog_core::{DateRange, Notice, Record};

/// Which pane receives keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Calendar,
    List,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Self::Calendar => Self::List,
            Self::List => Self::Calendar,
        }
    }
}

/// Filters that bypass the calendar and are written straight into the
/// external filter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    LastSevenDays,
    ThisMonth,
}

impl Preset {
    pub fn range(self, today: NaiveDate) -> DateRange {
        match self {
            Self::LastSevenDays => DateRange::last_n_days(today, 7),
            Self::ThisMonth => DateRange::month_of(today),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LastSevenDays => write!(f, "last 7 days"),
            Self::ThisMonth => write!(f, "this month"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──
    Quit,
    Tick,
    /// The paint tick: panes apply staged work, then the frame is drawn.
    Paint,
    Resize(u16, u16),

    // ── Data ──
    RecordsUpdated(Arc<Vec<Arc<Record>>>),

    // ── Status ──
    Notify(Notice),
    Working(bool),
    Progress(u8),

    // ── Navigation ──
    FocusNext,
    ToggleHelp,

    // ── Filtering ──
    ApplyPreset(Preset),

    /// Reset every failed pane to healthy.
    RetrySections,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn presets_end_today() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        let week = Preset::LastSevenDays.range(today);
        assert_eq!(week.end(), today);
        assert_eq!(week.len_days(), 7);

        let month = Preset::ThisMonth.range(today);
        assert_eq!(month.start(), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(month.end(), NaiveDate::from_ymd_opt(2025, 3, 31).unwrap());
    }

    #[test]
    fn focus_cycles() {
        assert_eq!(Focus::Calendar.next(), Focus::List);
        assert_eq!(Focus::List.next().next(), Focus::List);
    }
}
