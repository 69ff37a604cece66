// ── Selection state ──

use std::fmt;

use chrono::NaiveDate;

use crate::model::{DateRange, format_day};

/// What the calendar currently has selected.
///
/// Dates are stored by value, so a caller reusing or changing its own
/// date afterwards can never alter a stored selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    None,
    SingleDay(NaiveDate),
    /// First endpoint picked in range mode, waiting for the second.
    RangeInProgress(NaiveDate),
    Range(DateRange),
}

impl SelectionState {
    /// Selection equivalent to an applied filter range.
    pub fn from_range(range: DateRange) -> Self {
        if range.is_single_day() {
            Self::SingleDay(range.start())
        } else {
            Self::Range(range)
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Range this selection filters to. `RangeInProgress` filters nothing yet.
    pub fn range(&self) -> Option<DateRange> {
        match *self {
            Self::SingleDay(day) => Some(DateRange::single(day)),
            Self::Range(range) => Some(range),
            Self::None | Self::RangeInProgress(_) => None,
        }
    }

    /// Whether `date` is highlighted as selected.
    pub fn contains(&self, date: NaiveDate) -> bool {
        match *self {
            Self::None => false,
            Self::SingleDay(day) | Self::RangeInProgress(day) => day == date,
            Self::Range(range) => range.contains(date),
        }
    }
}

impl fmt::Display for SelectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("no selection"),
            Self::SingleDay(day) => f.write_str(&format_day(*day)),
            Self::RangeInProgress(start) => write!(f, "{} – …", format_day(*start)),
            Self::Range(range) => write!(f, "{range}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn from_range_collapses_single_days() {
        let one = DateRange::single(d(2025, 1, 3));
        assert_eq!(SelectionState::from_range(one), SelectionState::SingleDay(d(2025, 1, 3)));
        let many = DateRange::new(d(2025, 1, 3), d(2025, 1, 10));
        assert_eq!(SelectionState::from_range(many), SelectionState::Range(many));
    }

    #[test]
    fn in_progress_highlights_but_filters_nothing() {
        let s = SelectionState::RangeInProgress(d(2025, 1, 3));
        assert!(s.contains(d(2025, 1, 3)));
        assert!(!s.contains(d(2025, 1, 4)));
        assert_eq!(s.range(), None);
    }

    #[test]
    fn display() {
        insta::assert_snapshot!(SelectionState::None, @"no selection");
        insta::assert_snapshot!(
            SelectionState::RangeInProgress(d(2025, 1, 3)),
            @"Jan 3, 2025 – …"
        );
    }
}
