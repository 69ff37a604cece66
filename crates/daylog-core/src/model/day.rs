// ── Day view-model ──
//
// Derived per render from the record store; never stored.

use std::sync::Arc;

use chrono::NaiveDate;
use strum::{Display, EnumIter};

use super::date::format_day_long;
use super::record::Record;

/// Activity tier of a day, a pure function of its record count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum ActivityLevel {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl ActivityLevel {
    pub fn from_count(count: usize) -> Self {
        match count {
            0 => Self::None,
            1 => Self::Low,
            2 => Self::Medium,
            _ => Self::High,
        }
    }

    /// Number of tier ticks rendered for this level (0–3).
    pub fn ticks(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaySummary {
    pub count: usize,
    pub level: ActivityLevel,
}

impl DaySummary {
    pub fn from_count(count: usize) -> Self {
        Self {
            count,
            level: ActivityLevel::from_count(count),
        }
    }
}

/// One cell of the month grid.
#[derive(Debug, Clone)]
pub struct Day {
    pub date: NaiveDate,
    pub is_current_month: bool,
    pub is_today: bool,
    pub is_selected: bool,
    pub records: Vec<Arc<Record>>,
    pub summary: DaySummary,
}

impl Day {
    /// Number of record marks to draw, capped at `max_markers`.
    pub fn marker_count(&self, max_markers: usize) -> usize {
        self.summary.count.min(max_markers)
    }

    /// Full description of the cell: date, today/selected state and record count.
    pub fn accessible_description(&self) -> String {
        let mut parts = vec![format_day_long(self.date)];
        if self.is_today {
            parts.push("today".into());
        }
        if self.is_selected {
            parts.push("selected".into());
        }
        parts.push(match self.summary.count {
            0 => "no entries".into(),
            1 => "1 entry".into(),
            n => format!("{n} entries"),
        });
        parts.join(", ")
    }
}
