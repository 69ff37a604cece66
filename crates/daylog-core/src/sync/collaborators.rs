// ── External collaborators ──
//
// Interfaces the controller talks to: the external filter state, the
// user-facing status surface, and the list's visibility input.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use strum::Display;

use crate::model::DateRange;
use crate::pipeline::{FilterStatistics, VisibilityResult};

pub type FilterChangeFn = Arc<dyn Fn(Option<DateRange>) + Send + Sync>;

/// Filter state owned outside the core, shared with other observers.
pub trait FilterState: Send + Sync {
    fn get_current_range(&self) -> Option<DateRange>;

    fn set_custom_range(&self, start: NaiveDate, end: NaiveDate);

    fn clear_current_filter(&self);

    /// Replace the change callback. Invoked after every change, with the
    /// new range.
    fn set_on_filter_change(&self, callback: Option<FilterChangeFn>);
}

// ── In-memory filter state ──────────────────────────────────────────

/// Process-local [`FilterState`]. The callback runs on the caller's
/// thread after the state lock is released.
#[derive(Default)]
pub struct MemoryFilterState {
    range: Mutex<Option<DateRange>>,
    on_change: Mutex<Option<FilterChangeFn>>,
}

impl MemoryFilterState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn set(&self, range: Option<DateRange>) {
        *self.range.lock().unwrap_or_else(PoisonError::into_inner) = range;
        let callback = self
            .on_change
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(callback) = callback {
            callback(range);
        }
    }
}

impl FilterState for MemoryFilterState {
    fn get_current_range(&self) -> Option<DateRange> {
        *self.range.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_custom_range(&self, start: NaiveDate, end: NaiveDate) {
        self.set(Some(DateRange::new(start, end)));
    }

    fn clear_current_filter(&self) {
        self.set(None);
    }

    fn set_on_filter_change(&self, callback: Option<FilterChangeFn>) {
        *self.on_change.lock().unwrap_or_else(PoisonError::into_inner) = callback;
    }
}

impl fmt::Debug for MemoryFilterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryFilterState")
            .field("range", &self.get_current_range())
            .finish_non_exhaustive()
    }
}

// ── Status surface ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Short, non-technical message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Fire-and-forget notifications plus the "working" indicator.
pub trait StatusSink: Send + Sync {
    fn notify(&self, notice: Notice);

    fn set_working(&self, working: bool);

    /// Best-effort filter progress, 0–100.
    fn progress(&self, _percent: u8) {}
}

/// Receives filter results for the list.
pub trait VisibilitySink: Send + Sync {
    fn apply_visibility(&self, map: Arc<[VisibilityResult]>, statistics: FilterStatistics);

    /// Everything visible again.
    fn clear_visibility(&self);
}
