// ── Core configuration ──
//
// Typed knobs for each component. The `daylog-config` crate fills
// these from TOML/env; tests construct them directly.

use std::time::Duration;

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// First column of the month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    pub fn weekday(self) -> Weekday {
        match self {
            Self::Sunday => Weekday::Sun,
            Self::Monday => Weekday::Mon,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarConfig {
    pub week_start: WeekStart,
    /// Cap on record marks drawn in one cell.
    pub max_markers: usize,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            week_start: WeekStart::Sunday,
            max_markers: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListConfig {
    /// ROW_HEIGHT: fixed height of one row, in scroll units.
    pub row_height: u32,
    /// VISIBLE_ROWS: rows materialized at once.
    pub visible_rows: usize,
    /// Content preview length before the ellipsis.
    pub preview_chars: usize,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            row_height: 1,
            visible_rows: 12,
            preview_chars: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Offload filtering to a blocking worker thread when a runtime exists.
    pub use_worker: bool,
    /// Deadline for the worker before falling back to inline computation.
    pub worker_timeout: Duration,
    /// Records per progress notification.
    pub chunk_size: usize,
    /// Inputs smaller than this never report progress.
    pub progress_threshold: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            use_worker: true,
            worker_timeout: Duration::from_secs(5),
            chunk_size: 1_000,
            progress_threshold: 5_000,
        }
    }
}
