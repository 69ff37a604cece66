// ── Month grid ──
//
// Six weeks of seven days covering the month that contains a date,
// padded with trailing days of the previous month and leading days of
// the next one.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, Days, NaiveDate};

use super::SelectionState;
use crate::config::WeekStart;
use crate::model::{Day, DaySummary, Record, first_of_month};

pub const GRID_WEEKS: usize = 6;
pub const GRID_CELLS: usize = GRID_WEEKS * 7;

/// Padding cells before the 1st of the month, counted from `week_start`.
pub fn leading_days(month: NaiveDate, week_start: WeekStart) -> u32 {
    let first = first_of_month(month).weekday().num_days_from_sunday();
    let start = week_start.weekday().num_days_from_sunday();
    (first + 7 - start) % 7
}

/// Date shown in the top-left cell.
pub fn grid_start(month: NaiveDate, week_start: WeekStart) -> NaiveDate {
    let first = first_of_month(month);
    first
        .checked_sub_days(Days::new(u64::from(leading_days(month, week_start))))
        .unwrap_or(first)
}

/// All 42 dates of the grid, in display order.
pub fn month_grid(month: NaiveDate, week_start: WeekStart) -> Vec<NaiveDate> {
    grid_start(month, week_start)
        .iter_days()
        .take(GRID_CELLS)
        .collect()
}

/// Records grouped by calendar day. Undated records are left out.
#[derive(Debug, Default)]
pub(crate) struct DayIndex {
    version: Option<u64>,
    by_day: HashMap<NaiveDate, Vec<Arc<Record>>>,
}

impl DayIndex {
    pub(crate) fn is_current(&self, version: u64) -> bool {
        self.version == Some(version)
    }

    pub(crate) fn rebuild(&mut self, version: u64, records: &[Arc<Record>]) {
        self.by_day.clear();
        for record in records {
            if let Some(day) = record.day() {
                self.by_day.entry(day).or_default().push(Arc::clone(record));
            }
        }
        self.version = Some(version);
    }

    pub(crate) fn records_on(&self, day: NaiveDate) -> &[Arc<Record>] {
        self.by_day.get(&day).map_or(&[], Vec::as_slice)
    }
}

pub(crate) struct GridContext<'a> {
    pub month: NaiveDate,
    pub today: NaiveDate,
    pub week_start: WeekStart,
    pub selection: &'a SelectionState,
    pub index: &'a DayIndex,
}

pub(crate) fn build_days(ctx: &GridContext<'_>) -> Vec<Day> {
    let month = first_of_month(ctx.month);
    month_grid(month, ctx.week_start)
        .into_iter()
        .map(|date| {
            let records = ctx.index.records_on(date).to_vec();
            Day {
                date,
                is_current_month: first_of_month(date) == month,
                is_today: date == ctx.today,
                is_selected: ctx.selection.contains(date),
                summary: DaySummary::from_count(records.len()),
                records,
            }
        })
        .collect()
}
