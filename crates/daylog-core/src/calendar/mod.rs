// ── Calendar selection state machine ──
//
// Owns the visible month, the keyboard cursor and the current
// selection. Every selection change is reported through the
// `ApplyFilter` hook, which the sync controller installs at startup.

mod grid;
mod selection;

use std::sync::{Arc, Mutex};

use chrono::{Days, NaiveDate};
use tracing::debug;

use crate::config::CalendarConfig;
use crate::model::{DateRange, Day, first_of_month, shift_month};
use crate::store::RecordStore;

use grid::{DayIndex, GridContext, build_days};

pub use grid::{GRID_CELLS, GRID_WEEKS, grid_start, leading_days, month_grid};
pub use selection::SelectionState;

/// Calendar shared between the UI and the sync controller.
pub type SharedCalendar = Arc<Mutex<Calendar>>;

/// Receives the calendar's filter requests.
///
/// `(None, None)` means "clear the filter". The hook runs while the
/// calendar is borrowed mutably, so implementations must not call back
/// into the same calendar synchronously.
pub trait ApplyFilter: Send + Sync {
    fn apply_filter(&self, start: Option<NaiveDate>, end: Option<NaiveDate>);

    /// First endpoint of a range was picked.
    fn range_started(&self, _start: NaiveDate) {}
}

/// Hook in place until a controller is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFilter;

impl ApplyFilter for NoopFilter {
    fn apply_filter(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        debug!(?start, ?end, "no filter hook installed");
    }
}

pub struct Calendar {
    store: Arc<RecordStore>,
    config: CalendarConfig,
    month: NaiveDate,
    cursor: NaiveDate,
    today: NaiveDate,
    selection: SelectionState,
    /// Selection to restore when a range is abandoned half-way.
    before_range: SelectionState,
    range_mode: bool,
    hook: Arc<dyn ApplyFilter>,
    index: DayIndex,
}

impl Calendar {
    pub fn new(store: Arc<RecordStore>, config: CalendarConfig, today: NaiveDate) -> Self {
        Self {
            store,
            config,
            month: first_of_month(today),
            cursor: today,
            today,
            selection: SelectionState::None,
            before_range: SelectionState::None,
            range_mode: false,
            hook: Arc::new(NoopFilter),
            index: DayIndex::default(),
        }
    }

    pub fn into_shared(self) -> SharedCalendar {
        Arc::new(Mutex::new(self))
    }

    /// Replace the filter hook.
    pub fn set_filter_hook(&mut self, hook: Arc<dyn ApplyFilter>) {
        self.hook = hook;
    }

    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// First day of the visible month.
    pub fn month(&self) -> NaiveDate {
        self.month
    }

    pub fn cursor(&self) -> NaiveDate {
        self.cursor
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn selection(&self) -> SelectionState {
        self.selection
    }

    pub fn range_mode(&self) -> bool {
        self.range_mode
    }

    pub fn config(&self) -> &CalendarConfig {
        &self.config
    }

    /// The 42 day cells of the visible month, derived from the current
    /// store contents and selection.
    pub fn days(&mut self) -> Vec<Day> {
        let version = self.store.version();
        if !self.index.is_current(version) {
            self.index.rebuild(version, &self.store.snapshot());
        }
        build_days(&GridContext {
            month: self.month,
            today: self.today,
            week_start: self.config.week_start,
            selection: &self.selection,
            index: &self.index,
        })
    }

    /// Day cell under the keyboard cursor.
    pub fn focused_day(&mut self) -> Option<Day> {
        let cursor = self.cursor;
        self.days().into_iter().find(|day| day.date == cursor)
    }

    /// Date shown in grid cell `index` (row-major), if in bounds.
    pub fn date_at(&self, index: usize) -> Option<NaiveDate> {
        if index >= GRID_CELLS {
            return None;
        }
        grid_start(self.month, self.config.week_start)
            .checked_add_days(Days::new(u64::try_from(index).ok()?))
    }

    // ── Navigation ───────────────────────────────────────────────────

    /// Show the month containing `date`. Returns `false` if it is
    /// already the visible month.
    pub fn navigate_to_month(&mut self, date: NaiveDate) -> bool {
        let month = first_of_month(date);
        if month == self.month {
            return false;
        }
        self.month = month;
        if first_of_month(self.cursor) != month {
            self.cursor = if first_of_month(self.today) == month {
                self.today
            } else {
                month
            };
        }
        debug!(month = %month.format("%Y-%m"), "calendar navigated");
        true
    }

    pub fn previous_month(&mut self) -> bool {
        self.navigate_to_month(shift_month(self.month, -1))
    }

    pub fn next_month(&mut self) -> bool {
        self.navigate_to_month(shift_month(self.month, 1))
    }

    /// Show the current month with the cursor on today.
    pub fn go_to_today(&mut self) {
        self.navigate_to_month(self.today);
        self.cursor = self.today;
    }

    /// Move the cursor by `days`, following it into adjacent months.
    pub fn move_cursor(&mut self, days: i64) {
        let step = Days::new(days.unsigned_abs());
        let moved = if days >= 0 {
            self.cursor.checked_add_days(step)
        } else {
            self.cursor.checked_sub_days(step)
        };
        if let Some(date) = moved {
            self.cursor = date;
            self.navigate_to_month(date);
        }
    }

    // ── Selection ────────────────────────────────────────────────────

    /// Click on a day. Repeating a click on the selected day clears the
    /// selection. In range mode the click is a range endpoint instead.
    pub fn select_day(&mut self, date: NaiveDate) {
        self.cursor = date;
        self.navigate_to_month(date);

        if self.range_mode {
            self.range_click(date);
            return;
        }

        if self.selection == SelectionState::SingleDay(date) {
            self.selection = SelectionState::None;
            self.request_filter(None, None);
        } else {
            self.selection = SelectionState::SingleDay(date);
            self.request_filter(Some(date), Some(date));
        }
    }

    /// Primary activation of the cell under the cursor.
    pub fn activate_cursor(&mut self) {
        self.select_day(self.cursor);
    }

    /// Select `range` directly, without toggle semantics. Single-day
    /// ranges become `SingleDay`.
    pub fn select_range(&mut self, range: DateRange) {
        self.range_mode = false;
        self.selection = SelectionState::from_range(range);
        self.cursor = range.start();
        self.request_filter(Some(range.start()), Some(range.end()));
    }

    pub fn clear_selection(&mut self) {
        self.range_mode = false;
        self.selection = SelectionState::None;
        self.request_filter(None, None);
    }

    /// Turn range mode on or off. Leaving it half-way restores the
    /// selection that was active before the first endpoint.
    pub fn set_range_mode(&mut self, enabled: bool) {
        if self.range_mode == enabled {
            return;
        }
        self.range_mode = enabled;
        if !enabled && matches!(self.selection, SelectionState::RangeInProgress(_)) {
            self.selection = self.before_range;
        }
        debug!(enabled, "range mode");
    }

    pub fn toggle_range_mode(&mut self) -> bool {
        self.set_range_mode(!self.range_mode);
        self.range_mode
    }

    fn range_click(&mut self, date: NaiveDate) {
        if let SelectionState::RangeInProgress(start) = self.selection {
            let range = DateRange::new(start, date);
            self.selection = SelectionState::Range(range);
            self.range_mode = false;
            self.request_filter(Some(range.start()), Some(range.end()));
        } else {
            self.before_range = self.selection;
            self.selection = SelectionState::RangeInProgress(date);
            let hook = Arc::clone(&self.hook);
            hook.range_started(date);
        }
    }

    fn request_filter(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        let hook = Arc::clone(&self.hook);
        hook.apply_filter(start, end);
    }
}

impl std::fmt::Debug for Calendar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Calendar")
            .field("month", &self.month)
            .field("cursor", &self.cursor)
            .field("selection", &self.selection)
            .field("range_mode", &self.range_mode)
            .finish_non_exhaustive()
    }
}

/// Weekday labels in grid column order.
pub fn weekday_labels(config: &CalendarConfig) -> [&'static str; 7] {
    const SUNDAY_FIRST: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];
    let offset = usize::try_from(config.week_start.weekday().num_days_from_sunday()).unwrap_or(0);
    std::array::from_fn(|i| SUNDAY_FIRST[(i + offset) % 7])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::WeekStart;
    use crate::model::{ActivityLevel, Record};

    type Call = (Option<NaiveDate>, Option<NaiveDate>);

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<Call>>,
        started: Mutex<Vec<NaiveDate>>,
    }

    impl ApplyFilter for Recorder {
        fn apply_filter(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) {
            self.calls.lock().unwrap().push((start, end));
        }

        fn range_started(&self, start: NaiveDate) {
            self.started.lock().unwrap().push(start);
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn calendar() -> (Calendar, Arc<Recorder>) {
        let store = Arc::new(RecordStore::with_records(vec![
            Record::new("2025-01-03", "a", ""),
            Record::new("2025-01-03", "b", ""),
            Record::new("2025-01-03", "c", ""),
            Record::new("2025-01-10", "d", ""),
        ]));
        let mut cal = Calendar::new(store, CalendarConfig::default(), d(2025, 1, 15));
        let recorder = Arc::new(Recorder::default());
        cal.set_filter_hook(recorder.clone());
        (cal, recorder)
    }

    #[test]
    fn same_day_twice_toggles_back_to_none() {
        let (mut cal, rec) = calendar();
        cal.select_day(d(2025, 1, 3));
        assert_eq!(cal.selection(), SelectionState::SingleDay(d(2025, 1, 3)));
        cal.select_day(d(2025, 1, 3));
        assert_eq!(cal.selection(), SelectionState::None);
        assert_eq!(
            *rec.calls.lock().unwrap(),
            vec![(Some(d(2025, 1, 3)), Some(d(2025, 1, 3))), (None, None)]
        );
    }

    #[test]
    fn different_day_replaces_selection() {
        let (mut cal, rec) = calendar();
        cal.select_day(d(2025, 1, 3));
        cal.select_day(d(2025, 1, 4));
        assert_eq!(cal.selection(), SelectionState::SingleDay(d(2025, 1, 4)));
        assert_eq!(rec.calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn range_clicks_are_order_corrected_and_end_range_mode() {
        let (mut cal, rec) = calendar();
        cal.set_range_mode(true);
        cal.select_day(d(2025, 1, 10));
        assert_eq!(cal.selection(), SelectionState::RangeInProgress(d(2025, 1, 10)));
        assert_eq!(*rec.started.lock().unwrap(), vec![d(2025, 1, 10)]);
        assert!(rec.calls.lock().unwrap().is_empty());

        cal.select_day(d(2025, 1, 3));
        let expected = DateRange::new(d(2025, 1, 3), d(2025, 1, 10));
        assert_eq!(cal.selection(), SelectionState::Range(expected));
        assert_eq!(expected.start(), d(2025, 1, 3));
        assert_eq!(expected.end(), d(2025, 1, 10));
        assert!(!cal.range_mode());
        assert_eq!(
            *rec.calls.lock().unwrap(),
            vec![(Some(d(2025, 1, 3)), Some(d(2025, 1, 10)))]
        );
    }

    #[test]
    fn same_day_range_is_one_day_long() {
        let (mut cal, rec) = calendar();
        cal.toggle_range_mode();
        cal.select_day(d(2025, 1, 7));
        cal.select_day(d(2025, 1, 7));
        assert_eq!(
            cal.selection(),
            SelectionState::Range(DateRange::single(d(2025, 1, 7)))
        );
        assert_eq!(
            *rec.calls.lock().unwrap(),
            vec![(Some(d(2025, 1, 7)), Some(d(2025, 1, 7)))]
        );
    }

    #[test]
    fn leaving_range_mode_half_way_restores_previous_selection() {
        let (mut cal, _rec) = calendar();
        cal.select_day(d(2025, 1, 3));
        cal.set_range_mode(true);
        cal.select_day(d(2025, 1, 8));
        cal.set_range_mode(false);
        assert_eq!(cal.selection(), SelectionState::SingleDay(d(2025, 1, 3)));
    }

    #[test]
    fn clear_selection_requests_clear() {
        let (mut cal, rec) = calendar();
        cal.select_range(DateRange::new(d(2025, 1, 1), d(2025, 1, 31)));
        cal.clear_selection();
        assert!(cal.selection().is_none());
        assert_eq!(rec.calls.lock().unwrap().last().copied(), Some((None, None)));
    }

    #[test]
    fn stored_selection_is_independent_of_caller_date() {
        let (mut cal, _rec) = calendar();
        let mut picked = d(2025, 1, 3);
        cal.select_day(picked);
        picked = picked.succ_opt().unwrap();
        assert_eq!(picked, d(2025, 1, 4));
        assert_eq!(cal.selection(), SelectionState::SingleDay(d(2025, 1, 3)));
    }

    #[test]
    fn navigate_is_noop_within_same_month() {
        let (mut cal, _rec) = calendar();
        assert!(!cal.navigate_to_month(d(2025, 1, 28)));
        assert!(cal.navigate_to_month(d(2025, 2, 1)));
        assert_eq!(cal.month(), d(2025, 2, 1));
        assert_eq!(cal.cursor(), d(2025, 2, 1));
        assert!(cal.previous_month());
        assert_eq!(cal.cursor(), d(2025, 1, 15));
    }

    #[test]
    fn days_reflect_records_selection_and_today() {
        let (mut cal, _rec) = calendar();
        cal.select_day(d(2025, 1, 3));
        let days = cal.days();
        assert_eq!(days.len(), GRID_CELLS);

        let jan3 = days.iter().find(|day| day.date == d(2025, 1, 3)).unwrap();
        assert!(jan3.is_selected);
        assert!(jan3.is_current_month);
        assert_eq!(jan3.summary.level, ActivityLevel::High);
        assert_eq!(jan3.marker_count(cal.config().max_markers), 3);

        let today = days.iter().find(|day| day.is_today).unwrap();
        assert_eq!(today.date, d(2025, 1, 15));

        assert!(!days[0].is_current_month);
    }

    #[test]
    fn days_follow_store_changes() {
        let store = Arc::new(RecordStore::new());
        let mut cal = Calendar::new(Arc::clone(&store), CalendarConfig::default(), d(2025, 1, 15));
        assert!(cal.days().iter().all(|day| day.summary.count == 0));
        store.upsert(Record::new("2025-01-20", "late", ""));
        let day = cal.days().into_iter().find(|day| day.date == d(2025, 1, 20)).unwrap();
        assert_eq!(day.summary.count, 1);
    }

    #[test]
    fn cursor_moves_across_month_boundaries() {
        let (mut cal, rec) = calendar();
        cal.move_cursor(17);
        assert_eq!(cal.cursor(), d(2025, 2, 1));
        assert_eq!(cal.month(), d(2025, 2, 1));
        cal.move_cursor(-1);
        assert_eq!(cal.month(), d(2025, 1, 1));
        cal.activate_cursor();
        assert_eq!(cal.selection(), SelectionState::SingleDay(d(2025, 1, 31)));
        assert_eq!(rec.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn date_at_maps_grid_cells() {
        let (cal, _rec) = calendar();
        assert_eq!(cal.date_at(0), Some(d(2024, 12, 29)));
        assert_eq!(cal.date_at(GRID_CELLS - 1), Some(d(2025, 2, 8)));
        assert_eq!(cal.date_at(GRID_CELLS), None);
    }

    #[test]
    fn focused_day_describes_itself() {
        let (mut cal, _rec) = calendar();
        cal.go_to_today();
        let day = cal.focused_day().unwrap();
        insta::assert_snapshot!(day.accessible_description(), @"Wednesday, January 15, 2025, today, no entries");
    }

    #[test]
    fn labels_follow_week_start() {
        let monday = CalendarConfig {
            week_start: WeekStart::Monday,
            ..CalendarConfig::default()
        };
        assert_eq!(weekday_labels(&monday)[0], "Mo");
        assert_eq!(weekday_labels(&monday)[6], "Su");
        assert_eq!(weekday_labels(&CalendarConfig::default())[0], "Su");
    }
}
