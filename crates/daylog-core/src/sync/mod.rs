// ── Filter synchronization controller ──
//
// Binds calendar selections to the filtering pipeline and to the
// external filter state, and maps external filter changes back onto the
// calendar. Two single-slot guards keep the loop open:
//
//   syncing  : a selection push or a filter pull is being applied
//   filtering: a filter (or clear) request is in flight
//
// A request arriving while its slot is held is dropped, never queued.
// Every request bumps a generation counter; a result whose generation
// is no longer the latest is discarded instead of applied.
//
// Refreshes are the exception to dropping. They re-derive the list from
// the filter state (after an external change or a record change), so a
// refresh that meets a busy slot is parked and replayed by the holder
// once the slot is released.

mod collaborators;
mod guard;

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use chrono::NaiveDate;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

use crate::calendar::{ApplyFilter, SharedCalendar};
use crate::model::DateRange;
use crate::pipeline::{FilterOptions, FilterPipeline, FilterProgress, FilterStatistics};
use crate::store::RecordStore;

pub use collaborators::{
    FilterChangeFn, FilterState, MemoryFilterState, Notice, NoticeLevel, StatusSink,
    VisibilitySink,
};
pub use guard::{Slot, SlotGuard};

const RETRY_MESSAGE: &str = "Couldn't filter entries. Please try again.";
const RANGE_HINT: &str = "Range mode: pick the other end of the range.";

/// How a filter or clear request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterRun {
    Applied(FilterStatistics),
    Cleared,
    /// Another request was in flight; this one was dropped.
    Rejected,
    /// Completed after a newer request was issued; result discarded.
    Superseded,
    /// The pipeline failed; previous state kept.
    Failed,
}

/// The external objects the controller is wired to.
#[derive(Clone)]
pub struct Collaborators {
    pub filter_state: Arc<dyn FilterState>,
    pub visibility: Arc<dyn VisibilitySink>,
    pub status: Arc<dyn StatusSink>,
}

/// Whether an applied range is written back to the filter state.
/// `Skip` runs are refreshes that follow the filter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Push {
    FilterState,
    Skip,
}

struct Inner {
    store: Arc<RecordStore>,
    calendar: SharedCalendar,
    pipeline: FilterPipeline,
    filter_state: Arc<dyn FilterState>,
    visibility: Arc<dyn VisibilitySink>,
    status: Arc<dyn StatusSink>,
    syncing: Arc<Slot>,
    filtering: Arc<Slot>,
    generation: AtomicU64,
    hint_shown: AtomicBool,
    refresh_pending: AtomicBool,
    /// Range of the visibility map the list currently shows.
    applied: Mutex<Option<DateRange>>,
}

pub struct FilterSyncController {
    inner: Arc<Inner>,
}

impl FilterSyncController {
    /// Build the controller and install its hooks on the calendar and the
    /// filter state.
    pub fn new(
        store: Arc<RecordStore>,
        calendar: SharedCalendar,
        pipeline: FilterPipeline,
        collaborators: Collaborators,
    ) -> Self {
        let inner = Arc::new(Inner {
            store,
            calendar,
            pipeline,
            filter_state: collaborators.filter_state,
            visibility: collaborators.visibility,
            status: collaborators.status,
            syncing: Slot::new("syncing"),
            filtering: Slot::new("filtering"),
            generation: AtomicU64::new(0),
            hint_shown: AtomicBool::new(false),
            refresh_pending: AtomicBool::new(false),
            applied: Mutex::new(None),
        });

        inner
            .calendar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set_filter_hook(Arc::new(CalendarHook(Arc::downgrade(&inner))));

        let weak = Arc::downgrade(&inner);
        inner
            .filter_state
            .set_on_filter_change(Some(Arc::new(move |range: Option<DateRange>| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_external_change(range);
                }
            })));

        debug!(strategy = %inner.pipeline.strategy_kind(), "filter sync controller attached");
        Self { inner }
    }

    /// Filter the list to `[start, end]` and publish the range to the
    /// filter state.
    pub async fn apply_date_filter(&self, start: NaiveDate, end: NaiveDate) -> FilterRun {
        self.inner
            .run_filter(DateRange::new(start, end), Push::FilterState)
            .await
    }

    /// Drop the date filter everywhere.
    pub fn clear_date_filter(&self) -> FilterRun {
        self.inner.clear(Push::FilterState)
    }

    /// Re-run the active filter against the current records, e.g. after
    /// the store changed. Deferred while another filter is in flight.
    pub fn refresh(&self) {
        self.inner.request_refresh();
    }

    /// Range whose visibility map the list currently shows.
    pub fn applied_range(&self) -> Option<DateRange> {
        self.inner.applied_range()
    }

    pub fn is_filtering(&self) -> bool {
        self.inner.filtering.is_held()
    }

    pub fn is_syncing(&self) -> bool {
        self.inner.syncing.is_held()
    }

    pub fn calendar(&self) -> &SharedCalendar {
        &self.inner.calendar
    }

    pub fn filter_state(&self) -> &Arc<dyn FilterState> {
        &self.inner.filter_state
    }

    /// Detach from the filter state. The calendar hook stops acting once
    /// the controller is dropped.
    pub fn detach(&self) {
        self.inner.filter_state.set_on_filter_change(None);
    }
}

impl Drop for FilterSyncController {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for FilterSyncController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterSyncController")
            .field("filtering", &self.is_filtering())
            .field("syncing", &self.is_syncing())
            .field("generation", &self.inner.generation.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl Inner {
    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn is_latest(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) == generation
    }

    fn applied_range(&self) -> Option<DateRange> {
        *self.applied.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_applied(&self, range: Option<DateRange>) {
        *self.applied.lock().unwrap_or_else(PoisonError::into_inner) = range;
    }

    async fn run_filter(self: &Arc<Self>, range: DateRange, push: Push) -> FilterRun {
        let run = self.filter_once(range, push).await;
        self.after_release(run, push);
        run
    }

    fn clear(self: &Arc<Self>, push: Push) -> FilterRun {
        let run = self.clear_once(push);
        self.after_release(run, push);
        run
    }

    /// Runs once the `filtering` slot is free again.
    fn after_release(self: &Arc<Self>, run: FilterRun, push: Push) {
        if run == FilterRun::Rejected && push == Push::Skip {
            self.refresh_pending.store(true, Ordering::SeqCst);
        }
        self.drain_refresh();
    }

    fn request_refresh(self: &Arc<Self>) {
        self.refresh_pending.store(true, Ordering::SeqCst);
        self.drain_refresh();
    }

    /// Replay a parked refresh unless a filter still holds the slot; the
    /// holder drains again after releasing it.
    fn drain_refresh(self: &Arc<Self>) {
        if self.filtering.is_held() {
            if self.refresh_pending.load(Ordering::SeqCst) {
                debug!("filter in flight, refresh deferred");
            }
            return;
        }
        if !self.refresh_pending.swap(false, Ordering::SeqCst) {
            return;
        }

        match self.filter_state.get_current_range() {
            Some(range) => {
                let Ok(handle) = Handle::try_current() else {
                    warn!(%range, "no runtime, list not refreshed");
                    return;
                };
                let inner = Arc::clone(self);
                handle.spawn(async move {
                    inner.run_filter(range, Push::Skip).await;
                });
            }
            None if self.applied_range().is_some() => {
                self.clear(Push::Skip);
            }
            None => debug!("no filter active, nothing to refresh"),
        }
    }

    async fn filter_once(&self, range: DateRange, push: Push) -> FilterRun {
        let generation = self.next_generation();
        let Some(_filtering) = self.filtering.try_acquire() else {
            debug!(%range, generation, "filter already in progress, request dropped");
            return FilterRun::Rejected;
        };
        let _working = Working::show(self.status.as_ref());

        let records = self.store.snapshot();
        let total = records.len();
        let status = Arc::clone(&self.status);
        let options = FilterOptions {
            include_statistics: true,
            on_progress: Some(Arc::new(move |progress: FilterProgress| {
                status.progress(progress.percent());
            })),
        };

        let outcome = match self
            .pipeline
            .filter_by_date_range(records, range.start(), range.end(), options)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    error = %e,
                    operation = "apply_date_filter",
                    start = %range.start(),
                    end = %range.end(),
                    records = total,
                    "date filter abandoned"
                );
                self.status.notify(Notice::error(RETRY_MESSAGE));
                return FilterRun::Failed;
            }
        };

        if !self.is_latest(generation) {
            debug!(%range, generation, "newer request issued, discarding filter result");
            self.reconcile_calendar();
            return FilterRun::Superseded;
        }

        let statistics = outcome.statistics.unwrap_or_else(|| FilterStatistics {
            total_entries: outcome.visibility_map.len(),
            visible_entries: outcome.visibility_map.iter().filter(|v| v.visible).count(),
            unparsable_entries: 0,
        });
        self.visibility
            .apply_visibility(outcome.visibility_map.into(), statistics);
        self.set_applied(Some(range));

        if push == Push::FilterState {
            self.with_syncing("set_custom_range", || {
                self.filter_state.set_custom_range(range.start(), range.end());
            });
        }

        info!(
            %range,
            visible = statistics.visible_entries,
            total = statistics.total_entries,
            "date filter applied"
        );
        let message = format!(
            "Showing {}/{} entries · {range}",
            statistics.visible_entries, statistics.total_entries
        );
        self.status.notify(match statistics.unparsable_entries {
            0 => Notice::success(message),
            n => Notice::warning(format!("{message} · {n} without a readable date")),
        });
        FilterRun::Applied(statistics)
    }

    fn clear_once(&self, push: Push) -> FilterRun {
        let generation = self.next_generation();
        let Some(_filtering) = self.filtering.try_acquire() else {
            debug!(generation, "filter in progress, clear dropped");
            return FilterRun::Rejected;
        };

        self.visibility.clear_visibility();
        self.set_applied(None);
        if push == Push::FilterState {
            self.with_syncing("clear_current_filter", || {
                self.filter_state.clear_current_filter();
            });
        }

        info!("date filter cleared");
        self.status.notify(Notice::info("Date filter cleared"));
        FilterRun::Cleared
    }

    /// Run a write to the filter state while holding `syncing`, so its
    /// change notification is recognized as our own.
    fn with_syncing(&self, operation: &'static str, write: impl FnOnce()) {
        match self.syncing.try_acquire() {
            Some(_syncing) => write(),
            None => warn!(operation, "selection sync in progress, filter state not updated"),
        }
    }

    fn on_external_change(self: &Arc<Self>, range: Option<DateRange>) {
        let Some(syncing) = self.syncing.try_acquire() else {
            debug!(?range, "filter change already in sync, ignored");
            return;
        };
        self.show_on_calendar(range);
        drop(syncing);

        // Anything in flight was started for an older filter state.
        let generation = self.next_generation();
        debug!(?range, generation, "external filter change");
        self.request_refresh();
    }

    /// Mirror `range` on the calendar. Caller holds `syncing`, so the
    /// calendar's own filter request is treated as already synced.
    fn show_on_calendar(&self, range: Option<DateRange>) {
        let mut calendar = self.calendar.lock().unwrap_or_else(PoisonError::into_inner);
        match range {
            Some(range) => {
                calendar.navigate_to_month(range.start());
                if calendar.selection().range() != Some(range) {
                    calendar.select_range(range);
                }
            }
            None => {
                if !calendar.selection().is_none() {
                    calendar.clear_selection();
                }
            }
        }
    }

    /// Point the calendar back at the filter that is actually applied.
    fn reconcile_calendar(&self) {
        let Some(_syncing) = self.syncing.try_acquire() else {
            return;
        };
        self.show_on_calendar(self.filter_state.get_current_range());
    }

    fn range_started(&self, start: NaiveDate) {
        debug!(%start, "range started");
        if !self.hint_shown.swap(true, Ordering::AcqRel) {
            self.status.notify(Notice::info(RANGE_HINT));
        }
    }
}

/// Shows the working indicator until dropped.
struct Working<'a>(&'a dyn StatusSink);

impl<'a> Working<'a> {
    fn show(status: &'a dyn StatusSink) -> Self {
        status.set_working(true);
        Self(status)
    }
}

impl Drop for Working<'_> {
    fn drop(&mut self) {
        self.0.set_working(false);
    }
}

// ── Calendar hook ───────────────────────────────────────────────────

/// Installed as the calendar's filter hook. Holds the controller weakly
/// so the calendar never keeps it alive.
struct CalendarHook(Weak<Inner>);

impl ApplyFilter for CalendarHook {
    fn apply_filter(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        let Some(inner) = self.0.upgrade() else {
            return;
        };
        if inner.syncing.is_held() {
            debug!(?start, ?end, "selection already in sync, not pushed");
            return;
        }

        let range = match (start, end) {
            (Some(start), Some(end)) => DateRange::new(start, end),
            (Some(day), None) | (None, Some(day)) => DateRange::single(day),
            (None, None) => {
                inner.clear(Push::FilterState);
                return;
            }
        };

        let Ok(handle) = Handle::try_current() else {
            warn!(%range, "no runtime, date filter not applied");
            return;
        };
        handle.spawn(async move {
            inner.run_filter(range, Push::FilterState).await;
        });
    }

    fn range_started(&self, start: NaiveDate) {
        if let Some(inner) = self.0.upgrade() {
            inner.range_started(start);
        }
    }
}
