//! Calendar-driven record browsing for `daylog`, independent of any
//! rendering surface.
//!
//! - **[`RecordStore`]**: Reactive record storage (`DashMap` + `watch`
//!   channels). The ingestion side writes through
//!   [`replace_all`](RecordStore::replace_all); readers take `Arc` snapshots
//!   or subscribe through a [`RecordStream`].
//!
//! - **[`Calendar`]**: Month grid and selection state machine
//!   (`None` / `SingleDay` / `RangeInProgress` / `Range`). Selection changes
//!   are reported through the [`ApplyFilter`] hook.
//!
//! - **[`FilterPipeline`]**: Date-range visibility computation, run on a
//!   blocking worker with an inline fallback that produces identical output.
//!
//! - **[`FilterSyncController`]**: Connects the calendar, the pipeline, the
//!   list, and an external [`FilterState`] without feedback loops.
//!
//! - **[`VirtualList`]**: Windowed list model: a fixed number of mounted
//!   rows, paint-tick batching of scroll and visibility changes.
//!
//! - **[`ErrorBoundary`]**: Per-section containment of render failures.

pub mod boundary;
pub mod calendar;
pub mod config;
pub mod error;
pub mod list;
pub mod model;
pub mod pipeline;
pub mod store;
pub mod stream;
pub mod sync;

// ── Primary re-exports ──────────────────────────────────────────────
pub use boundary::{BoundaryState, ErrorBoundary, node_or_placeholder};
pub use calendar::{ApplyFilter, Calendar, SelectionState, SharedCalendar};
pub use config::{CalendarConfig, ListConfig, PipelineConfig, WeekStart};
pub use error::CoreError;
pub use list::{RowView, VirtualList, VisibilityFeed};
pub use pipeline::{
    FilterOptions, FilterOutcome, FilterPipeline, FilterProgress, FilterStatistics,
    VisibilityResult,
};
pub use store::RecordStore;
pub use stream::RecordStream;
pub use sync::{
    Collaborators, FilterRun, FilterState, FilterSyncController, MemoryFilterState, Notice,
    NoticeLevel, StatusSink, VisibilitySink,
};

pub use model::{ActivityLevel, DateRange, Day, DaySummary, Record};
