// ── Virtualized record list ──
//
// Windowing model for the record list. Only `visible_rows` rows are
// mounted at any time; the rest exist only as scroll height. Scrolls and
// visibility changes are staged and applied on the next paint tick.

mod feed;

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::ListConfig;
use crate::model::{Record, format_day};

pub use feed::{AppliedVisibility, VisibilityFeed};

pub const EMPTY_STORE_MESSAGE: &str = "No entries yet.";
pub const EMPTY_FILTER_MESSAGE: &str = "No entries in the selected dates.";

/// A mounted row.
#[derive(Debug, Clone)]
pub struct RowView {
    /// Position in the full record list.
    pub index: usize,
    pub record: Arc<Record>,
    pub hidden: bool,
    pub expanded: bool,
}

impl RowView {
    pub fn id(&self) -> &str {
        &self.record.id
    }

    /// Formatted day, or the raw value when it does not parse.
    pub fn date_label(&self) -> String {
        self.record
            .day()
            .map_or_else(|| self.record.date.clone(), format_day)
    }

    /// Full content when expanded, the truncated preview otherwise.
    pub fn body(&self, preview_chars: usize) -> String {
        if self.expanded {
            self.record.content.clone()
        } else {
            self.record.preview(preview_chars)
        }
    }

    /// Whether the content is longer than its preview.
    pub fn is_truncated(&self, preview_chars: usize) -> bool {
        self.record.content.chars().nth(preview_chars).is_some()
    }
}

/// What a paint tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaintTick {
    pub rematerialized: bool,
    /// Mounted rows whose hidden flag flipped in the batched pass.
    pub visibility_updates: usize,
}

pub struct VirtualList {
    config: ListConfig,
    records: Arc<Vec<Arc<Record>>>,
    feed: Arc<VisibilityFeed>,
    visibility: Arc<AppliedVisibility>,
    scroll_offset: u64,
    start: usize,
    pending_start: Option<usize>,
    visibility_pending: bool,
    mounted: Vec<RowView>,
    expanded: HashSet<String>,
}

impl VirtualList {
    pub fn new(config: ListConfig, feed: Arc<VisibilityFeed>) -> Self {
        let visibility = feed.load();
        Self {
            config,
            records: Arc::new(Vec::new()),
            feed,
            visibility,
            scroll_offset: 0,
            start: 0,
            pending_start: None,
            visibility_pending: false,
            mounted: Vec::new(),
            expanded: HashSet::new(),
        }
    }

    // ── Render cycle ─────────────────────────────────────────────────

    /// Replace the record set, reset scrolling and mount the first window.
    pub fn full_render(&mut self, records: Arc<Vec<Arc<Record>>>) {
        self.records = records;
        self.visibility = self.feed.load();
        self.scroll_offset = 0;
        self.pending_start = None;
        self.visibility_pending = false;
        self.mount(0);
        debug!(
            total = self.records.len(),
            mounted = self.mounted.len(),
            "list rendered"
        );
    }

    /// Record a scroll position. Returns `true` when a re-materialization
    /// was scheduled for the next paint tick.
    pub fn on_scroll(&mut self, offset: u64) -> bool {
        let offset = offset.min(self.max_scroll_offset());
        self.scroll_offset = offset;
        let row_height = u64::from(self.config.row_height.max(1));
        let new_start = usize::try_from(offset / row_height).unwrap_or(usize::MAX);

        let scheduled = self.pending_start.unwrap_or(self.start);
        if new_start == scheduled {
            trace!(new_start, "scroll coalesced");
            return false;
        }
        if new_start == self.start {
            self.pending_start = None;
            return false;
        }
        self.pending_start = Some(new_start);
        true
    }

    /// Apply staged work: at most one re-materialization, then at most
    /// one batched visibility pass over the mounted rows.
    pub fn on_paint_tick(&mut self) -> PaintTick {
        let mut tick = PaintTick::default();

        let latest = self.feed.load();
        if latest.generation != self.visibility.generation {
            self.visibility = latest;
            self.visibility_pending = true;
        }

        if let Some(start) = self.pending_start.take() {
            self.mount(start);
            self.visibility_pending = false;
            tick.rematerialized = true;
        }

        if self.visibility_pending {
            self.visibility_pending = false;
            for row in &mut self.mounted {
                let hidden = self.visibility.hidden.contains(&row.record.id);
                if row.hidden != hidden {
                    row.hidden = hidden;
                    tick.visibility_updates += 1;
                }
            }
            trace!(updates = tick.visibility_updates, "visibility batch applied");
        }

        tick
    }

    fn mount(&mut self, start: usize) {
        let total = self.records.len();
        let start = start.min(total);
        let end = start.saturating_add(self.config.visible_rows).min(total);
        self.start = start;
        self.mounted = self
            .records
            .get(start..end)
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(offset, record)| RowView {
                index: start + offset,
                record: Arc::clone(record),
                hidden: self.visibility.hidden.contains(&record.id),
                expanded: self.expanded.contains(&record.id),
            })
            .collect();
    }

    // ── Geometry ─────────────────────────────────────────────────────

    pub fn total_records(&self) -> usize {
        self.records.len()
    }

    /// Scrollable height: every record, hidden or not, takes one row.
    pub fn total_height(&self) -> u64 {
        let rows = u64::try_from(self.records.len()).unwrap_or(u64::MAX);
        rows.saturating_mul(u64::from(self.config.row_height))
    }

    fn max_scroll_offset(&self) -> u64 {
        self.total_height()
            .saturating_sub(u64::from(self.config.row_height))
    }

    pub fn scroll_offset(&self) -> u64 {
        self.scroll_offset
    }

    /// Index of the first mounted row.
    pub fn start_index(&self) -> usize {
        self.start
    }

    pub fn has_pending_work(&self) -> bool {
        self.pending_start.is_some()
            || self.visibility_pending
            || self.feed.generation() != self.visibility.generation
    }

    pub fn config(&self) -> &ListConfig {
        &self.config
    }

    /// Scroll so that `index` is the first mounted row.
    pub fn scroll_to_index(&mut self, index: usize) -> bool {
        let index = u64::try_from(index).unwrap_or(u64::MAX);
        self.on_scroll(index.saturating_mul(u64::from(self.config.row_height)))
    }

    // ── Rows ─────────────────────────────────────────────────────────

    pub fn mounted(&self) -> &[RowView] {
        &self.mounted
    }

    pub fn record(&self, index: usize) -> Option<&Arc<Record>> {
        self.records.get(index)
    }

    pub fn is_hidden(&self, index: usize) -> bool {
        self.records
            .get(index)
            .is_some_and(|r| self.visibility.hidden.contains(&r.id))
    }

    pub fn visible_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| !self.visibility.hidden.contains(&r.id))
            .count()
    }

    /// Message to show instead of rows, when nothing is visible.
    pub fn empty_message(&self) -> Option<&'static str> {
        if self.records.is_empty() {
            Some(EMPTY_STORE_MESSAGE)
        } else if self.visible_count() == 0 {
            Some(EMPTY_FILTER_MESSAGE)
        } else {
            None
        }
    }

    /// Applied visibility the mounted rows reflect.
    pub fn applied(&self) -> &AppliedVisibility {
        &self.visibility
    }

    /// First visible row strictly after `index`.
    pub fn next_visible_from(&self, index: usize) -> Option<usize> {
        (index.saturating_add(1)..self.records.len()).find(|&i| !self.is_hidden(i))
    }

    /// Last visible row strictly before `index`.
    pub fn prev_visible_from(&self, index: usize) -> Option<usize> {
        (0..index.min(self.records.len()))
            .rev()
            .find(|&i| !self.is_hidden(i))
    }

    // ── Expand state ─────────────────────────────────────────────────

    /// Flip a row between preview and full content. Returns the new state.
    pub fn toggle_expanded(&mut self, id: &str) -> bool {
        let expanded = if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.to_owned());
            true
        };
        for row in self.mounted.iter_mut().filter(|row| row.record.id == id) {
            row.expanded = expanded;
        }
        expanded
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }
}

impl std::fmt::Debug for VirtualList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualList")
            .field("total", &self.records.len())
            .field("start", &self.start)
            .field("mounted", &self.mounted.len())
            .field("pending_start", &self.pending_start)
            .finish_non_exhaustive()
    }
}
