// ── Record store ──
//
// Single source of truth for records. Readers take cheap snapshots;
// the ingestion side writes through `replace_all`/`upsert`.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::collection::Collection;
use crate::model::Record;
use crate::stream::RecordStream;

/// Snapshot order: dated records by day, then undated ones, ties by id.
fn record_order(a: &Record, b: &Record) -> Ordering {
    match (a.day(), b.day()) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.id.cmp(&b.id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.id.cmp(&b.id),
    }
}

/// In-memory, reactive record collection.
///
/// Mutations are broadcast to subscribers via `watch` channels. The core
/// never writes records itself; only the ingestion side does.
pub struct RecordStore {
    pub(crate) records: Collection<Record>,
    pub(crate) last_ingest: watch::Sender<Option<DateTime<Utc>>>,
}

impl RecordStore {
    pub fn new() -> Self {
        let (last_ingest, _) = watch::channel(None);
        Self {
            records: Collection::new(record_order),
            last_ingest,
        }
    }

    /// Build a store pre-populated with `records`.
    pub fn with_records(records: Vec<Record>) -> Self {
        let store = Self::new();
        store.replace_all(records);
        store
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Ordered snapshot of every record (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<Vec<Arc<Record>>> {
        self.records.snapshot()
    }

    pub fn get(&self, id: &str) -> Option<Arc<Record>> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Monotonic counter bumped by every mutation.
    pub fn version(&self) -> u64 {
        self.records.version()
    }

    pub fn last_ingest(&self) -> Option<DateTime<Utc>> {
        *self.last_ingest.borrow()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe(&self) -> RecordStream {
        RecordStream::new(self.records.subscribe())
    }

    // ── Writes (ingestion side only) ─────────────────────────────────

    /// Insert or replace a single record. Records without an id get the
    /// derived `date::title` id. Returns the id used.
    pub fn upsert(&self, mut record: Record) -> String {
        if record.id.trim().is_empty() {
            record.id = record.derived_id();
        }
        let id = record.id.clone();
        self.records.upsert(id.clone(), record);
        id
    }

    pub fn remove(&self, id: &str) -> Option<Arc<Record>> {
        self.records.remove(id)
    }

    pub fn clear(&self) {
        self.records.clear();
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}
