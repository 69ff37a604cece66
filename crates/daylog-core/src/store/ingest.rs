// ── Bulk ingestion ──
//
// Applies a full record batch from the ingestion side. Ids are assigned
// before the batch lands so they stay unique and stable across re-renders.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tracing::debug;

use super::RecordStore;
use crate::model::Record;

/// Give every record a unique id: explicit ids win, otherwise the derived
/// `date::title` id. Collisions inside one batch get a `#n` suffix.
pub(crate) fn assign_ids(records: Vec<Record>) -> Vec<(String, Record)> {
    let mut seen: HashMap<String, u32> = HashMap::with_capacity(records.len());
    records
        .into_iter()
        .map(|mut record| {
            let base = if record.id.trim().is_empty() {
                record.derived_id()
            } else {
                record.id.trim().to_owned()
            };
            let n = seen.entry(base.clone()).or_insert(0);
            *n += 1;
            let id = if *n == 1 {
                base
            } else {
                format!("{base}#{n}")
            };
            record.id.clone_from(&id);
            (id, record)
        })
        .collect()
}

impl RecordStore {
    /// Replace the store contents with `records`.
    ///
    /// Uses upsert-then-prune: incoming records are upserted first, then
    /// ids absent from the batch are removed. This avoids the brief empty
    /// state a clear-then-insert approach would broadcast.
    pub fn replace_all(&self, records: Vec<Record>) {
        let items = assign_ids(records);
        let incoming: HashSet<String> = items.iter().map(|(id, _)| id.clone()).collect();
        let total = items.len();

        let inserted = self.records.upsert_many(items);
        let pruned = self.records.retain(|id| incoming.contains(id));
        self.last_ingest.send_modify(|t| *t = Some(Utc::now()));

        debug!(total, inserted, pruned, "record batch applied");
    }
}
