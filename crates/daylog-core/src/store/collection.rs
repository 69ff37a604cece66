// ── Generic reactive keyed collection ──
//
// Concurrent storage with O(1) lookups and push-based change
// notification via `watch` channels.

use std::cmp::Ordering;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

type SortFn<T> = fn(&T, &T) -> Ordering;

/// A reactive collection for a single item type.
///
/// Uses `DashMap` for O(1) concurrent lookups and `watch` channels for
/// push-based change notification. Every mutation bumps a version counter
/// and rebuilds the ordered snapshot that subscribers receive.
pub(crate) struct Collection<T: Send + Sync + 'static> {
    by_key: DashMap<String, Arc<T>>,

    /// Version counter, bumped on every mutation.
    version: watch::Sender<u64>,

    /// Full ordered snapshot, rebuilt on mutation.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,

    order: SortFn<T>,
}

impl<T: Send + Sync + 'static> Collection<T> {
    pub(crate) fn new(order: SortFn<T>) -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_key: DashMap::new(),
            version,
            snapshot,
            order,
        }
    }

    /// Insert or update an item. Returns `true` if the key was new.
    pub(crate) fn upsert(&self, key: String, item: T) -> bool {
        let is_new = self.by_key.insert(key, Arc::new(item)).is_none();
        self.publish();
        is_new
    }

    /// Insert or update many items, publishing a single snapshot.
    pub(crate) fn upsert_many(&self, items: impl IntoIterator<Item = (String, T)>) -> usize {
        let mut inserted = 0;
        for (key, item) in items {
            if self.by_key.insert(key, Arc::new(item)).is_none() {
                inserted += 1;
            }
        }
        self.publish();
        inserted
    }

    /// Remove an item by key. Returns the removed item if it existed.
    pub(crate) fn remove(&self, key: &str) -> Option<Arc<T>> {
        let removed = self.by_key.remove(key).map(|(_, v)| v);
        if removed.is_some() {
            self.publish();
        }
        removed
    }

    /// Remove every key for which `keep` returns false, publishing once.
    pub(crate) fn retain(&self, mut keep: impl FnMut(&str) -> bool) -> usize {
        let before = self.by_key.len();
        self.by_key.retain(|k, _| keep(k));
        let removed = before - self.by_key.len();
        if removed > 0 {
            self.publish();
        }
        removed
    }

    pub(crate) fn get(&self, key: &str) -> Option<Arc<T>> {
        self.by_key.get(key).map(|r| Arc::clone(r.value()))
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn version(&self) -> u64 {
        *self.version.borrow()
    }

    pub(crate) fn clear(&self) {
        self.by_key.clear();
        self.publish();
    }

    pub(crate) fn len(&self) -> usize {
        self.by_key.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn publish(&self) {
        let mut values: Vec<Arc<T>> = self.by_key.iter().map(|r| Arc::clone(r.value())).collect();
        let order = self.order;
        values.sort_by(|a, b| order(a, b));
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
        self.version.send_modify(|v| *v += 1);
    }
}
