// ── Visibility feed ──
//
// Hand-off point between the sync controller (writer) and the list
// (reader). The last applied result stays in place until a newer one
// replaces it, so a failed or discarded filter leaves the list as it was.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use tracing::trace;

use crate::pipeline::{FilterStatistics, VisibilityResult};
use crate::sync::VisibilitySink;

/// One published visibility state.
#[derive(Debug, Default)]
pub struct AppliedVisibility {
    pub generation: u64,
    /// Ids hidden by the filter. Ids not listed are visible.
    pub hidden: HashSet<String>,
    /// `None` when no filter is applied.
    pub statistics: Option<FilterStatistics>,
}

impl AppliedVisibility {
    pub fn is_filtered(&self) -> bool {
        self.statistics.is_some()
    }
}

#[derive(Debug, Default)]
pub struct VisibilityFeed {
    current: ArcSwap<AppliedVisibility>,
    generation: AtomicU64,
}

impl VisibilityFeed {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn load(&self) -> Arc<AppliedVisibility> {
        self.current.load_full()
    }

    pub fn generation(&self) -> u64 {
        self.current.load().generation
    }

    fn publish(&self, hidden: HashSet<String>, statistics: Option<FilterStatistics>) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        trace!(generation, hidden = hidden.len(), "visibility published");
        self.current.store(Arc::new(AppliedVisibility {
            generation,
            hidden,
            statistics,
        }));
    }
}

impl VisibilitySink for VisibilityFeed {
    fn apply_visibility(&self, map: Arc<[VisibilityResult]>, statistics: FilterStatistics) {
        let hidden = map
            .iter()
            .filter(|v| !v.visible)
            .map(|v| v.id.clone())
            .collect();
        self.publish(hidden, Some(statistics));
    }

    fn clear_visibility(&self) {
        self.publish(HashSet::new(), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publishes_hidden_ids_with_new_generation() {
        let feed = VisibilityFeed::new();
        assert_eq!(feed.generation(), 0);
        assert!(!feed.load().is_filtered());

        let map: Arc<[VisibilityResult]> = vec![
            VisibilityResult {
                id: "a".into(),
                visible: true,
            },
            VisibilityResult {
                id: "b".into(),
                visible: false,
            },
        ]
        .into();
        feed.apply_visibility(map, FilterStatistics::default());

        let applied = feed.load();
        assert_eq!(applied.generation, 1);
        assert!(applied.hidden.contains("b"));
        assert!(!applied.hidden.contains("a"));

        feed.clear_visibility();
        assert_eq!(feed.generation(), 2);
        assert!(feed.load().hidden.is_empty());
    }
}
