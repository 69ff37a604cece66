// ── Visibility computation ──
//
// The pure computation both strategies run. Keeping a single code path
// is what makes worker and inline output identical.

use serde::Serialize;

use super::{FilterJob, FilterProgress};

/// Visibility of one record under the current range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityResult {
    pub id: String,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterStatistics {
    pub total_entries: usize,
    pub visible_entries: usize,
    /// Records whose date could not be parsed (always hidden).
    pub unparsable_entries: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOutcome {
    pub visibility_map: Vec<VisibilityResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<FilterStatistics>,
}

pub(crate) fn compute_visibility(job: &FilterJob) -> FilterOutcome {
    let total = job.records.len();
    let progress = job
        .options
        .on_progress
        .as_ref()
        .filter(|_| total >= job.progress_threshold);

    let mut visibility_map = Vec::with_capacity(total);
    let mut visible_entries = 0;
    let mut unparsable_entries = 0;

    for (chunk, records) in job.records.chunks(job.chunk_size.max(1)).enumerate() {
        for record in records {
            let visible = match record.day() {
                Some(day) => job.range.contains(day),
                None => {
                    unparsable_entries += 1;
                    false
                }
            };
            if visible {
                visible_entries += 1;
            }
            visibility_map.push(VisibilityResult {
                id: record.id.clone(),
                visible,
            });
        }
        if let Some(report) = progress {
            report(FilterProgress {
                chunk,
                processed: visibility_map.len(),
                total,
            });
        }
    }

    let statistics = job.options.include_statistics.then_some(FilterStatistics {
        total_entries: total,
        visible_entries,
        unparsable_entries,
    });

    FilterOutcome {
        visibility_map,
        statistics,
    }
}
