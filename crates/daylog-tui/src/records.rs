//! Record sources: a JSON file on disk, or generated demo data.

use std::path::Path;

use chrono::{Days, NaiveDate};
use color_eyre::eyre::{Result, WrapErr};
use tracing::info;

use daylog_core::{Record, model::day_key};

/// Load a JSON array of records.
pub fn load_records_file(path: &Path) -> Result<Vec<Record>> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read records file {}", path.display()))?;
    let records: Vec<Record> = serde_json::from_str(&text)
        .wrap_err_with(|| format!("{} is not a JSON array of records", path.display()))?;
    info!(path = %path.display(), count = records.len(), "records file loaded");
    Ok(records)
}

const TITLES: [&str; 6] = [
    "Morning pages",
    "Run",
    "Reading notes",
    "Standup",
    "Garden",
    "Evening review",
];

const BODIES: [&str; 4] = [
    "Short one today.",
    "Slept well, clear head. Spent most of the morning on the migration and the rest reading.",
    "Rain all day. Stayed in, cooked, and finally sorted the photo backlog from last summer's trip.",
    "Nothing much to report.",
];

/// `count` synthetic records spread over the 120 days ending on `today`.
/// Deterministic, so a given count always produces the same data.
pub fn demo_records(count: usize, today: NaiveDate) -> Vec<Record> {
    (0..count)
        .map(|i| {
            let back = u64::try_from((i * 37 + i / 3) % 120).unwrap_or(0);
            let day = today.checked_sub_days(Days::new(back)).unwrap_or(today);
            let title = TITLES[i % TITLES.len()];
            let body = BODIES[(i / TITLES.len()) % BODIES.len()];
            Record::new(day_key(day), title, body)
                .with_id(format!("demo-{i}"))
                .with_metric("mood", f64::from(u8::try_from(i % 5).unwrap_or(0) + 1))
        })
        .collect()
}
