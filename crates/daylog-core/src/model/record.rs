// ── Record ──
//
// A single time-stamped item being browsed (a journal entry, a note).
// Records are produced by the ingestion side and never mutated here.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::date::parse_record_day;

/// A single time-stamped record.
///
/// `date` keeps the raw value the ingestion source produced; [`Record::day`]
/// parses it on demand. Unparsable dates are legal and simply never match
/// a date filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Stable identifier. Empty means "derive from date + title".
    #[serde(default)]
    pub id: String,
    pub date: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
    #[serde(default)]
    pub word_count: u32,
}

impl Record {
    pub fn new(date: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let word_count = count_words(&content);
        Self {
            id: String::new(),
            date: date.into(),
            title: title.into(),
            content,
            metrics: BTreeMap::new(),
            word_count,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }

    /// Calendar day of this record, if its date parses.
    pub fn day(&self) -> Option<NaiveDate> {
        parse_record_day(&self.date)
    }

    /// Identifier derived from date and title, used when no explicit id exists.
    pub fn derived_id(&self) -> String {
        format!("{}::{}", self.date.trim(), self.title.trim())
    }

    /// First `max_chars` characters of the content, with an ellipsis when cut.
    pub fn preview(&self, max_chars: usize) -> String {
        let mut chars = self.content.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{}…", head.trim_end())
        } else {
            head
        }
    }
}

/// Whitespace-delimited word count.
pub fn count_words(text: &str) -> u32 {
    u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX)
}
