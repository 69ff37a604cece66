// ── Calendar date helpers ──
//
// Day keys, lenient record-date parsing, and the inclusive `DateRange`
// every filter operation is expressed in.

use std::fmt;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime};

use crate::error::CoreError;

/// Canonical day key format (`2025-01-31`).
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

const NAIVE_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Format a day as its key representation.
pub fn day_key(date: NaiveDate) -> String {
    date.format(DAY_KEY_FORMAT).to_string()
}

/// Parse a day key produced by [`day_key`].
pub fn parse_day_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key.trim(), DAY_KEY_FORMAT).ok()
}

/// Parse a raw record date into its calendar day.
///
/// Accepts bare day keys, RFC 3339 timestamps (the day is taken in the
/// timestamp's own offset) and naive `T`/space separated datetimes.
/// Anything else yields `None`; callers treat that as "no day".
pub fn parse_record_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Some(day) = parse_day_key(raw) {
        return Some(day);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}

/// Parse a day typed by the user (CLI flags, prompts).
pub fn parse_user_day(input: &str) -> Result<NaiveDate, CoreError> {
    parse_record_day(input).ok_or_else(|| CoreError::InvalidDate {
        input: input.trim().to_owned(),
    })
}

/// Short human form: `Jan 3, 2025`.
pub fn format_day(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Long human form used for accessible descriptions: `Friday, January 3, 2025`.
pub fn format_day_long(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

/// First day of the month containing `date`.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Number of days in the month containing `date`.
pub fn days_in_month(date: NaiveDate) -> u32 {
    let first = first_of_month(date);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .map_or(31, |last| last.day())
}

/// First day of the month `delta` months away from the month of `date`.
pub fn shift_month(date: NaiveDate, delta: i32) -> NaiveDate {
    let first = first_of_month(date);
    let months = Months::new(delta.unsigned_abs());
    let shifted = if delta >= 0 {
        first.checked_add_months(months)
    } else {
        first.checked_sub_months(months)
    };
    shifted.unwrap_or(first)
}

// ── DateRange ───────────────────────────────────────────────────────

/// Inclusive `[start, end]` pair of calendar days.
///
/// Construction normalizes reversed input, so `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start > end {
            Self {
                start: end,
                end: start,
            }
        } else {
            Self { start, end }
        }
    }

    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// The whole month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        let first = first_of_month(date);
        let last = first
            .checked_add_days(Days::new(u64::from(days_in_month(date)) - 1))
            .unwrap_or(first);
        Self::new(first, last)
    }

    /// The `n` days ending on `today` (inclusive). `n == 0` is treated as 1.
    pub fn last_n_days(today: NaiveDate, n: u32) -> Self {
        let back = u64::from(n.max(1) - 1);
        let start = today.checked_sub_days(Days::new(back)).unwrap_or(today);
        Self::new(start, today)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn is_single_day(&self) -> bool {
        self.start == self.end
    }

    /// Whether `day` falls in the range. The end day is included in full.
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Inclusive length in days.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_day() {
            f.write_str(&format_day(self.start))
        } else {
            write!(f, "{} – {}", format_day(self.start), format_day(self.end))
        }
    }
}
