// ── Domain model ──
//
// Records, calendar days, and the date helpers both are built on.

pub mod date;
pub mod day;
pub mod record;

pub use date::{
    DAY_KEY_FORMAT, DateRange, day_key, days_in_month, first_of_month, format_day,
    format_day_long, parse_day_key, parse_record_day, parse_user_day, shift_month,
};
pub use day::{ActivityLevel, Day, DaySummary};
pub use record::{Record, count_words};
