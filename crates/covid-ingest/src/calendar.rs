//! Calendar dimension over the unified date range.

use chrono::NaiveDate;
use covid_core::record::{CalendarEntry, UnifiedRecord};

/// One entry per day in `[first, last]`, inclusive.
pub fn calendar_range(first: NaiveDate, last: NaiveDate) -> Vec<CalendarEntry> {
  first
    .iter_days()
    .take_while(|day| *day <= last)
    .map(CalendarEntry::from_date)
    .collect()
}

/// The calendar spanning the earliest to the latest date in `records`,
/// whether or not every day has data. Empty for an empty dataset.
pub fn calendar_for(records: &[UnifiedRecord]) -> Vec<CalendarEntry> {
  let (Some(first), Some(last)) = (
    records.iter().map(|r| r.date).min(),
    records.iter().map(|r| r.date).max(),
  ) else {
    return Vec::new();
  };
  let calendar = calendar_range(first, last);
  tracing::info!(%first, %last, days = calendar.len(), "built calendar");
  calendar
}
