//! Persisted rows and raw query shapes.
//!
//! [`UnifiedRecord`] and [`CalendarEntry`] are written once per pipeline run
//! and fully replace the previous tables. [`CountryAggregate`] is a query
//! result and is never stored.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

// ─── Unified table ───────────────────────────────────────────────────────────

/// One row per region, sub-region and date in the long-form table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedRecord {
  pub country_region:  String,
  /// `None` for country-level rows.
  pub province_state:  Option<String>,
  pub lat:             Option<f64>,
  pub long:            Option<f64>,
  pub date:            NaiveDate,
  /// Cumulative counts as of `date`.
  pub confirmed:       u64,
  pub deaths:          u64,
  pub recovered:       u64,
  /// Day-over-day deltas of the cumulative counts, clamped at zero.
  pub confirmed_daily: u64,
  pub deaths_daily:    u64,
  pub recovered_daily: u64,
}

// ─── Calendar dimension ──────────────────────────────────────────────────────

const MONTH_NAMES: [&str; 12] = [
  "January",
  "February",
  "March",
  "April",
  "May",
  "June",
  "July",
  "August",
  "September",
  "October",
  "November",
  "December",
];

/// One row per day of the loaded date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
  pub date:         NaiveDate,
  pub year:         i32,
  pub month:        u32,
  pub day:          u32,
  /// Monday = 0 … Sunday = 6.
  pub day_of_week:  u32,
  /// ISO 8601 week number.
  pub week_of_year: u32,
  pub month_name:   String,
  pub quarter:      u32,
}

impl CalendarEntry {
  pub fn from_date(date: NaiveDate) -> Self {
    let month = date.month();
    Self {
      date,
      year: date.year(),
      month,
      day: date.day(),
      day_of_week: date.weekday().num_days_from_monday(),
      week_of_year: date.iso_week().week(),
      month_name: MONTH_NAMES[month as usize - 1].to_owned(),
      quarter: (month - 1) / 3 + 1,
    }
  }
}

// ─── Query shapes ────────────────────────────────────────────────────────────

/// Unified rows summed over province/state for one country and date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryAggregate {
  pub country_region:  String,
  pub date:            NaiveDate,
  pub confirmed:       u64,
  pub deaths:          u64,
  pub recovered:       u64,
  pub confirmed_daily: u64,
  pub deaths_daily:    u64,
  pub recovered_daily: u64,
}

/// Shape of the loaded unified table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetOverview {
  pub records:    u64,
  pub countries:  u64,
  pub first_date: NaiveDate,
  pub last_date:  NaiveDate,
}

/// Row counts written by a full-table replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
  pub records:       u64,
  pub calendar_days: u64,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn calendar_entry_derives_parts() {
    // 2020-01-22 was a Wednesday in ISO week 4.
    let entry = CalendarEntry::from_date(NaiveDate::from_ymd_opt(2020, 1, 22).unwrap());
    assert_eq!(entry.year, 2020);
    assert_eq!(entry.month, 1);
    assert_eq!(entry.day, 22);
    assert_eq!(entry.day_of_week, 2);
    assert_eq!(entry.week_of_year, 4);
    assert_eq!(entry.month_name, "January");
    assert_eq!(entry.quarter, 1);
  }

  #[test]
  fn calendar_entry_iso_week_crosses_year() {
    // 2021-01-01 belongs to ISO week 53 of 2020.
    let entry = CalendarEntry::from_date(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
    assert_eq!(entry.week_of_year, 53);
    assert_eq!(entry.day_of_week, 4);

    let december = CalendarEntry::from_date(NaiveDate::from_ymd_opt(2020, 12, 31).unwrap());
    assert_eq!(december.quarter, 4);
    assert_eq!(december.month_name, "December");
  }
}
