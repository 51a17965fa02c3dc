//! Encoding and decoding between domain types and SQLite column values.
//!
//! Dates are stored as `YYYY-MM-DD` text. Counts are stored as SQLite
//! integers (i64) and checked on the way back out. Each query shape has its
//! own `Raw*` row type holding the plain column values.

use chrono::NaiveDate;
use covid_core::record::{CalendarEntry, CountryAggregate, DatasetOverview, UnifiedRecord};

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(date: NaiveDate) -> String { date.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

/// Counts beyond `i64::MAX` cannot occur in practice; saturate rather than fail.
pub fn encode_count(n: u64) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

pub fn decode_count(column: &'static str, value: i64) -> Result<u64> {
  u64::try_from(value).map_err(|_| Error::OutOfRange { column, value })
}

// ─── Row shapes ──────────────────────────────────────────────────────────────

pub struct RawAggregate {
  pub country_region:  String,
  pub date:            String,
  pub confirmed:       i64,
  pub deaths:          i64,
  pub recovered:       i64,
  pub confirmed_daily: i64,
  pub deaths_daily:    i64,
  pub recovered_daily: i64,
}

impl RawAggregate {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      country_region:  row.get(0)?,
      date:            row.get(1)?,
      confirmed:       row.get(2)?,
      deaths:          row.get(3)?,
      recovered:       row.get(4)?,
      confirmed_daily: row.get(5)?,
      deaths_daily:    row.get(6)?,
      recovered_daily: row.get(7)?,
    })
  }

  pub fn into_aggregate(self) -> Result<CountryAggregate> {
    Ok(CountryAggregate {
      date:            decode_date(&self.date)?,
      country_region:  self.country_region,
      confirmed:       decode_count("confirmed", self.confirmed)?,
      deaths:          decode_count("deaths", self.deaths)?,
      recovered:       decode_count("recovered", self.recovered)?,
      confirmed_daily: decode_count("confirmed_daily", self.confirmed_daily)?,
      deaths_daily:    decode_count("deaths_daily", self.deaths_daily)?,
      recovered_daily: decode_count("recovered_daily", self.recovered_daily)?,
    })
  }
}

pub struct RawRecord {
  pub country_region:  String,
  pub province_state:  Option<String>,
  pub lat:             Option<f64>,
  pub long:            Option<f64>,
  pub date:            String,
  pub confirmed:       i64,
  pub deaths:          i64,
  pub recovered:       i64,
  pub confirmed_daily: i64,
  pub deaths_daily:    i64,
  pub recovered_daily: i64,
}

impl RawRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      country_region:  row.get(0)?,
      province_state:  row.get(1)?,
      lat:             row.get(2)?,
      long:            row.get(3)?,
      date:            row.get(4)?,
      confirmed:       row.get(5)?,
      deaths:          row.get(6)?,
      recovered:       row.get(7)?,
      confirmed_daily: row.get(8)?,
      deaths_daily:    row.get(9)?,
      recovered_daily: row.get(10)?,
    })
  }

  pub fn into_record(self) -> Result<UnifiedRecord> {
    Ok(UnifiedRecord {
      date:            decode_date(&self.date)?,
      country_region:  self.country_region,
      province_state:  self.province_state,
      lat:             self.lat,
      long:            self.long,
      confirmed:       decode_count("confirmed", self.confirmed)?,
      deaths:          decode_count("deaths", self.deaths)?,
      recovered:       decode_count("recovered", self.recovered)?,
      confirmed_daily: decode_count("confirmed_daily", self.confirmed_daily)?,
      deaths_daily:    decode_count("deaths_daily", self.deaths_daily)?,
      recovered_daily: decode_count("recovered_daily", self.recovered_daily)?,
    })
  }
}

pub struct RawCalendar {
  pub date:         String,
  pub year:         i32,
  pub month:        u32,
  pub day:          u32,
  pub day_of_week:  u32,
  pub week_of_year: u32,
  pub month_name:   String,
  pub quarter:      u32,
}

impl RawCalendar {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      date:         row.get(0)?,
      year:         row.get(1)?,
      month:        row.get(2)?,
      day:          row.get(3)?,
      day_of_week:  row.get(4)?,
      week_of_year: row.get(5)?,
      month_name:   row.get(6)?,
      quarter:      row.get(7)?,
    })
  }

  pub fn into_entry(self) -> Result<CalendarEntry> {
    Ok(CalendarEntry {
      date:         decode_date(&self.date)?,
      year:         self.year,
      month:        self.month,
      day:          self.day,
      day_of_week:  self.day_of_week,
      week_of_year: self.week_of_year,
      month_name:   self.month_name,
      quarter:      self.quarter,
    })
  }
}

pub struct RawOverview {
  pub records:    i64,
  pub countries:  i64,
  pub first_date: Option<String>,
  pub last_date:  Option<String>,
}

impl RawOverview {
  /// `None` when the table is empty.
  pub fn into_overview(self) -> Result<Option<DatasetOverview>> {
    let (Some(first), Some(last)) = (self.first_date, self.last_date) else {
      return Ok(None);
    };
    Ok(Some(DatasetOverview {
      records:    decode_count("records", self.records)?,
      countries:  decode_count("countries", self.countries)?,
      first_date: decode_date(&first)?,
      last_date:  decode_date(&last)?,
    }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dates_round_trip_as_iso_text() {
    let date = NaiveDate::from_ymd_opt(2020, 1, 5).unwrap();
    assert_eq!(encode_date(date), "2020-01-05");
    assert_eq!(decode_date("2020-01-05").unwrap(), date);
    assert!(matches!(decode_date("1/5/20"), Err(Error::DateParse(_))));
  }

  #[test]
  fn negative_counts_are_rejected() {
    assert_eq!(decode_count("confirmed", 7).unwrap(), 7);
    assert!(matches!(
      decode_count("deaths", -1),
      Err(Error::OutOfRange { column: "deaths", value: -1 })
    ));
    assert_eq!(encode_count(u64::MAX), i64::MAX);
  }
}
