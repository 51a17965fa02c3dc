//! Wide-to-long reshaping of one time-series CSV.
//!
//! The input has four identity columns followed by one column per day. Each
//! `(identity, day)` cell becomes a [`MeltedRow`].

use std::{
  hash::{Hash, Hasher},
  io,
};

use chrono::NaiveDate;
use covid_core::record::UnifiedRecord;

use crate::{Error, Result};

pub const PROVINCE_STATE: &str = "Province/State";
pub const COUNTRY_REGION: &str = "Country/Region";
pub const LAT: &str = "Lat";
pub const LONG: &str = "Long";

/// Columns every input must carry, in their conventional order.
pub const IDENTITY_COLUMNS: [&str; 4] = [PROVINCE_STATE, COUNTRY_REGION, LAT, LONG];

/// Format of the per-day column headers, e.g. `1/22/20`.
pub const DATE_FORMAT: &str = "%m/%d/%y";

// ─── Region identity ─────────────────────────────────────────────────────────

/// The identity columns of a source row. Two regions are equal when all four
/// columns match exactly.
#[derive(Debug, Clone)]
pub struct Region {
  pub province_state: Option<String>,
  pub country_region: String,
  pub lat:            Option<f64>,
  pub long:           Option<f64>,
}

impl Region {
  fn identity(&self) -> (Option<&str>, &str, Option<u64>, Option<u64>) {
    (
      self.province_state.as_deref(),
      &self.country_region,
      self.lat.map(f64::to_bits),
      self.long.map(f64::to_bits),
    )
  }
}

impl PartialEq for Region {
  fn eq(&self, other: &Self) -> bool { self.identity() == other.identity() }
}

impl Eq for Region {}

impl Hash for Region {
  fn hash<H: Hasher>(&self, state: &mut H) { self.identity().hash(state) }
}

impl From<&UnifiedRecord> for Region {
  fn from(r: &UnifiedRecord) -> Self {
    Self {
      province_state: r.province_state.clone(),
      country_region: r.country_region.clone(),
      lat:            r.lat,
      long:           r.long,
    }
  }
}

/// One cell of the wide table: a region's value on one day.
#[derive(Debug, Clone, PartialEq)]
pub struct MeltedRow {
  pub region: Region,
  pub date:   NaiveDate,
  pub value:  u64,
}

// ─── Header layout ───────────────────────────────────────────────────────────

struct Layout {
  province: usize,
  country:  usize,
  lat:      usize,
  long:     usize,
  dates:    Vec<(usize, NaiveDate)>,
}

impl Layout {
  fn from_headers(input: &str, headers: &csv::StringRecord) -> Result<Self> {
    let position = |name: &str| headers.iter().position(|h| h == name);
    let found = IDENTITY_COLUMNS.map(position);

    let [Some(province), Some(country), Some(lat), Some(long)] = found else {
      let missing: Vec<&str> = IDENTITY_COLUMNS
        .iter()
        .zip(found)
        .filter(|(_, idx)| idx.is_none())
        .map(|(name, _)| *name)
        .collect();
      return Err(Error::Schema {
        input:   input.to_owned(),
        message: format!("missing identity columns: {}", missing.join(", ")),
      });
    };

    let mut dates = Vec::new();
    for (idx, header) in headers.iter().enumerate() {
      if IDENTITY_COLUMNS.iter().any(|c| *c == header) {
        continue;
      }
      let date = NaiveDate::parse_from_str(header, DATE_FORMAT).map_err(|_| Error::Schema {
        input:   input.to_owned(),
        message: format!("column {header:?} is neither an identity column nor a M/D/YY date"),
      })?;
      dates.push((idx, date));
    }

    Ok(Self { province, country, lat, long, dates })
  }

  fn region(&self, input: &str, line: u64, record: &csv::StringRecord) -> Result<Region> {
    let cell = |idx: usize| record.get(idx).unwrap_or("");

    let country = cell(self.country);
    if country.is_empty() {
      return Err(invalid(input, line, COUNTRY_REGION, country));
    }
    let province = cell(self.province);

    Ok(Region {
      province_state: (!province.is_empty()).then(|| province.to_owned()),
      country_region: country.to_owned(),
      lat:            parse_coordinate(input, line, LAT, cell(self.lat))?,
      long:           parse_coordinate(input, line, LONG, cell(self.long))?,
    })
  }
}

// ─── Cell parsing ────────────────────────────────────────────────────────────

fn invalid(input: &str, line: u64, column: &str, value: &str) -> Error {
  Error::InvalidValue {
    input: input.to_owned(),
    line,
    column: column.to_owned(),
    value: value.to_owned(),
  }
}

fn parse_coordinate(input: &str, line: u64, column: &str, cell: &str) -> Result<Option<f64>> {
  if cell.is_empty() {
    return Ok(None);
  }
  cell
    .parse::<f64>()
    .map(Some)
    .map_err(|_| invalid(input, line, column, cell))
}

/// Parse a metric cell. Empty means "not reported" and reads as zero;
/// negative values are clamped to zero; fractional values are truncated.
fn parse_count(input: &str, line: u64, column: &str, cell: &str) -> Result<u64> {
  if cell.is_empty() {
    return Ok(0);
  }
  if let Ok(n) = cell.parse::<i64>() {
    return Ok(u64::try_from(n).unwrap_or_else(|_| {
      tracing::debug!(input, line, column, value = n, "negative count clamped to 0");
      0
    }));
  }
  match cell.parse::<f64>() {
    Ok(v) if v.is_finite() => Ok(if v <= 0.0 { 0 } else { v.trunc() as u64 }),
    _ => Err(invalid(input, line, column, cell)),
  }
}

// ─── Melt ────────────────────────────────────────────────────────────────────

/// Reshape the wide CSV read from `reader` into long rows.
///
/// `input` names the source in errors and logs. Rows come out in source
/// order, each row's days in column order.
pub fn melt<R: io::Read>(input: &str, reader: R) -> Result<Vec<MeltedRow>> {
  let mut rdr = csv::ReaderBuilder::new()
    .trim(csv::Trim::All)
    .from_reader(reader);

  let headers = rdr.headers()?.clone();
  let layout = Layout::from_headers(input, &headers)?;

  let mut rows = Vec::new();
  for result in rdr.records() {
    let record = result?;
    let line = record.position().map_or(0, |p| p.line());
    let region = layout.region(input, line, &record)?;

    for &(idx, date) in &layout.dates {
      let value = parse_count(input, line, &headers[idx], record.get(idx).unwrap_or(""))?;
      rows.push(MeltedRow { region: region.clone(), date, value });
    }
  }

  tracing::info!(input, days = layout.dates.len(), rows = rows.len(), "melted time series");
  Ok(rows)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(m: u32, day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2020, m, day).unwrap() }

  const SAMPLE: &str = "\
Province/State,Country/Region,Lat,Long,1/22/20,1/23/20,1/24/20
,Afghanistan,33.93911,67.709953,0,1,3
Ontario,Canada,51.2538,-85.3232,2,,5
";

  #[test]
  fn melts_every_date_column() {
    let rows = melt("confirmed", SAMPLE.as_bytes()).unwrap();
    assert_eq!(rows.len(), 6);

    assert_eq!(rows[0].region.country_region, "Afghanistan");
    assert_eq!(rows[0].region.province_state, None);
    assert_eq!(rows[0].region.lat, Some(33.93911));
    assert_eq!(rows[0].date, d(1, 22));
    assert_eq!(rows[2].date, d(1, 24));
    assert_eq!(rows[2].value, 3);

    assert_eq!(rows[3].region.province_state.as_deref(), Some("Ontario"));
    // Empty cells read as zero.
    assert_eq!(rows[4].value, 0);
    assert_eq!(rows[5].value, 5);
  }

  #[test]
  fn missing_identity_column_is_schema_error() {
    let csv = "Province/State,Country/Region,Long,1/22/20\n,X,1.0,4\n";
    let err = melt("deaths", csv.as_bytes()).unwrap_err();
    match err {
      Error::Schema { input, message } => {
        assert_eq!(input, "deaths");
        assert!(message.contains("Lat"), "{message}");
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn unparseable_date_header_is_schema_error() {
    let csv = "Province/State,Country/Region,Lat,Long,Notes\n,X,1,1,hello\n";
    assert!(matches!(melt("x", csv.as_bytes()), Err(Error::Schema { .. })));
  }

  #[test]
  fn negative_and_fractional_counts_are_normalised() {
    let csv = "Province/State,Country/Region,Lat,Long,3/1/20,3/2/20\n,X,,,-4,7.9\n";
    let rows = melt("x", csv.as_bytes()).unwrap();
    assert_eq!(rows[0].value, 0);
    assert_eq!(rows[1].value, 7);
    assert_eq!(rows[0].region.lat, None);
  }

  #[test]
  fn garbage_count_reports_position() {
    let csv = "Province/State,Country/Region,Lat,Long,3/1/20\n,X,1,1,lots\n";
    match melt("recovered", csv.as_bytes()).unwrap_err() {
      Error::InvalidValue { input, line, column, value } => {
        assert_eq!(input, "recovered");
        assert_eq!(line, 2);
        assert_eq!(column, "3/1/20");
        assert_eq!(value, "lots");
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn regions_compare_on_all_identity_columns() {
    let a = Region {
      province_state: None,
      country_region: "X".into(),
      lat:            Some(1.0),
      long:           Some(2.0),
    };
    let mut b = a.clone();
    assert_eq!(a, b);
    b.lat = Some(1.5);
    assert_ne!(a, b);
  }
}
