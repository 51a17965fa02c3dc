//! Long-to-wide pivot of the unified table, the inverse of [`melt`](crate::melt).

use std::{
  collections::{BTreeSet, HashMap},
  fmt, io,
  str::FromStr,
};

use chrono::NaiveDate;
use covid_core::record::UnifiedRecord;

use crate::{
  Error, Result,
  melt::{IDENTITY_COLUMNS, Region},
};

/// A cumulative column of [`UnifiedRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CumulativeField {
  Confirmed,
  Deaths,
  Recovered,
}

impl CumulativeField {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Confirmed => "confirmed",
      Self::Deaths => "deaths",
      Self::Recovered => "recovered",
    }
  }

  pub fn value(self, record: &UnifiedRecord) -> u64 {
    match self {
      Self::Confirmed => record.confirmed,
      Self::Deaths => record.deaths,
      Self::Recovered => record.recovered,
    }
  }
}

impl fmt::Display for CumulativeField {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for CumulativeField {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "confirmed" => Ok(Self::Confirmed),
      "deaths" => Ok(Self::Deaths),
      "recovered" => Ok(Self::Recovered),
      other => Err(Error::UnknownField(other.to_owned())),
    }
  }
}

/// One region's values, aligned with [`WideTable::dates`].
#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
  pub region: Region,
  pub values: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
  pub field: CumulativeField,
  pub dates: Vec<NaiveDate>,
  pub rows:  Vec<WideRow>,
}

/// Rebuild the one-column-per-day table for `field`.
///
/// Regions appear in first-seen order; dates ascend. A region with no record
/// for some date gets 0 there.
pub fn pivot_wide(records: &[UnifiedRecord], field: CumulativeField) -> WideTable {
  let dates: Vec<NaiveDate> = records
    .iter()
    .map(|r| r.date)
    .collect::<BTreeSet<_>>()
    .into_iter()
    .collect();
  let date_index: HashMap<NaiveDate, usize> =
    dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();

  let mut rows: Vec<WideRow> = Vec::new();
  let mut row_index: HashMap<Region, usize> = HashMap::new();

  for record in records {
    let region = Region::from(record);
    let row = *row_index.entry(region.clone()).or_insert_with(|| {
      rows.push(WideRow { region, values: vec![0; dates.len()] });
      rows.len() - 1
    });
    rows[row].values[date_index[&record.date]] = field.value(record);
  }

  WideTable { field, dates, rows }
}

fn format_coordinate(value: Option<f64>) -> String {
  value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write `table` as CSV with the source headers and `M/D/YY` date columns.
pub fn write_wide_csv<W: io::Write>(table: &WideTable, writer: W) -> Result<()> {
  let mut wtr = csv::Writer::from_writer(writer);

  let mut header: Vec<String> = IDENTITY_COLUMNS.iter().map(|c| (*c).to_owned()).collect();
  header.extend(table.dates.iter().map(|d| d.format("%-m/%-d/%y").to_string()));
  wtr.write_record(&header)?;

  for row in &table.rows {
    let mut fields = vec![
      row.region.province_state.clone().unwrap_or_default(),
      row.region.country_region.clone(),
      format_coordinate(row.region.lat),
      format_coordinate(row.region.long),
    ];
    fields.extend(row.values.iter().map(u64::to_string));
    wtr.write_record(&fields)?;
  }

  wtr.flush().map_err(csv::Error::from)?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{melt::melt, unify::unify};

  const CONFIRMED: &str = "\
Province/State,Country/Region,Lat,Long,1/22/20,1/23/20,1/24/20,1/25/20
,Afghanistan,33.93911,67.709953,0,0,1,4
Australian Capital Territory,Australia,-35.4735,149.0124,3,3,2,9
Diamond Princess,Canada,,,0,10,10,10
";

  fn sorted(mut rows: Vec<crate::melt::MeltedRow>) -> Vec<crate::melt::MeltedRow> {
    rows.sort_by(|a, b| {
      a.region
        .country_region
        .cmp(&b.region.country_region)
        .then(a.date.cmp(&b.date))
    });
    rows
  }

  #[test]
  fn melt_then_pivot_reproduces_source() {
    let melted = melt("confirmed", CONFIRMED.as_bytes()).unwrap();
    let records = unify(&melted, &[], &[]);
    let table = pivot_wide(&records, CumulativeField::Confirmed);

    assert_eq!(table.dates.len(), 4);
    assert_eq!(table.rows.len(), 3);
    let australia = table
      .rows
      .iter()
      .find(|r| r.region.country_region == "Australia")
      .unwrap();
    assert_eq!(australia.values, [3, 3, 2, 9]);

    let mut out = Vec::new();
    write_wide_csv(&table, &mut out).unwrap();
    let remelted = melt("roundtrip", out.as_slice()).unwrap();
    assert_eq!(sorted(remelted), sorted(melted));
  }

  #[test]
  fn pivot_fills_missing_days_with_zero() {
    let melted = melt("confirmed", CONFIRMED.as_bytes()).unwrap();
    let gap = NaiveDate::from_ymd_opt(2020, 1, 24).unwrap();
    let mut records = unify(&melted, &[], &[]);
    records.retain(|r| !(r.country_region == "Afghanistan" && r.date == gap));

    let table = pivot_wide(&records, CumulativeField::Confirmed);
    let afghanistan = &table.rows[0];
    assert_eq!(afghanistan.region.country_region, "Afghanistan");
    assert_eq!(afghanistan.values, [0, 0, 0, 4]);
    assert_eq!(table.dates.len(), 4);

    let deaths = pivot_wide(&records, CumulativeField::Deaths);
    assert!(deaths.rows.iter().all(|r| r.values.iter().all(|v| *v == 0)));
  }

  #[test]
  fn header_uses_unpadded_dates() {
    let melted = melt("confirmed", CONFIRMED.as_bytes()).unwrap();
    let table = pivot_wide(&unify(&melted, &[], &[]), CumulativeField::Confirmed);
    let mut out = Vec::new();
    write_wide_csv(&table, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("Province/State,Country/Region,Lat,Long,1/22/20,1/23/20"));
  }

  #[test]
  fn field_parses_from_name() {
    assert_eq!("recovered".parse::<CumulativeField>().unwrap(), CumulativeField::Recovered);
    assert!(matches!("active".parse::<CumulativeField>(), Err(Error::UnknownField(_))));
  }
}
